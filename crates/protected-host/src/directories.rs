use std::{fs::create_dir_all, path::PathBuf};

use crate::failure::{Failure, Ignore};

/// Path to the config directory, also holds the log file.
pub fn config_dir() -> PathBuf {
    let dir = dirs::config_dir()
        .report_and_panic("The config directory could not be retreived")
        .join("Protected Surface Host");

    create_dir_all(&dir)
        .report("Could not create the config directory")
        .ignore();

    dir
}
