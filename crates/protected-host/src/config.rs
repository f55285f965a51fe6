use std::{fs, io::Read, path::PathBuf};

use protected_surface::SurfaceConfig;
use serde::{Deserialize, Serialize};

use crate::{
    directories::config_dir,
    failure::{Failure, report_and_panic},
};

const FILE_NAME: &str = "protected-host.toml";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Also exclude the host window itself from capture.
    pub hide_host_from_capture: bool,

    /// Keep the host out of the taskbar and Alt+Tab.
    pub skip_taskbar: bool,

    /// Register Ctrl+Alt+Q to exit.
    pub exit_hotkey: bool,

    pub surface: SurfaceConfig,
}

impl Config {
    pub fn try_load_config() -> Result<Option<Self>, toml::de::Error> {
        let mut file = match fs::File::open(Self::file_path()) {
            Ok(file) => file,
            Err(error) => {
                if error.kind() == std::io::ErrorKind::NotFound {
                    return Ok(None);
                }

                report_and_panic(
                    error,
                    "Could not check if an existing configuration file exists",
                );
            }
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .report_and_panic("Could not read the existing configuration file");

        let config: Self = toml::from_str(&contents)?;

        Ok(Some(config))
    }

    pub fn save(&self) {
        let toml_string =
            toml::to_string_pretty(self).report_and_panic("Could not save the configuration file");

        fs::write(Self::file_path(), toml_string.as_bytes())
            .report_and_panic("Could not save the configuration file");
    }

    pub fn file_path() -> PathBuf {
        config_dir().join(FILE_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hide_host_from_capture: true,
            skip_taskbar: true,
            exit_hotkey: true,
            surface: SurfaceConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = toml::from_str(
            r#"
            skip_taskbar = false

            [surface]
            width = 1280
            height = 720
            "#,
        )
        .unwrap();

        assert!(config.hide_host_from_capture);
        assert!(!config.skip_taskbar);
        assert!(config.exit_hotkey);
        assert_eq!(config.surface.width, 1280);
        assert_eq!(config.surface.buffer_count, 2);
    }

    #[test]
    fn default_config_is_saved_as_valid_toml() {
        let config = Config::default();

        let toml_string = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed, config);
    }
}
