use core::fmt::Display;

use thiserror::Error;
use windows::Win32::Foundation::WIN32_ERROR;

/// A shortcut for `Result<T, WinError>`.
pub type LabelledWinResult<T> = Result<T, WinError>;

/// A failed Windows call, labelled with the call that failed.
#[derive(Debug, Error)]
pub struct WinError {
    call: &'static str,
    #[source]
    source: WinErrorSource,
}

/// Possible sources for a [`WinError`].
#[derive(Debug, Error)]
pub enum WinErrorSource {
    /// A [`windows_result::Error`].
    #[error(transparent)]
    WindowsError(#[from] windows_result::Error),

    /// A [`WIN32_ERROR`] from `GetLastError`.
    #[error("Win32: {0:?}")]
    Win32(WIN32_ERROR),

    /// A call that succeeded but produced no object.
    #[error("Call returned no object")]
    Missing,
}

impl WinError {
    /// Create a WinError from a `windows_result::Error` and a label.
    pub fn new(source: windows_result::Error, call: &'static str) -> Self {
        Self {
            call,
            source: source.into(),
        }
    }

    /// Create a WinError from a `WIN32_ERROR` and a label.
    pub fn from_win32(source: WIN32_ERROR, call: &'static str) -> Self {
        Self {
            call,
            source: WinErrorSource::Win32(source),
        }
    }

    /// Create a WinError for a call that returned no object.
    pub fn missing(call: &'static str) -> Self {
        Self {
            call,
            source: WinErrorSource::Missing,
        }
    }
}

impl Display for WinError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Windows {} call failed:\n{}", self.call, self.source)
    }
}
