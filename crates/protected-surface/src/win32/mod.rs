//! Win32, D3D11 and DXGI implementation of the protected surface.
//!
//! A single manager is shared by the whole process so the window procedure can reach it
//! when a protected window is destroyed.
//!

use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, error};
use windows::Win32::Foundation::HWND;

use crate::{ConfigError, ProtectedSurfaceManager, SurfaceConfig, TeardownOutcome};

pub use direct3d::Direct3D;
pub use result::{LabelledWinResult, WinError, WinErrorSource};
pub use send::{SendInterface, Win32Surface};
pub use window::Win32Windows;

mod direct3d;
mod ffi;
mod result;
mod send;
mod window;

/// The manager type used on Windows.
pub type Win32Manager = ProtectedSurfaceManager<Win32Windows, Direct3D>;

static MANAGER: OnceLock<Win32Manager> = OnceLock::new();

/// Errors from installing the process-wide manager.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The configuration was rejected.
    #[error("Invalid surface configuration:\n{0}")]
    Config(#[from] ConfigError),

    /// A manager was already installed or created on first use.
    #[error("The protected surface manager is already installed")]
    AlreadyInstalled,
}

/// Installs the process-wide manager with `config`. Must run before the first surface is
/// created, otherwise the default configuration is already in use.
pub fn install(config: SurfaceConfig) -> Result<(), InstallError> {
    let manager = Win32Manager::new(Win32Windows, Direct3D, config)?;

    MANAGER
        .set(manager)
        .map_err(|_| InstallError::AlreadyInstalled)
}

/// The process-wide manager, created with the default configuration on first use.
pub fn manager() -> &'static Win32Manager {
    MANAGER.get_or_init(|| Win32Manager::with_default_config(Win32Windows, Direct3D))
}

/// Creates a capture-excluded child of `parent` presenting through a protected swap chain.
///
/// Returns `None` if any step failed, the user has been notified and nothing is left behind.
pub fn create_protected_window(parent: HWND) -> Option<HWND> {
    manager()
        .create_protected_surface(Win32Surface::from(parent))
        .ok()
        .map(Win32Surface::hwnd)
}

/// Called from the window procedure while the window is being destroyed.
fn surface_destroyed(surface: Win32Surface) {
    let Some(manager) = MANAGER.get() else {
        return;
    };

    match manager.surface_destroyed(surface) {
        Ok(TeardownOutcome::NotTracked) => debug!("{surface:?} had no protected context"),
        Ok(_) => {}
        Err(e) => error!("Teardown of {surface:?} failed: {e}"),
    }
}
