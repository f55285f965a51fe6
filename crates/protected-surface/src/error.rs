use core::time::Duration;

use thiserror::Error;

use crate::timing::display_duration;

/// Boxed error from a [`GraphicsBackend`](crate::GraphicsBackend) or
/// [`WindowSystem`](crate::WindowSystem) implementation.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors from creating or tearing down a protected surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The graphics device connection could not be established.
    #[error("Failed to create the graphics device:\n{0}")]
    DeviceCreationFailed(#[source] BoxError),

    /// The protected presentation channel was rejected.
    #[error("Failed to negotiate a protected presentation channel:\n{0}")]
    ChannelNegotiationFailed(#[source] BoxError),

    /// The host platform could not create the child surface.
    #[error("Failed to create the protected surface:\n{0}")]
    SurfaceCreationFailed(#[source] BoxError),

    /// The presentation loop did not stop within the bounded wait, its resources were retained.
    #[error("Presentation loop did not stop within {}, its resources were leaked", display_duration(*.0))]
    TeardownTimeout(Duration),

    /// The presentation thread could not be spawned.
    #[error("Failed to start the presentation loop:\n{0}")]
    LoopStartFailed(#[source] std::io::Error),

    /// A protected context is already associated with the surface.
    #[error("The surface already has a protected context")]
    AlreadyAttached,
}

impl Error {
    /// The creation step that failed, used for the user facing notification.
    pub fn failed_step(&self) -> &'static str {
        match self {
            Self::DeviceCreationFailed(_) => "creating the graphics device",
            Self::ChannelNegotiationFailed(_) => "creating the protected swap chain",
            Self::SurfaceCreationFailed(_) => "creating the protected window",
            Self::TeardownTimeout(_) => "stopping the presentation loop",
            Self::LoopStartFailed(_) => "starting the presentation loop",
            Self::AlreadyAttached => "attaching the protected context",
        }
    }
}
