use core::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ChannelDescriptor, Pacing, PixelFormat, SurfaceSize};

/// Settings for creating and driving a protected surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Initial width of the child surface.
    pub width: u32,

    /// Initial height of the child surface.
    pub height: u32,

    /// Back buffer format of the protected channel.
    pub format: PixelFormat,

    /// Number of back buffers, must be 2.
    pub buffer_count: u32,

    /// Vertical blanks to wait for on each present.
    pub sync_interval: u32,

    /// Optional sleep after each present.
    pub frame_interval_ms: Option<u64>,

    /// Colour the placeholder frame is cleared to.
    pub clear_colour: [f32; 4],

    /// How long teardown waits for the presentation loop to stop.
    pub teardown_timeout_ms: u64,
}

impl SurfaceConfig {
    /// Swap chains are double buffered.
    pub const BUFFER_COUNT: u32 = 2;

    /// Checks the values that the protected channel cannot accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_count != Self::BUFFER_COUNT {
            return Err(ConfigError::BufferCount(self.buffer_count));
        }

        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptySize(self.width, self.height));
        }

        if self.sync_interval > 4 {
            return Err(ConfigError::SyncInterval(self.sync_interval));
        }

        if self.teardown_timeout_ms == 0 {
            return Err(ConfigError::TeardownTimeout);
        }

        Ok(())
    }

    /// Initial size of the child surface.
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    /// Channel descriptor for a surface whose client area is `size`.
    pub fn channel_descriptor(&self, size: SurfaceSize) -> ChannelDescriptor {
        ChannelDescriptor {
            format: self.format,
            buffer_count: self.buffer_count,
            size,
        }
    }

    /// Presentation cadence of the loop.
    pub fn pacing(&self) -> Pacing {
        Pacing {
            sync_interval: self.sync_interval,
            frame_interval: self.frame_interval_ms.map(Duration::from_millis),
        }
    }

    /// Bounded wait used during teardown.
    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown_timeout_ms)
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            format: PixelFormat::Bgra8Unorm,
            buffer_count: Self::BUFFER_COUNT,
            sync_interval: 1,
            frame_interval_ms: None,
            clear_colour: [0.0, 0.0, 0.0, 0.0],
            teardown_timeout_ms: 2000,
        }
    }
}

/// Invalid surface configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The protected channel is always double buffered.
    #[error("Buffer count must be 2, got {0}")]
    BufferCount(u32),

    /// The surface must have an area.
    #[error("Surface size must be non-zero, got {0}x{1}")]
    EmptySize(u32, u32),

    /// DXGI accepts sync intervals from 0 to 4.
    #[error("Sync interval must be between 0 and 4, got {0}")]
    SyncInterval(u32),

    /// Teardown needs a non-zero wait.
    #[error("Teardown timeout must be non-zero")]
    TeardownTimeout,
}
