use core::{fmt::Debug, hash::Hash};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BoxError;

/// Size of a surface's client area in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    #[allow(missing_docs)]
    pub width: u32,
    #[allow(missing_docs)]
    pub height: u32,
}

impl SurfaceSize {
    /// Creates a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Back buffer pixel formats that flip model swap chains accept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PixelFormat {
    /// 8 bits per channel, BGRA order.
    #[default]
    Bgra8Unorm,
    /// 8 bits per channel, RGBA order.
    Rgba8Unorm,
    /// 10 bits per colour channel, 2 bit alpha.
    #[serde(rename = "rgb10a2-unorm")]
    Rgb10A2Unorm,
    /// 16 bit float per channel.
    Rgba16Float,
}

/// Parameters for negotiating a protected presentation channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Back buffer format.
    pub format: PixelFormat,

    /// Number of back buffers, always 2.
    pub buffer_count: u32,

    /// Size the channel is created at, it does not follow later resizes.
    pub size: SurfaceSize,
}

/// Outcome of a successful present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentStatus {
    /// The frame was queued, the call blocked for the requested vertical blanks.
    Presented,

    /// The surface is not visible, the call returned without waiting.
    Occluded,
}

/// Failures from presenting the protected channel.
#[derive(Debug, Error)]
pub enum PresentError {
    /// The device was removed or reset, the channel can no longer present.
    #[error("The graphics device was lost:\n{0}")]
    DeviceLost(#[source] BoxError),

    /// Any other present failure.
    #[error("Present failed:\n{0}")]
    Failed(#[source] BoxError),
}

/// The window manager operations the surface factory depends on.
pub trait WindowSystem: Send + Sync + 'static {
    /// Opaque identity of a platform surface, not owned by this crate.
    type Surface: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Error type of the platform calls.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Registers the protected surface class, the caller guarantees this runs once.
    fn register_surface_class(&self) -> Result<(), Self::Error>;

    /// Creates a hidden child surface inside `parent`.
    fn create_child_surface(
        &self,
        parent: Self::Surface,
        size: SurfaceSize,
    ) -> Result<Self::Surface, Self::Error>;

    /// Excludes the surface from screen capture and display mirroring.
    fn exclude_from_capture(&self, surface: Self::Surface) -> Result<(), Self::Error>;

    /// Size of the surface's client area.
    fn client_size(&self, surface: Self::Surface) -> Result<SurfaceSize, Self::Error>;

    /// Makes the surface visible.
    fn show_surface(&self, surface: Self::Surface);

    /// Destroys a surface created by [`WindowSystem::create_child_surface`].
    fn destroy_surface(&self, surface: Self::Surface);

    /// Shows a blocking notification owned by `owner`.
    fn notify_failure(&self, owner: Self::Surface, message: &str);
}

/// The graphics driver operations used to negotiate and drive a protected channel.
///
/// Every acquired resource is an owned value, dropping it releases it.
pub trait GraphicsBackend: Send + Sync + 'static {
    /// Surface identity the channel is bound to.
    type Surface: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Connection to the graphics device.
    type Device: Send + 'static;

    /// Context used to record and issue drawing commands.
    type CommandContext: Send + 'static;

    /// The protected presentation channel.
    type Channel: Send + 'static;

    /// Writable view of the channel's back buffer.
    type Target: Send + 'static;

    /// Error type of the driver calls.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Connects to the graphics device.
    fn create_device(&self) -> Result<(Self::Device, Self::CommandContext), Self::Error>;

    /// Requests a hardware-protected channel bound to `surface`.
    fn create_protected_channel(
        &self,
        device: &Self::Device,
        surface: Self::Surface,
        descriptor: &ChannelDescriptor,
    ) -> Result<Self::Channel, Self::Error>;

    /// Creates the presentation target for the channel's back buffer.
    fn create_target(
        &self,
        device: &Self::Device,
        channel: &Self::Channel,
    ) -> Result<Self::Target, Self::Error>;

    /// Binds the target and clears it to `colour`.
    fn clear(&self, context: &Self::CommandContext, target: &Self::Target, colour: [f32; 4]);

    /// Presents the channel, blocking for `sync_interval` vertical blanks unless occluded.
    fn present(
        &self,
        channel: &Self::Channel,
        sync_interval: u32,
    ) -> Result<PresentStatus, PresentError>;
}
