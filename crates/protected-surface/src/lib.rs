//! # Protected Surface
//! Hosts a child surface whose content is presented through a hardware-protected
//! swap chain and excluded from screen capture.
//!
//! The lifecycle is driven by [`ProtectedSurfaceManager`]:
//! 1. [`SurfaceFactory`] creates the capture-excluded child surface.
//! 1. [`CapabilityNegotiator`] acquires the device and the protected channel.
//! 1. [`LifecycleCoordinator`] stores the context and runs the [`PresentationLoop`].
//! 1. The host's destruction notification drives the ordered teardown.
//!

#![allow(clippy::std_instead_of_alloc)]

pub use backend::{
    ChannelDescriptor, GraphicsBackend, PixelFormat, PresentError, PresentStatus, SurfaceSize,
    WindowSystem,
};
pub use capability_negotiator::{CapabilityNegotiator, ChannelResources};
pub use config::{ConfigError, SurfaceConfig};
pub use error::{BoxError, Error};
pub use lifecycle_coordinator::{LifecycleCoordinator, TeardownOutcome};
pub use presentation_loop::{
    LoopState, Pacing, PresentationLoop, PresentationResources, RunningFlag, StopError,
    StopHandle,
};
pub use protected_surface::ProtectedSurfaceManager;
pub use surface_factory::SurfaceFactory;

mod backend;
mod capability_negotiator;
mod config;
mod error;
mod lifecycle_coordinator;
mod presentation_loop;
mod protected_surface;
mod surface_factory;
mod timing;

#[cfg(windows)]
pub mod win32;
