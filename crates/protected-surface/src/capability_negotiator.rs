use std::sync::Arc;

use tracing::{debug, warn};

use crate::{ChannelDescriptor, Error, GraphicsBackend, PresentationResources, timing::StageTimer};

/// Everything acquired by a successful negotiation.
pub struct ChannelResources<B: GraphicsBackend> {
    /// Device connection, stays with the coordinator while the loop runs.
    pub device: B::Device,

    /// Resources handed to the presentation loop.
    pub presentation: PresentationResources<B>,
}

/// Acquires the device chain and requests a hardware-protected presentation channel.
///
/// Negotiation is one-shot, a rejected request is never retried.
pub struct CapabilityNegotiator<B: GraphicsBackend> {
    backend: Arc<B>,
}

impl<B: GraphicsBackend> CapabilityNegotiator<B> {
    /// Creates a negotiator over `backend`.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Creates the device, the protected channel bound to `surface` and its presentation target.
    ///
    /// On failure every resource acquired so far is released in reverse acquisition order
    /// before returning.
    pub fn negotiate(
        &self,
        surface: B::Surface,
        descriptor: &ChannelDescriptor,
    ) -> Result<ChannelResources<B>, Error> {
        let _timer = StageTimer::start("Negotiating protected channel");

        let (device, context) = self
            .backend
            .create_device()
            .map_err(|e| Error::DeviceCreationFailed(Box::new(e)))?;

        let channel = match self
            .backend
            .create_protected_channel(&device, surface, descriptor)
        {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Protected channel request for {surface:?} was rejected: {e}");
                drop(context);
                drop(device);
                return Err(Error::ChannelNegotiationFailed(Box::new(e)));
            }
        };

        let target = match self.backend.create_target(&device, &channel) {
            Ok(target) => target,
            Err(e) => {
                warn!("Could not create the presentation target for {surface:?}: {e}");
                drop(channel);
                drop(context);
                drop(device);
                return Err(Error::ChannelNegotiationFailed(Box::new(e)));
            }
        };

        debug!(
            "Negotiated protected channel for {surface:?}: {:?} {}x{}",
            descriptor.format, descriptor.size.width, descriptor.size.height
        );

        Ok(ChannelResources {
            device,
            presentation: PresentationResources {
                target,
                channel,
                context,
            },
        })
    }
}
