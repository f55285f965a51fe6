use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::{
    CapabilityNegotiator, ConfigError, Error, GraphicsBackend, LifecycleCoordinator,
    SurfaceConfig, SurfaceFactory, TeardownOutcome, WindowSystem,
};

/// Entry point for the host, creates protected surfaces and tears them down on destruction.
pub struct ProtectedSurfaceManager<W, B>
where
    W: WindowSystem,
    B: GraphicsBackend<Surface = W::Surface>,
{
    window_system: Arc<W>,
    config: SurfaceConfig,

    factory: SurfaceFactory<W>,
    negotiator: CapabilityNegotiator<B>,
    coordinator: LifecycleCoordinator<B>,
}

impl<W, B> ProtectedSurfaceManager<W, B>
where
    W: WindowSystem,
    B: GraphicsBackend<Surface = W::Surface>,
{
    /// Creates a manager, rejecting configurations the protected channel cannot satisfy.
    pub fn new(window_system: W, backend: B, config: SurfaceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(window_system, backend, config))
    }

    /// Creates a manager with [`SurfaceConfig::default`].
    pub fn with_default_config(window_system: W, backend: B) -> Self {
        Self::build(window_system, backend, SurfaceConfig::default())
    }

    fn build(window_system: W, backend: B, config: SurfaceConfig) -> Self {
        let window_system = Arc::new(window_system);
        let backend = Arc::new(backend);

        let factory = SurfaceFactory::new(Arc::clone(&window_system));
        let negotiator = CapabilityNegotiator::new(Arc::clone(&backend));
        let coordinator = LifecycleCoordinator::new(
            backend,
            config.pacing(),
            config.clear_colour,
            config.teardown_timeout(),
        );

        Self {
            window_system,
            config,
            factory,
            negotiator,
            coordinator,
        }
    }

    /// Creates a capture-excluded child of `parent` with a running protected channel.
    ///
    /// Either the returned surface has a live context and a running presentation loop, or
    /// nothing was left behind: the failure is shown to the user, every acquired resource
    /// is released and the child surface is destroyed.
    #[instrument("ProtectedSurfaceManager::create_protected_surface", skip(self), err)]
    pub fn create_protected_surface(&self, parent: W::Surface) -> Result<W::Surface, Error> {
        let surface = match self.factory.create(parent, self.config.size()) {
            Ok(surface) => surface,
            Err(e) => {
                self.report_failure(parent, &e);
                return Err(e);
            }
        };

        let result = self
            .window_system
            .client_size(surface)
            .map_err(|e| Error::SurfaceCreationFailed(Box::new(e)))
            .and_then(|size| {
                let descriptor = self.config.channel_descriptor(size);
                self.negotiator.negotiate(surface, &descriptor)
            })
            .and_then(|resources| self.coordinator.attach(surface, resources));

        if let Err(e) = result {
            self.report_failure(parent, &e);
            self.window_system.destroy_surface(surface);
            return Err(e);
        }

        info!("Created protected surface {surface:?}");
        Ok(surface)
    }

    /// Handles the destruction notification for `surface`, tearing its context down.
    pub fn surface_destroyed(&self, surface: W::Surface) -> Result<TeardownOutcome, Error> {
        self.coordinator.on_surface_destroyed(surface)
    }

    /// The lifecycle coordinator that owns the live contexts.
    pub fn coordinator(&self) -> &LifecycleCoordinator<B> {
        &self.coordinator
    }

    /// The active configuration.
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    fn report_failure(&self, owner: W::Surface, error: &Error) {
        error!("Could not create a protected surface: {error}");

        let message = format!(
            "Failed while {}.\nProtected content can not be shown.",
            error.failed_step()
        );
        self.window_system.notify_failure(owner, &message);
    }
}
