use std::sync::{Arc, OnceLock};

use tracing::{debug, error};

use crate::{Error, SurfaceSize, WindowSystem, timing::StageTimer};

/// Creates capture-excluded child surfaces.
pub struct SurfaceFactory<W: WindowSystem> {
    window_system: Arc<W>,

    // Holds the registration outcome, registration is attempted once.
    registration: OnceLock<Result<(), Arc<W::Error>>>,
}

impl<W: WindowSystem> SurfaceFactory<W> {
    /// Creates a factory over `window_system`.
    pub fn new(window_system: Arc<W>) -> Self {
        Self {
            window_system,
            registration: OnceLock::new(),
        }
    }

    /// Creates a child of `parent`, excludes it from capture, then shows it.
    ///
    /// The exclusion is applied while the surface is still hidden so no frame of it is ever
    /// visible to capture. Any failure destroys the partially created surface.
    pub fn create(&self, parent: W::Surface, size: SurfaceSize) -> Result<W::Surface, Error> {
        let _timer = StageTimer::start("Creating protected surface");

        self.ensure_registered()?;

        let surface = self
            .window_system
            .create_child_surface(parent, size)
            .map_err(|e| Error::SurfaceCreationFailed(Box::new(e)))?;

        if let Err(e) = self.window_system.exclude_from_capture(surface) {
            error!("Could not exclude {surface:?} from capture: {e}");
            self.window_system.destroy_surface(surface);
            return Err(Error::SurfaceCreationFailed(Box::new(e)));
        }

        self.window_system.show_surface(surface);
        debug!("Created capture-excluded surface {surface:?} in {parent:?}");

        Ok(surface)
    }

    fn ensure_registered(&self) -> Result<(), Error> {
        let registration = self.registration.get_or_init(|| {
            self.window_system
                .register_surface_class()
                .map_err(Arc::new)
        });

        registration
            .as_ref()
            .map_err(|e| Error::SurfaceCreationFailed(Box::new(Arc::clone(e))))
            .copied()
    }
}
