use core::time::Duration;
use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{error, info, instrument};

use crate::{
    ChannelResources, Error, GraphicsBackend, LoopState, Pacing, PresentationLoop,
    PresentationResources, presentation_loop::StopError, timing::StageTimer,
};

/// Result of handling a destruction notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// The loop stopped and every resource was released in order.
    Released,

    /// No context was associated with the surface.
    NotTracked,

    /// The loop thread panicked, its resources were dropped while unwinding.
    LoopPanicked,
}

/// One protected surface's live state.
struct ProtectedSurfaceContext<B: GraphicsBackend> {
    device: B::Device,
    presentation: PresentationLoop<B>,
}

/// Binds each protected context's lifetime to its host surface.
///
/// Contexts are kept in a side table keyed by surface. The table lock is only held while entries
/// are looked up or changed, never while a loop is being waited on.
pub struct LifecycleCoordinator<B: GraphicsBackend> {
    backend: Arc<B>,
    pacing: Pacing,
    clear_colour: [f32; 4],
    teardown_timeout: Duration,

    contexts: Mutex<HashMap<B::Surface, ProtectedSurfaceContext<B>>>,

    // Contexts whose loop never stopped, kept so their resources are never released.
    leaked: Mutex<Vec<ProtectedSurfaceContext<B>>>,
}

impl<B: GraphicsBackend> LifecycleCoordinator<B> {
    /// Creates a coordinator with no contexts.
    pub fn new(
        backend: Arc<B>,
        pacing: Pacing,
        clear_colour: [f32; 4],
        teardown_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            pacing,
            clear_colour,
            teardown_timeout,
            contexts: Mutex::new(HashMap::new()),
            leaked: Mutex::new(Vec::new()),
        }
    }

    /// Stores the negotiated resources for `surface` and starts its presentation loop.
    ///
    /// On failure the resources are released and no context is stored.
    #[instrument("LifecycleCoordinator::attach", skip(self, resources), err)]
    pub fn attach(&self, surface: B::Surface, resources: ChannelResources<B>) -> Result<(), Error> {
        let ChannelResources {
            device,
            presentation,
        } = resources;

        let mut contexts = self.contexts.lock();

        let entry = match contexts.entry(surface) {
            Entry::Vacant(entry) => entry,
            Entry::Occupied(_) => {
                release(presentation, device);
                return Err(Error::AlreadyAttached);
            }
        };

        // If the thread can't be spawned the resources are dropped with the closure.
        let presentation = match PresentationLoop::start(
            Arc::clone(&self.backend),
            presentation,
            self.pacing,
            self.clear_colour,
        ) {
            Ok(presentation) => presentation,
            Err(e) => {
                drop(device);
                return Err(Error::LoopStartFailed(e));
            }
        };

        entry.insert(ProtectedSurfaceContext {
            device,
            presentation,
        });

        info!("Started presentation for {surface:?}");
        Ok(())
    }

    /// Handles the host's destruction notification for `surface`.
    ///
    /// Stops the loop with a bounded wait, then releases target, channel, context and device in
    /// that order. The context stays tracked while the loop is waited on. If the loop does not
    /// stop in time nothing is released and [`Error::TeardownTimeout`] is returned.
    ///
    /// A notification that arrives while another teardown of `surface` is in progress is
    /// reported as [`TeardownOutcome::NotTracked`].
    pub fn on_surface_destroyed(&self, surface: B::Surface) -> Result<TeardownOutcome, Error> {
        let stop = {
            let contexts = self.contexts.lock();
            let Some(context) = contexts.get(&surface) else {
                return Ok(TeardownOutcome::NotTracked);
            };
            context.presentation.request_stop()
        };
        let Some(stop) = stop else {
            return Ok(TeardownOutcome::NotTracked);
        };

        let _timer = StageTimer::start("Tearing down protected surface");

        let stopped = stop.wait(self.teardown_timeout);

        let Some(mut context) = self.contexts.lock().remove(&surface) else {
            return Ok(TeardownOutcome::NotTracked);
        };

        match stopped {
            Ok(resources) => {
                context.presentation.join();
                release(resources, context.device);
                info!("Released protected context for {surface:?}");
                Ok(TeardownOutcome::Released)
            }

            Err(StopError::Timeout) => {
                let error = Error::TeardownTimeout(self.teardown_timeout);
                error!("Could not tear down {surface:?}: {error}");
                self.leaked.lock().push(context);
                Err(error)
            }

            Err(StopError::Panicked) => {
                context.presentation.join();
                error!("Presentation loop for {surface:?} panicked, releasing the device");
                drop(context.device);
                Ok(TeardownOutcome::LoopPanicked)
            }
        }
    }

    /// Number of surfaces with a live context.
    pub fn context_count(&self) -> usize {
        self.contexts.lock().len()
    }

    /// Number of contexts retained after a teardown timeout.
    pub fn leaked_count(&self) -> usize {
        self.leaked.lock().len()
    }

    /// Number of loops, including leaked ones, whose thread has not exited.
    pub fn active_loops(&self) -> usize {
        let active = |context: &ProtectedSurfaceContext<B>| {
            context.presentation.state() != LoopState::Stopped
        };

        let live = self.contexts.lock().values().filter(|c| active(c)).count();
        let leaked = self.leaked.lock().iter().filter(|c| active(c)).count();

        live + leaked
    }

    /// Loop state of the context attached to `surface`.
    pub fn loop_state(&self, surface: B::Surface) -> Option<LoopState> {
        self.contexts
            .lock()
            .get(&surface)
            .map(|context| context.presentation.state())
    }

    /// The running flag of the context attached to `surface`.
    pub fn is_running(&self, surface: B::Surface) -> Option<bool> {
        self.contexts
            .lock()
            .get(&surface)
            .map(|context| context.presentation.is_running())
    }
}

impl<B: GraphicsBackend> Drop for LifecycleCoordinator<B> {
    fn drop(&mut self) {
        let surfaces: Vec<B::Surface> = self.contexts.get_mut().keys().copied().collect();
        for surface in surfaces {
            if let Err(e) = self.on_surface_destroyed(surface) {
                error!("Failed to tear down {surface:?} on shutdown: {e}");
            }
        }

        // Leaked resources may still be in use, they live until the process exits.
        for context in self.leaked.get_mut().drain(..) {
            core::mem::forget(context);
        }
    }
}

/// Releases the narrowest resource first.
fn release<B: GraphicsBackend>(resources: PresentationResources<B>, device: B::Device) {
    let PresentationResources {
        target,
        channel,
        context,
    } = resources;

    drop(target);
    drop(channel);
    drop(context);
    drop(device);
}
