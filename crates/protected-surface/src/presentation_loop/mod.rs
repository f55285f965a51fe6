use core::time::Duration;
use std::{
    sync::{
        Arc,
        mpsc::{Receiver, RecvTimeoutError, SyncSender, sync_channel},
    },
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info_span};

use crate::{GraphicsBackend, PresentError, PresentStatus};

pub use running_flag::RunningFlag;

mod running_flag;

/// Observable phase of a presentation loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Allocated but not scheduled.
    Created,
    /// Clearing and presenting every cycle.
    Running,
    /// The flag was cleared, the loop exits at the top of its next cycle.
    StopRequested,
    /// The thread has exited and is joinable.
    Stopped,
}

/// Presentation cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Vertical blanks each present waits for.
    pub sync_interval: u32,

    /// Sleep after each present.
    pub frame_interval: Option<Duration>,
}

impl Pacing {
    /// Used when presents do not block on vsync, roughly 60 cycles per second.
    pub const FALLBACK_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    /// How long to sleep after a present that returned `status`.
    pub fn frame_sleep(&self, status: PresentStatus) -> Option<Duration> {
        match (status, self.sync_interval, self.frame_interval) {
            (_, _, Some(interval)) => Some(interval),
            (PresentStatus::Occluded, _, None) | (_, 0, None) => {
                Some(Self::FALLBACK_FRAME_INTERVAL)
            }
            (PresentStatus::Presented, _, None) => None,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            sync_interval: 1,
            frame_interval: None,
        }
    }
}

/// The resources the presentation loop uses, owned by the loop thread while it runs.
///
/// Fields are declared in release order.
pub struct PresentationResources<B: GraphicsBackend> {
    /// Back buffer view, released first.
    pub target: B::Target,

    /// Protected channel the target was derived from.
    pub channel: B::Channel,

    /// Context used to clear the target.
    pub context: B::CommandContext,
}

/// Errors from stopping a presentation loop.
#[derive(Debug, Error)]
pub enum StopError {
    /// The loop did not hand its resources back in time.
    #[error("The presentation loop did not stop in time")]
    Timeout,

    /// The loop thread panicked, its resources were dropped while unwinding.
    #[error("The presentation loop panicked")]
    Panicked,
}

type Handoff<B> = Arc<Mutex<Receiver<PresentationResources<B>>>>;

/// Handle to a dedicated presentation thread.
///
/// The thread takes ownership of the [`PresentationResources`] when started and hands them
/// back through a single-use channel once it observes the stop request, so the resources are
/// only ever touched by one side at a time.
pub struct PresentationLoop<B: GraphicsBackend> {
    flag: Arc<RunningFlag>,

    // Option allows for joining the thread which requires ownership.
    thread: Option<JoinHandle<()>>,

    handoff: Handoff<B>,
}

/// Waits for a loop whose stop was requested to hand back its resources.
///
/// Borrows nothing from the [`PresentationLoop`], so the owner's lock need not be held while
/// waiting.
pub struct StopHandle<B: GraphicsBackend> {
    handoff: Handoff<B>,
}

impl<B: GraphicsBackend> StopHandle<B> {
    /// Waits up to `timeout` for the resources.
    ///
    /// On [`StopError::Timeout`] the loop still owns the resources, its handle must be kept so
    /// they are never released under it.
    pub fn wait(&self, timeout: Duration) -> Result<PresentationResources<B>, StopError> {
        match self.handoff.lock().recv_timeout(timeout) {
            Ok(resources) => Ok(resources),
            Err(RecvTimeoutError::Timeout) => Err(StopError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(StopError::Panicked),
        }
    }
}

impl<B: GraphicsBackend> PresentationLoop<B> {
    /// Sets the running flag and starts presenting on a new thread.
    pub fn start(
        backend: Arc<B>,
        resources: PresentationResources<B>,
        pacing: Pacing,
        clear_colour: [f32; 4],
    ) -> std::io::Result<Self> {
        let flag = Arc::new(RunningFlag::new());
        let (sender, handoff) = sync_channel(1);

        flag.start();

        let thread = {
            let flag = Arc::clone(&flag);

            thread::Builder::new()
                .name(String::from("Presentation Loop"))
                .spawn(move || {
                    let _span = info_span!("[Presentation Loop]").entered();

                    // Dropped in reverse order, a panic releases the resources before the
                    // coordinator sees the channel disconnect.
                    let sender = sender;
                    let resources = resources;

                    present_until_stopped(
                        backend.as_ref(),
                        &resources,
                        &flag,
                        pacing,
                        clear_colour,
                    );
                    hand_back(&sender, resources);
                })?
        };

        Ok(Self {
            flag,
            thread: Some(thread),
            handoff: Arc::new(Mutex::new(handoff)),
        })
    }

    /// Current phase of the loop.
    pub fn state(&self) -> LoopState {
        let finished = self
            .thread
            .as_ref()
            .is_none_or(|thread| thread.is_finished());

        if finished {
            LoopState::Stopped
        } else if self.flag.stop_requested() {
            LoopState::StopRequested
        } else if self.flag.is_running() {
            LoopState::Running
        } else {
            LoopState::Created
        }
    }

    /// If the running flag reads true.
    pub fn is_running(&self) -> bool {
        self.flag.is_running()
    }

    /// Clears the running flag.
    ///
    /// Returns `None` if a stop was already requested, only one caller gets to wait.
    pub fn request_stop(&self) -> Option<StopHandle<B>> {
        if !self.flag.request_stop() {
            return None;
        }

        debug!("Requested presentation loop stop");
        Some(StopHandle {
            handoff: Arc::clone(&self.handoff),
        })
    }

    /// Joins the thread once it has handed back its resources or panicked.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Joining the presentation loop thread returned an error");
            }
        }
    }
}

impl<B: GraphicsBackend> Drop for PresentationLoop<B> {
    fn drop(&mut self) {
        // Never joins, a loop dropped before `join` is detached.
        self.flag.request_stop();
    }
}

fn present_until_stopped<B: GraphicsBackend>(
    backend: &B,
    resources: &PresentationResources<B>,
    flag: &RunningFlag,
    pacing: Pacing,
    clear_colour: [f32; 4],
) {
    let mut frames: u64 = 0;

    while flag.is_running() {
        backend.clear(&resources.context, &resources.target, clear_colour);

        let status = match backend.present(&resources.channel, pacing.sync_interval) {
            Ok(status) => status,
            Err(e) => {
                match &e {
                    PresentError::DeviceLost(_) => {
                        error!("Stopping presentation, the protected channel was lost: {e}")
                    }
                    PresentError::Failed(_) => error!("Stopping presentation: {e}"),
                }
                break;
            }
        };
        frames += 1;

        if let Some(interval) = pacing.frame_sleep(status) {
            thread::sleep(interval);
        }
    }

    debug!("Presentation loop exited after {frames} frames");
}

fn hand_back<B: GraphicsBackend>(
    sender: &SyncSender<PresentationResources<B>>,
    resources: PresentationResources<B>,
) {
    // The receiver is only gone once the owning coordinator is, nothing else can reach the
    // resources at that point.
    if sender.send(resources).is_err() {
        debug!("Presentation resources were not collected, releasing on the loop thread");
    }
}
