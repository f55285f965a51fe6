//! In-process doubles for the window system and graphics backend.
//!
//! Every call is recorded as an [`Event`] and every resource is counted while alive, so tests
//! can assert on call order and on what was released.
//!

#![allow(dead_code)]

use core::time::Duration;
use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    thread,
    time::Instant,
};

use parking_lot::{Condvar, Mutex};
use protected_surface::{
    ChannelDescriptor, GraphicsBackend, PresentError, PresentStatus, ProtectedSurfaceManager,
    SurfaceConfig, SurfaceSize, WindowSystem,
};
use thiserror::Error;

/// Surface identity handed out by [`MockWindows`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockSurface(pub u32);

/// The host's top level window.
pub const PARENT: MockSurface = MockSurface(0);

/// A graphics resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Device,
    Context,
    Channel,
    Target,
}

/// A recorded call or release.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    RegisterClass,
    CreateSurface(MockSurface),
    ExcludeFromCapture(MockSurface),
    Show(MockSurface),
    Destroy(MockSurface),
    Notify(MockSurface, String),
    CreateDevice,
    CreateChannel(MockSurface, ChannelDescriptor),
    CreateTarget,
    Clear,
    Present,
    Release(Resource),
}

/// A call the doubles can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    RegisterClass,
    CreateSurface,
    ExcludeFromCapture,
    CreateDevice,
    CreateChannel,
    CreateTarget,
    LoseDevice,
    /// Presents return [`PresentStatus::Occluded`].
    Occlude,
    PanicInClear,
}

#[derive(Debug, Error)]
#[error("Mock {0} failed")]
pub struct MockError(&'static str);

/// State shared by both doubles and the test.
#[derive(Default)]
pub struct Harness {
    events: Mutex<Vec<Event>>,
    live: Mutex<Vec<Resource>>,
    faults: Mutex<HashSet<Fault>>,
    next_surface: AtomicU32,

    gate_closed: Mutex<bool>,
    gate_changed: Condvar,
    gate_entered: AtomicBool,
}

impl Harness {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| matches(e)).count()
    }

    pub fn position(&self, matches: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events.lock().iter().position(matches)
    }

    pub fn releases(&self) -> Vec<Resource> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Release(resource) => Some(*resource),
                _ => None,
            })
            .collect()
    }

    /// Number of resources currently alive.
    pub fn live(&self) -> usize {
        self.live.lock().len()
    }

    pub fn live_of(&self, kind: Resource) -> usize {
        self.live.lock().iter().filter(|r| **r == kind).count()
    }

    pub fn inject(&self, fault: Fault) {
        self.faults.lock().insert(fault);
    }

    /// Makes the next present block until [`Harness::open_gate`].
    pub fn close_gate(&self) {
        *self.gate_closed.lock() = true;
    }

    pub fn open_gate(&self) {
        *self.gate_closed.lock() = false;
        self.gate_changed.notify_all();
    }

    /// If a present is blocked on the gate.
    pub fn gate_entered(&self) -> bool {
        self.gate_entered.load(Ordering::SeqCst)
    }

    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }

    fn fails(&self, fault: Fault) -> bool {
        self.faults.lock().contains(&fault)
    }

    fn acquire(self: &Arc<Self>, kind: Resource) -> Tracked {
        self.live.lock().push(kind);
        Tracked {
            kind,
            harness: Arc::clone(self),
        }
    }

    fn wait_at_gate(&self) {
        let mut closed = self.gate_closed.lock();
        if *closed {
            self.gate_entered.store(true, Ordering::SeqCst);
        }
        while *closed {
            self.gate_changed.wait(&mut closed);
        }
    }
}

/// A resource that records its release when dropped.
pub struct Tracked {
    kind: Resource,
    harness: Arc<Harness>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut live = self.harness.live.lock();
        if let Some(index) = live.iter().position(|r| *r == self.kind) {
            live.swap_remove(index);
        }
        drop(live);

        self.harness.record(Event::Release(self.kind));
    }
}

pub struct MockWindows(Arc<Harness>);

impl WindowSystem for MockWindows {
    type Surface = MockSurface;
    type Error = MockError;

    fn register_surface_class(&self) -> Result<(), MockError> {
        self.0.record(Event::RegisterClass);
        if self.0.fails(Fault::RegisterClass) {
            return Err(MockError("class registration"));
        }
        Ok(())
    }

    fn create_child_surface(
        &self,
        _parent: MockSurface,
        _size: SurfaceSize,
    ) -> Result<MockSurface, MockError> {
        if self.0.fails(Fault::CreateSurface) {
            return Err(MockError("surface creation"));
        }

        let surface = MockSurface(self.0.next_surface.fetch_add(1, Ordering::SeqCst) + 1);
        self.0.record(Event::CreateSurface(surface));
        Ok(surface)
    }

    fn exclude_from_capture(&self, surface: MockSurface) -> Result<(), MockError> {
        if self.0.fails(Fault::ExcludeFromCapture) {
            return Err(MockError("capture exclusion"));
        }
        self.0.record(Event::ExcludeFromCapture(surface));
        Ok(())
    }

    fn client_size(&self, _surface: MockSurface) -> Result<SurfaceSize, MockError> {
        let config = SurfaceConfig::default();
        Ok(SurfaceSize::new(config.width, config.height))
    }

    fn show_surface(&self, surface: MockSurface) {
        self.0.record(Event::Show(surface));
    }

    fn destroy_surface(&self, surface: MockSurface) {
        self.0.record(Event::Destroy(surface));
    }

    fn notify_failure(&self, owner: MockSurface, message: &str) {
        self.0.record(Event::Notify(owner, message.to_string()));
    }
}

pub struct MockBackend(Arc<Harness>);

impl GraphicsBackend for MockBackend {
    type Surface = MockSurface;
    type Device = Tracked;
    type CommandContext = Tracked;
    type Channel = Tracked;
    type Target = Tracked;
    type Error = MockError;

    fn create_device(&self) -> Result<(Tracked, Tracked), MockError> {
        self.0.record(Event::CreateDevice);
        if self.0.fails(Fault::CreateDevice) {
            return Err(MockError("device creation"));
        }

        Ok((
            self.0.acquire(Resource::Device),
            self.0.acquire(Resource::Context),
        ))
    }

    fn create_protected_channel(
        &self,
        _device: &Tracked,
        surface: MockSurface,
        descriptor: &ChannelDescriptor,
    ) -> Result<Tracked, MockError> {
        self.0.record(Event::CreateChannel(surface, *descriptor));
        if self.0.fails(Fault::CreateChannel) {
            return Err(MockError("protected channel request"));
        }

        Ok(self.0.acquire(Resource::Channel))
    }

    fn create_target(&self, _device: &Tracked, _channel: &Tracked) -> Result<Tracked, MockError> {
        self.0.record(Event::CreateTarget);
        if self.0.fails(Fault::CreateTarget) {
            return Err(MockError("target creation"));
        }

        Ok(self.0.acquire(Resource::Target))
    }

    fn clear(&self, _context: &Tracked, _target: &Tracked, _colour: [f32; 4]) {
        self.0.record(Event::Clear);
        if self.0.fails(Fault::PanicInClear) {
            panic!("Mock clear panicked");
        }
    }

    fn present(
        &self,
        _channel: &Tracked,
        _sync_interval: u32,
    ) -> Result<PresentStatus, PresentError> {
        self.0.wait_at_gate();

        if self.0.fails(Fault::LoseDevice) {
            return Err(PresentError::DeviceLost(Box::new(MockError("present"))));
        }

        self.0.record(Event::Present);
        if self.0.fails(Fault::Occlude) {
            return Ok(PresentStatus::Occluded);
        }
        Ok(PresentStatus::Presented)
    }
}

pub type MockManager = ProtectedSurfaceManager<MockWindows, MockBackend>;

/// Fast cadence and a short teardown bound.
pub fn test_config() -> SurfaceConfig {
    SurfaceConfig {
        frame_interval_ms: Some(1),
        teardown_timeout_ms: 100,
        ..SurfaceConfig::default()
    }
}

pub fn doubles() -> (Arc<Harness>, MockWindows, MockBackend) {
    let harness = Arc::new(Harness::default());
    let windows = MockWindows(Arc::clone(&harness));
    let backend = MockBackend(Arc::clone(&harness));
    (harness, windows, backend)
}

pub fn manager() -> (Arc<Harness>, MockManager) {
    let (harness, windows, backend) = doubles();
    let manager = MockManager::new(windows, backend, test_config()).unwrap();
    (harness, manager)
}

/// Polls `condition` for up to two seconds.
pub fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
