use protected_surface::win32::create_protected_window;
use thiserror::Error;
use tracing::{info, instrument, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    platform::windows::WindowAttributesExtWindows,
    window::{Window, WindowId},
};

use crate::{
    config::Config,
    failure::{Failure, Ignore},
    windows_helpers::{exclude_from_capture, window_hwnd},
};

/// Events sent to the event loop from outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    ExitHotkeyPressed,
}

/// The host window with one protected child embedded in it.
pub struct HostApp {
    config: Config,
    window: Option<Window>,
}

impl HostApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
        }
    }

    /// Destroys the host window, which tears down the protected child before returning.
    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.take().is_some() {
            info!("Closed host window");
        }

        event_loop.exit();
    }
}

impl ApplicationHandler<HostEvent> for HostApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window =
            create_window(event_loop, &self.config).report_and_panic("Could not create the window");

        let hwnd = window_hwnd(&window).report_and_panic("Could not get the window handle");

        if self.config.hide_host_from_capture {
            exclude_from_capture(hwnd)
                .report("Could not hide the window from capture")
                .ignore();
        }

        // Failures were already shown to the user, the host keeps running without it.
        match create_protected_window(hwnd) {
            Some(child) => info!("Embedded protected window {child:?}"),
            None => warn!("Running without a protected window"),
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.close(event_loop),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: HostEvent) {
        match event {
            HostEvent::ExitHotkeyPressed => {
                info!("Exit hotkey pressed");
                self.close(event_loop);
            }
        }
    }
}

#[instrument(skip_all, err)]
fn create_window(event_loop: &ActiveEventLoop, config: &Config) -> Result<Window, Error> {
    let window_attributes = Window::default_attributes()
        .with_title("Protected Surface Host")
        // The protected child is sized in physical pixels, match it at any DPI.
        .with_inner_size(PhysicalSize::new(
            config.surface.width,
            config.surface.height,
        ))
        .with_skip_taskbar(config.skip_taskbar);

    let window = event_loop.create_window(window_attributes)?;

    Ok(window)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create window:\n{0}")]
    CreateWindow(#[from] OsError),
}
