//! # Protected Surface Host
//! Demo host that embeds a capture-protected child window.
//!

#![allow(clippy::std_instead_of_alloc)]
// hide console window on Windows in release
#![cfg_attr(all(windows, feature = "hide-console"), windows_subsystem = "windows")]

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use logger::setup_logger;

#[cfg(windows)]
mod app;
#[cfg(windows)]
mod config;
#[cfg(windows)]
mod directories;
#[cfg(windows)]
mod failure;
mod logger;
#[cfg(windows)]
mod windows_helpers;

/// The Cargo package version.
#[cfg(not(debug_assertions))]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Cargo package version or '0.0.0' if a non-release build.
#[cfg(debug_assertions)]
pub const VERSION: &str = "0.0.0";

/// If this instance should have debug enabled.
pub fn should_debug() -> bool {
    std::env::args().any(|arg| arg.eq("--debug"))
}

#[cfg(not(windows))]
fn main() {
    let _logger_guards = setup_logger(should_debug(), None);
    tracing::error!("Exiting: protected surfaces are only supported on Windows.");
}

#[cfg(windows)]
fn main() {
    use app::{HostApp, HostEvent};
    use config::Config;
    use directories::config_dir;
    use failure::{Failure, Ignore, report_and_panic};
    use global_hotkey::{
        GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
        hotkey::{Code, HotKey, Modifiers},
    };
    use tracing::{info, info_span, warn};
    use windows::Win32::UI::WindowsAndMessaging::{
        IDNO, IDYES, MB_DEFBUTTON2, MB_ICONWARNING, MB_SETFOREGROUND, MB_YESNO,
    };
    use windows_helpers::display_message;
    use winit::event_loop::{ControlFlow, EventLoop};

    // Set up logger
    let _logger_guards = setup_logger(should_debug(), Some(config_dir().as_path()))
        .report_and_panic("Could not set up the logger");

    // Log application start
    let _span = info_span!("[Main Thread]").entered();
    info!("Protected Surface Host v{}", VERSION);

    // Load config
    let config = {
        let maybe_config = match Config::try_load_config() {
            Ok(maybe_config) => maybe_config,
            Err(error) => {
                warn!("Could not deserialize config file:\n{error}");
                let action = display_message(
                    "Your config file is invalid.\nMore details are in the logs.\n\nClear and reset your config file?",
                    MB_SETFOREGROUND | MB_YESNO | MB_ICONWARNING | MB_DEFBUTTON2,
                );

                match action {
                    IDYES => {
                        info!("Resetting config file.");
                        None
                    }

                    IDNO => {
                        warn!("Exiting: Invalid config.");
                        return;
                    }

                    value => report_and_panic(
                        format!("Message box returned an unexpected response: {value:?}"),
                        "Message box returned an unexpected response",
                    ),
                }
            }
        };

        match maybe_config {
            Some(config) => config,
            None => {
                let config = Config::default();
                config.save();
                config
            }
        }
    };

    // Must happen before the first protected window is created
    protected_surface::win32::install(config.surface)
        .report_and_panic("The protected surface settings in your config file are invalid");

    // Create event loop
    let event_loop: EventLoop<HostEvent> = EventLoop::with_user_event()
        .build()
        .report_and_panic("Could not create the application window");
    event_loop.set_control_flow(ControlFlow::Wait);

    // Register exit hotkey
    let _hotkey_manager = if config.exit_hotkey {
        let hotkey_manager =
            GlobalHotKeyManager::new().report_and_panic("Could not setup the exit hotkey");

        let hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyQ);
        hotkey_manager
            .register(hotkey)
            .report_and_panic("Could not register the exit hotkey");

        let proxy = event_loop.create_proxy();
        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            if event.id == hotkey.id() && event.state == HotKeyState::Pressed {
                proxy.send_event(HostEvent::ExitHotkeyPressed).ignore();
            }
        }));

        Some(hotkey_manager)
    } else {
        None
    };

    // Run the app
    let mut app = HostApp::new(config);
    event_loop.run_app(&mut app).ignore();
}
