use core::ffi::c_void;

use protected_surface::win32::{LabelledWinResult, WinError};
use windows::{
    Win32::{
        Foundation::HWND,
        UI::WindowsAndMessaging::{
            MESSAGEBOX_RESULT, MESSAGEBOX_STYLE, MessageBoxW, SetWindowDisplayAffinity,
            WDA_EXCLUDEFROMCAPTURE,
        },
    },
    core::{HSTRING, h},
};
use winit::{
    raw_window_handle::{HasWindowHandle, RawWindowHandle},
    window::Window,
};

/// Display a Windows message box.
pub fn display_message(message: &str, style: MESSAGEBOX_STYLE) -> MESSAGEBOX_RESULT {
    unsafe {
        let message = HSTRING::from(message);

        MessageBoxW(None, &message, h!("Protected Surface Host"), style)
    }
}

/// The Win32 handle of a winit window.
pub fn window_hwnd(window: &Window) -> Option<HWND> {
    let handle = window.window_handle().ok()?;

    match handle.as_raw() {
        RawWindowHandle::Win32(handle) => Some(HWND(handle.hwnd.get() as *mut c_void)),
        _ => None,
    }
}

/// Hides a top level window from screen capture.
pub fn exclude_from_capture(hwnd: HWND) -> LabelledWinResult<()> {
    unsafe { SetWindowDisplayAffinity(hwnd, WDA_EXCLUDEFROMCAPTURE) }
        .map_err(|e| WinError::new(e, "SetWindowDisplayAffinity"))
}
