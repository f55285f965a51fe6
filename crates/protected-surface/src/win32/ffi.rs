use windows::Win32::Foundation::HWND;

/// C entry point for hosts that embed the protected window by handle.
///
/// Returns a null handle on failure.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn CreateProtectedWindow(parent: HWND) -> HWND {
    super::create_protected_window(parent).unwrap_or_default()
}
