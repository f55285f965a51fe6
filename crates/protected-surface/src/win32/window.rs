use tracing::{error, instrument};
use windows::{
    Win32::{
        Foundation::{ERROR_CLASS_ALREADY_EXISTS, GetLastError, HWND, LPARAM, LRESULT, RECT, WPARAM},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect,
            MB_ICONERROR, MB_OK, MB_SETFOREGROUND, MessageBoxW, RegisterClassW, SW_SHOW,
            SetWindowDisplayAffinity, ShowWindow, WDA_EXCLUDEFROMCAPTURE, WINDOW_EX_STYLE,
            WM_NCDESTROY, WNDCLASSW, WS_CHILD,
        },
    },
    core::{HSTRING, PCWSTR, h, w},
};

use crate::{SurfaceSize, WindowSystem};

use super::{LabelledWinResult, WinError, Win32Surface};

const CLASS_NAME: PCWSTR = w!("ProtectedHostWnd");

/// User32 child windows whose destruction is forwarded to the process-wide manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Windows;

impl WindowSystem for Win32Windows {
    type Surface = Win32Surface;
    type Error = WinError;

    #[instrument("Win32Windows::register_surface_class", skip_all, err)]
    fn register_surface_class(&self) -> LabelledWinResult<()> {
        let instance =
            unsafe { GetModuleHandleW(None) }.map_err(|e| WinError::new(e, "GetModuleHandleW"))?;

        let class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(protected_window_proc),
            hInstance: instance.into(),
            lpszClassName: CLASS_NAME,
            ..WNDCLASSW::default()
        };

        if unsafe { RegisterClassW(&class) } == 0 {
            let error = unsafe { GetLastError() };
            if error != ERROR_CLASS_ALREADY_EXISTS {
                return Err(WinError::from_win32(error, "RegisterClassW"));
            }
        }

        Ok(())
    }

    #[instrument("Win32Windows::create_child_surface", skip(self), err)]
    fn create_child_surface(
        &self,
        parent: Win32Surface,
        size: SurfaceSize,
    ) -> LabelledWinResult<Win32Surface> {
        let instance =
            unsafe { GetModuleHandleW(None) }.map_err(|e| WinError::new(e, "GetModuleHandleW"))?;

        // Created hidden, shown once capture exclusion is applied.
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                CLASS_NAME,
                w!(""),
                WS_CHILD,
                0,
                0,
                i32::try_from(size.width).unwrap_or(i32::MAX),
                i32::try_from(size.height).unwrap_or(i32::MAX),
                Some(parent.hwnd()),
                None,
                Some(instance.into()),
                None,
            )
        }
        .map_err(|e| WinError::new(e, "CreateWindowExW"))?;

        Ok(Win32Surface::from(hwnd))
    }

    #[instrument("Win32Windows::exclude_from_capture", skip(self), err)]
    fn exclude_from_capture(&self, surface: Win32Surface) -> LabelledWinResult<()> {
        unsafe { SetWindowDisplayAffinity(surface.hwnd(), WDA_EXCLUDEFROMCAPTURE) }
            .map_err(|e| WinError::new(e, "SetWindowDisplayAffinity"))
    }

    fn client_size(&self, surface: Win32Surface) -> LabelledWinResult<SurfaceSize> {
        let mut rect = RECT::default();
        unsafe { GetClientRect(surface.hwnd(), &mut rect) }
            .map_err(|e| WinError::new(e, "GetClientRect"))?;

        let width = u32::try_from(rect.right - rect.left).unwrap_or(0);
        let height = u32::try_from(rect.bottom - rect.top).unwrap_or(0);

        Ok(SurfaceSize::new(width, height))
    }

    fn show_surface(&self, surface: Win32Surface) {
        // Returns the previous visibility, not an error.
        let _ = unsafe { ShowWindow(surface.hwnd(), SW_SHOW) };
    }

    fn destroy_surface(&self, surface: Win32Surface) {
        if let Err(e) = unsafe { DestroyWindow(surface.hwnd()) } {
            error!("Failed to destroy {surface:?}: {e}");
        }
    }

    fn notify_failure(&self, owner: Win32Surface, message: &str) {
        let message = HSTRING::from(message);

        unsafe {
            MessageBoxW(
                Some(owner.hwnd()),
                &message,
                h!("Protected Surface"),
                MB_OK | MB_ICONERROR | MB_SETFOREGROUND,
            )
        };
    }
}

/// Forwards the final message a protected window receives to the lifecycle coordinator.
unsafe extern "system" fn protected_window_proc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if message == WM_NCDESTROY {
        super::surface_destroyed(Win32Surface::from(hwnd));
    }

    unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
}
