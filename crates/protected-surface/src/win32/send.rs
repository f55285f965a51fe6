use core::ops::Deref;

use windows::Win32::Foundation::HWND;

/// Wrapper to move a D3D11/DXGI interface onto the presentation thread.
///
/// The immediate context and swap chain are only used by one thread at a time: the
/// coordinator before the loop starts and after it hands them back, the loop in between.
#[derive(Debug)]
pub struct SendInterface<T>(pub T);

unsafe impl<T> Send for SendInterface<T> {}

impl<T> Deref for SendInterface<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A window handle usable as a surface identity across threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Win32Surface(pub isize);

impl Win32Surface {
    /// The underlying window handle.
    pub fn hwnd(self) -> HWND {
        HWND(self.0 as *mut _)
    }
}

impl From<HWND> for Win32Surface {
    fn from(hwnd: HWND) -> Self {
        Self(hwnd.0 as isize)
    }
}
