//! Windows backend: Win32 window queries and GDI screen copies
//!
//! Process enumeration goes through `sysinfo`; everything that touches a
//! window handle or a device context is plain user32/gdi32.

use std::ffi::c_void;

use capture_types::{Bounds, ProcessHandle, WindowId};
use tracing::{debug, info};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CAPTUREBLT, COLORONCOLOR, CreateCompatibleDC,
    CreateDIBSection, DIB_RGB_COLORS, DeleteDC, DeleteObject, GdiFlush, GetDC, HALFTONE, HBITMAP, HDC,
    HGDIOBJ, ROP_CODE, ReleaseDC, SRCCOPY, SelectObject, SetStretchBltMode,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GW_OWNER, GetSystemMetrics, GetWindow, GetWindowRect, GetWindowTextLengthW, GetWindowThreadProcessId,
    IsIconic, IsWindow, IsWindowVisible, SM_CXSCREEN, SM_CYSCREEN, SW_RESTORE, SetForegroundWindow,
    ShowWindow,
};

use crate::process::{find_process_by_name, process_has_exited};
use crate::window::{WindowCandidate, select_main_window};
use crate::{
    CaptureError, CaptureResult, DesktopEnvironment, ResolutionError, ResolutionResult,
    SamplingQuality, ScreenSource,
};

fn hwnd(window: WindowId) -> HWND {
    HWND(window.0 as *mut c_void)
}

/// Windows desktop and screen access
pub struct WindowsPlatform {
    _private: (),
}

impl WindowsPlatform {
    pub fn new() -> CaptureResult<Self> {
        info!("Initializing Windows capture platform");
        Ok(Self { _private: () })
    }
}

impl DesktopEnvironment for WindowsPlatform {
    fn find_process(&self, name: &str) -> ResolutionResult<Option<ProcessHandle>> {
        Ok(find_process_by_name(name))
    }

    fn has_exited(&self, process: &ProcessHandle) -> ResolutionResult<bool> {
        Ok(process_has_exited(process))
    }

    fn main_window(&self, process: &ProcessHandle) -> ResolutionResult<Option<WindowId>> {
        find_main_window(process.pid)
    }

    fn window_bounds(&self, window: WindowId) -> ResolutionResult<Bounds> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut rect) }
            .map_err(|e| ResolutionError::WindowQuery(format!("GetWindowRect({}): {}", window, e)))?;

        Ok(Bounds::new(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn is_window(&self, window: WindowId) -> bool {
        window.0 != 0 && unsafe { IsWindow(hwnd(window)) }.as_bool()
    }

    fn is_minimized(&self, window: WindowId) -> bool {
        unsafe { IsIconic(hwnd(window)) }.as_bool()
    }

    fn restore_window(&self, window: WindowId) -> CaptureResult<()> {
        // Return value is the previous visibility, not success
        let _ = unsafe { ShowWindow(hwnd(window), SW_RESTORE) };
        Ok(())
    }

    fn bring_to_foreground(&self, window: WindowId) -> CaptureResult<()> {
        if unsafe { SetForegroundWindow(hwnd(window)) }.as_bool() {
            Ok(())
        } else {
            Err(CaptureError::WindowOperation(format!(
                "SetForegroundWindow({}) was refused",
                window
            )))
        }
    }

    fn primary_display_bounds(&self) -> Bounds {
        let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        Bounds::from_origin_size(0, 0, width.max(0) as u32, height.max(0) as u32)
    }
}

impl ScreenSource for WindowsPlatform {
    fn grab(&self, region: &Bounds, quality: SamplingQuality) -> CaptureResult<Vec<u8>> {
        grab_screen_region(region, quality)
    }
}

/// Find the main top-level window of `pid`: visible, unowned, preferably titled
fn find_main_window(pid: u32) -> ResolutionResult<Option<WindowId>> {
    struct WindowSearch {
        pid: u32,
        candidates: Vec<WindowCandidate>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        unsafe {
            let search = &mut *(lparam.0 as *mut WindowSearch);

            let mut owner_pid: u32 = 0;
            GetWindowThreadProcessId(hwnd, Some(&mut owner_pid));
            if owner_pid != search.pid {
                return TRUE;
            }

            search.candidates.push(WindowCandidate {
                id: WindowId(hwnd.0 as isize),
                visible: IsWindowVisible(hwnd).as_bool(),
                owned: GetWindow(hwnd, GW_OWNER).is_ok_and(|owner| !owner.is_invalid()),
                titled: GetWindowTextLengthW(hwnd) > 0,
            });
            TRUE
        }
    }

    let mut search = WindowSearch {
        pid,
        candidates: Vec::new(),
    };
    unsafe { EnumWindows(Some(enum_callback), LPARAM(&mut search as *mut _ as isize)) }.map_err(
        |e| ResolutionError::WindowQuery(format!("EnumWindows for pid {}: {}", pid, e)),
    )?;

    Ok(select_main_window(search.candidates))
}

/// Screen device context, released on drop
struct ScreenDc(HDC);

impl Drop for ScreenDc {
    fn drop(&mut self) {
        unsafe {
            let _ = ReleaseDC(HWND::default(), self.0);
        }
    }
}

/// Memory device context with a DIB section selected into it
struct DibCanvas {
    dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
    bits: *mut c_void,
}

impl DibCanvas {
    fn new(screen: &ScreenDc, width: i32, height: i32) -> CaptureResult<Self> {
        let dc = unsafe { CreateCompatibleDC(screen.0) };
        if dc.is_invalid() {
            return Err(CaptureError::DeviceContext(
                "CreateCompatibleDC returned null".into(),
            ));
        }

        // Setup BITMAPINFO for 32-bit BGRA
        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // Negative = top-down DIB
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut c_void = std::ptr::null_mut();
        let bitmap = match unsafe { CreateDIBSection(dc, &bmi, DIB_RGB_COLORS, &mut bits, None, 0) } {
            Ok(bitmap) if !bits.is_null() => bitmap,
            Ok(bitmap) => {
                unsafe {
                    let _ = DeleteObject(bitmap);
                    let _ = DeleteDC(dc);
                }
                return Err(CaptureError::DeviceContext(
                    "CreateDIBSection returned no pixel memory".into(),
                ));
            }
            Err(e) => {
                unsafe {
                    let _ = DeleteDC(dc);
                }
                return Err(CaptureError::DeviceContext(format!(
                    "CreateDIBSection {}x{}: {}",
                    width, height, e
                )));
            }
        };

        let previous = unsafe { SelectObject(dc, bitmap) };

        Ok(Self {
            dc,
            bitmap,
            previous,
            bits,
        })
    }
}

impl Drop for DibCanvas {
    fn drop(&mut self) {
        unsafe {
            let _ = SelectObject(self.dc, self.previous);
            let _ = DeleteObject(self.bitmap);
            let _ = DeleteDC(self.dc);
        }
    }
}

fn grab_screen_region(region: &Bounds, quality: SamplingQuality) -> CaptureResult<Vec<u8>> {
    let (width, height) = (region.width() as i32, region.height() as i32);
    if width <= 0 || height <= 0 {
        return Err(CaptureError::InvalidBounds {
            width: region.width(),
            height: region.height(),
        });
    }

    let screen = ScreenDc(unsafe { GetDC(HWND::default()) });
    if screen.0.is_invalid() {
        return Err(CaptureError::DeviceContext("GetDC(desktop) returned null".into()));
    }

    let canvas = DibCanvas::new(&screen, width, height)?;

    let mode = match quality {
        SamplingQuality::High => HALFTONE,
        SamplingQuality::Fast => COLORONCOLOR,
    };
    unsafe {
        let _ = SetStretchBltMode(canvas.dc, mode);
    }

    unsafe {
        BitBlt(
            canvas.dc,
            0,
            0,
            width,
            height,
            screen.0,
            region.left,
            region.top,
            ROP_CODE(SRCCOPY.0 | CAPTUREBLT.0),
        )
    }
    .map_err(|e| CaptureError::CaptureFailed(format!("BitBlt {}: {}", region, e)))?;

    let len = width as usize * height as usize * 4;
    let mut pixels = vec![0u8; len];
    unsafe {
        // Batched GDI calls must land before the bits are read
        let _ = GdiFlush();
        std::ptr::copy_nonoverlapping(canvas.bits as *const u8, pixels.as_mut_ptr(), len);
    }

    debug!("Copied {} from screen", region);
    Ok(pixels)
}
