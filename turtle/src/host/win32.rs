use super::{CreateParams, Fetched, Host, Hwnd, PrevProc, WindowClass};
use crate::msg::Message;
use crate::{HostError, Vector2};
use core::ffi::c_void;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;
use widestring::U16CString;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{
    GetLastError, SetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, WIN32_ERROR, WPARAM,
};
use windows::Win32::Graphics::Gdi::{GetStockObject, HBRUSH, WHITE_BRUSH};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Every `Win32Host` talks to the same desktop.
const DESKTOP: usize = 0;

thread_local! {
    // Procedure each wrapped handle had before `entry_proc` replaced it, so
    // that messages arriving while no wrapper owns the handle still reach it.
    static SPLICED: RefCell<HashMap<isize, isize>> = RefCell::new(HashMap::new());
}

/// The real desktop, through `user32`.
pub struct Win32Host {
    instance: HINSTANCE,
}

impl Win32Host {
    pub fn new() -> Result<Self, HostError> {
        unsafe {
            let module = GetModuleHandleW(None).map_err(|_| last_error())?;
            Ok(Self {
                instance: module.into(),
            })
        }
    }
}

fn last_error() -> HostError {
    HostError(unsafe { GetLastError() }.0)
}

fn hwnd(h: Hwnd) -> HWND {
    HWND(h.0 as *mut c_void)
}

fn to_msg(msg: &Message) -> MSG {
    MSG {
        hwnd: hwnd(msg.hwnd),
        message: msg.message,
        wParam: WPARAM(msg.wparam),
        lParam: LPARAM(msg.lparam),
        time: msg.time,
        pt: POINT {
            x: msg.point.x,
            y: msg.point.y,
        },
    }
}

fn from_msg(msg: &MSG) -> Message {
    Message {
        hwnd: Hwnd(msg.hwnd.0 as isize),
        message: msg.message,
        wparam: msg.wParam.0,
        lparam: msg.lParam.0,
        time: msg.time,
        point: Vector2::new(msg.pt.x, msg.pt.y),
    }
}

unsafe extern "system" fn class_proc(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    DefWindowProcW(window, message, wparam, lparam)
}

/// Spliced into every wrapped handle. Forwards to the owning wrapper.
unsafe extern "system" fn entry_proc(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let handle = window.0 as isize;
    let msg = Message::new(Hwnd(handle), message, wparam.0, lparam.0);
    if let Some(result) = crate::window::dispatch_to_owner(DESKTOP, &msg) {
        return LRESULT(result);
    }
    let prev = SPLICED.with(|s| {
        let mut spliced = s.borrow_mut();
        if message == WM_NCDESTROY {
            spliced.remove(&handle)
        } else {
            spliced.get(&handle).copied()
        }
    });
    match prev {
        Some(prev) => {
            let proc: WNDPROC = core::mem::transmute::<isize, WNDPROC>(prev);
            CallWindowProcW(proc, window, message, wparam, lparam)
        }
        None => DefWindowProcW(window, message, wparam, lparam),
    }
}

impl Host for Win32Host {
    fn desktop(&self) -> usize {
        DESKTOP
    }

    fn register_class(&self, class: &WindowClass) -> Result<(), HostError> {
        unsafe {
            let class_name = U16CString::from_str_truncate(class.name);

            let wnd_class = WNDCLASSW {
                style: WNDCLASS_STYLES(class.style),
                lpfnWndProc: Some(class_proc),
                hInstance: self.instance,
                hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                hbrBackground: HBRUSH(GetStockObject(WHITE_BRUSH).0),
                lpszClassName: PCWSTR::from_raw(class_name.as_ptr()),
                ..Default::default()
            };

            if RegisterClassW(&wnd_class) == 0 {
                let e = last_error();
                if e == HostError::CLASS_ALREADY_EXISTS {
                    debug!("class {} was already registered", class.name);
                    return Ok(());
                }
                return Err(e);
            }
            Ok(())
        }
    }

    fn create_window(&self, params: &CreateParams<'_>) -> Result<Hwnd, HostError> {
        unsafe {
            let class_name = U16CString::from_str_truncate(params.class_name);
            let title = U16CString::from_str_truncate(params.title);

            let handle = CreateWindowExW(
                WINDOW_EX_STYLE(params.ex_style),
                PCWSTR::from_raw(class_name.as_ptr()),
                PCWSTR::from_raw(title.as_ptr()),
                WINDOW_STYLE(params.style),
                params.location.x,
                params.location.y,
                params.size.x,
                params.size.y,
                params.parent.map(hwnd),
                params.child_id.map(|id| HMENU(id as *mut c_void)),
                Some(self.instance),
                None,
            )
            .map_err(|_| last_error())?;

            Ok(Hwnd(handle.0 as isize))
        }
    }

    fn destroy_window(&self, window: Hwnd) {
        unsafe {
            let _ = DestroyWindow(hwnd(window));
        }
    }

    fn parent(&self, window: Hwnd) -> Option<Hwnd> {
        unsafe {
            GetParent(hwnd(window))
                .ok()
                .map(|p| Hwnd(p.0 as isize))
                .filter(|p| p.0 != 0)
        }
    }

    fn set_user_data(&self, window: Hwnd, value: usize) -> Result<usize, HostError> {
        unsafe {
            // A previous value of 0 is only a failure if the last error says so.
            SetLastError(WIN32_ERROR(0));
            let prev = SetWindowLongPtrW(hwnd(window), GWLP_USERDATA, value as isize);
            if prev == 0 {
                let e = last_error();
                if e.0 != 0 {
                    return Err(e);
                }
            }
            Ok(prev as usize)
        }
    }

    fn user_data(&self, window: Hwnd) -> usize {
        unsafe { GetWindowLongPtrW(hwnd(window), GWLP_USERDATA) as usize }
    }

    fn splice_proc(&self, window: Hwnd) -> Result<PrevProc, HostError> {
        unsafe {
            let prev = SetWindowLongPtrW(hwnd(window), GWLP_WNDPROC, entry_proc as usize as isize);
            if prev == 0 {
                return Err(last_error());
            }
            SPLICED.with(|s| s.borrow_mut().insert(window.0, prev));
            Ok(PrevProc(prev as usize))
        }
    }

    fn restore_proc(&self, window: Hwnd, prev: PrevProc) {
        SPLICED.with(|s| s.borrow_mut().remove(&window.0));
        unsafe {
            SetWindowLongPtrW(hwnd(window), GWLP_WNDPROC, prev.0 as isize);
        }
    }

    fn call_proc(&self, prev: PrevProc, msg: &Message) -> isize {
        unsafe {
            let proc: WNDPROC = core::mem::transmute::<usize, WNDPROC>(prev.0);
            CallWindowProcW(
                proc,
                hwnd(msg.hwnd),
                msg.message,
                WPARAM(msg.wparam),
                LPARAM(msg.lparam),
            )
            .0
        }
    }

    fn default_proc(&self, msg: &Message) -> isize {
        unsafe {
            DefWindowProcW(
                hwnd(msg.hwnd),
                msg.message,
                WPARAM(msg.wparam),
                LPARAM(msg.lparam),
            )
            .0
        }
    }

    fn send_message(&self, msg: &Message) -> isize {
        unsafe {
            SendMessageW(
                hwnd(msg.hwnd),
                msg.message,
                Some(WPARAM(msg.wparam)),
                Some(LPARAM(msg.lparam)),
            )
            .0
        }
    }

    fn post_message(&self, msg: &Message) -> Result<(), HostError> {
        unsafe {
            let target = (msg.hwnd.0 != 0).then(|| hwnd(msg.hwnd));
            PostMessageW(target, msg.message, WPARAM(msg.wparam), LPARAM(msg.lparam))
                .map_err(|_| last_error())
        }
    }

    fn post_quit(&self, exit_code: i32) {
        unsafe { PostQuitMessage(exit_code) }
    }

    fn get_message(&self) -> Result<Fetched, HostError> {
        unsafe {
            let mut msg = MSG::default();
            let status = GetMessageW(&mut msg, None, 0, 0).0;
            if status < 0 {
                Err(last_error())
            } else if status == 0 {
                Ok(Fetched::Quit(msg.wParam.0 as i32))
            } else {
                Ok(Fetched::Message(from_msg(&msg)))
            }
        }
    }

    fn dispatch_message(&self, msg: &Message) -> isize {
        unsafe {
            let raw = to_msg(msg);
            let _ = TranslateMessage(&raw);
            DispatchMessageW(&raw).0
        }
    }
}
