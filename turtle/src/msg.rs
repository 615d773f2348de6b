//! Platform messages and the events a window handler reacts to.

use crate::{Hwnd, Vector2};

pub const WM_DESTROY: u32 = 0x0002;
pub const WM_CLOSE: u32 = 0x0010;
pub const WM_QUIT: u32 = 0x0012;
pub const WM_APP: u32 = 0x8000;

/// Sent synchronously by `destroy()` while the handle is still live.
pub const WM_PRE_DESTROY: u32 = WM_APP;

/// One platform message, as retrieved from the queue or sent to a window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub hwnd: Hwnd,
    pub message: u32,
    pub wparam: usize,
    pub lparam: isize,
    pub time: u32,
    pub point: Vector2,
}

impl Message {
    pub fn new(hwnd: Hwnd, message: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            hwnd,
            message,
            wparam,
            lparam,
            time: 0,
            point: Vector2::ZERO,
        }
    }

    pub fn event(&self) -> Event {
        match self.message {
            WM_CLOSE => Event::Close,
            WM_PRE_DESTROY => Event::PreDestroy,
            other => Event::Other(other),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// The user asked for the window to close.
    Close,
    /// The wrapper is about to tear down its handle.
    PreDestroy,
    Other(u32),
}

/// What a handler did with a message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Reply {
    Handled(isize),
    /// Pass the message on to the procedure that was in place before the
    /// wrapper spliced itself in.
    Default,
}
