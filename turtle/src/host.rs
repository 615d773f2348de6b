//! The seam between the wrapper and the windowing platform.
//!
//! Everything the wrapper needs from the desktop goes through [`Host`]. On
//! Windows this is [`Win32Host`]; [`HeadlessHost`] keeps the same contract in
//! memory, which is what the tests run against.

use crate::msg::Message;
use crate::{HostError, Vector2};

mod headless;
#[cfg(windows)]
mod win32;

pub use headless::{Fault, HeadlessHost};
#[cfg(windows)]
pub use win32::Win32Host;

/// Opaque identifier of a live platform window.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Hwnd(pub isize);

/// A window procedure that was in place before the wrapper spliced itself
/// into a handle. Only meaningful to the host that handed it out.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PrevProc(pub usize);

/// A class registered with the host before windows of it can be created.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WindowClass {
    pub name: &'static str,
    pub style: u32,
}

pub struct CreateParams<'a> {
    pub parent: Option<Hwnd>,
    pub class_name: &'a str,
    pub title: &'a str,
    pub style: u32,
    pub ex_style: u32,
    pub location: Vector2,
    pub size: Vector2,
    /// Child identifier (`HMENU` for child windows).
    pub child_id: Option<usize>,
}

/// Result of pulling one message off the queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fetched {
    Message(Message),
    Quit(i32),
}

pub trait Host {
    /// Identifies the desktop this host talks to. Handle values and
    /// user-data slots are only unique within one desktop.
    fn desktop(&self) -> usize;

    /// Registers `class`. A class the desktop already knows is not an error.
    fn register_class(&self, class: &WindowClass) -> Result<(), HostError>;

    fn create_window(&self, params: &CreateParams<'_>) -> Result<Hwnd, HostError>;

    /// Destroys the handle. Unknown or already-destroyed handles are ignored.
    fn destroy_window(&self, hwnd: Hwnd);

    fn parent(&self, hwnd: Hwnd) -> Option<Hwnd>;

    /// Stores `value` in the handle's user-data slot, returning the old value.
    fn set_user_data(&self, hwnd: Hwnd, value: usize) -> Result<usize, HostError>;

    /// Reads the user-data slot; 0 when unset or when the handle is unknown.
    fn user_data(&self, hwnd: Hwnd) -> usize;

    /// Installs the crate's entry point as the handle's window procedure.
    fn splice_proc(&self, hwnd: Hwnd) -> Result<PrevProc, HostError>;

    fn restore_proc(&self, hwnd: Hwnd, prev: PrevProc);

    fn call_proc(&self, prev: PrevProc, msg: &Message) -> isize;

    fn default_proc(&self, msg: &Message) -> isize;

    /// Delivers `msg` synchronously to the handle's current procedure.
    fn send_message(&self, msg: &Message) -> isize;

    fn post_message(&self, msg: &Message) -> Result<(), HostError>;

    fn post_quit(&self, exit_code: i32);

    /// Blocks until a message is available.
    fn get_message(&self) -> Result<Fetched, HostError>;

    /// Translates and dispatches a message retrieved by `get_message`.
    fn dispatch_message(&self, msg: &Message) -> isize;
}
