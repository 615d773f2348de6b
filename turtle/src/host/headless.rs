//! An in-memory desktop.
//!
//! Handles, user-data slots, window procedures, the class table and the
//! message queue all live in one `RefCell`. The borrow is always released
//! before calling back into the wrapper, since delivering a message can
//! re-enter the host (a handler destroying its window, for example).

use super::{CreateParams, Fetched, Host, Hwnd, PrevProc, WindowClass};
use crate::msg::Message;
use crate::{HostError, Vector2};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::trace;

/// The procedure of every registered class (default handling).
const CLASS_PROC: PrevProc = PrevProc(1);

/// The crate's entry point, once spliced in.
const ENTRY_PROC: PrevProc = PrevProc(2);

/// The procedure of the built-in control classes. It records what it sees
/// and then falls back to default handling.
const CONTROL_PROC: PrevProc = PrevProc(3);

const FIRST_HANDLE: isize = 0x10;

/// Host call that can be made to fail once with [`HeadlessHost::inject`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    RegisterClass,
    CreateWindow,
    SetUserData,
    SpliceProc,
    PostMessage,
    GetMessage,
}

pub struct HeadlessHost {
    state: RefCell<State>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct State {
    next_handle: isize,
    classes: HashMap<String, PrevProc>,
    windows: BTreeMap<Hwnd, HeadlessWindow>,
    queue: VecDeque<Message>,
    quit: Option<i32>,
    faults: Vec<Fault>,
    registrations: Vec<String>,
    destroyed: Vec<Hwnd>,
    default_handled: Vec<Message>,
    control_handled: Vec<Message>,
}

struct HeadlessWindow {
    parent: Option<Hwnd>,
    title: String,
    style: u32,
    location: Vector2,
    size: Vector2,
    child_id: Option<usize>,
    user_data: usize,
    proc: PrevProc,
    spliced_from: Option<PrevProc>,
}

impl HeadlessHost {
    /// Injected failures report this code (`ERROR_ACCESS_DENIED`).
    pub const INJECTED: HostError = HostError(5);

    /// `get_message` on an empty queue reports this (`ERROR_NO_MORE_ITEMS`),
    /// since there is nothing that could ever wake it up.
    pub const QUEUE_EMPTY: HostError = HostError(259);

    pub fn new() -> Self {
        let mut state = State {
            next_handle: FIRST_HANDLE,
            ..Default::default()
        };
        for builtin in ["STATIC", "BUTTON"] {
            state.classes.insert(builtin.to_string(), CONTROL_PROC);
        }
        Self {
            state: RefCell::new(state),
        }
    }

    /// Makes the next call of the given kind fail.
    pub fn inject(&self, fault: Fault) {
        self.state.borrow_mut().faults.push(fault);
    }

    pub fn is_window(&self, hwnd: Hwnd) -> bool {
        self.state.borrow().windows.contains_key(&hwnd)
    }

    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }

    pub fn title(&self, hwnd: Hwnd) -> Option<String> {
        self.state.borrow().windows.get(&hwnd).map(|w| w.title.clone())
    }

    pub fn style(&self, hwnd: Hwnd) -> Option<u32> {
        self.state.borrow().windows.get(&hwnd).map(|w| w.style)
    }

    pub fn bounds(&self, hwnd: Hwnd) -> Option<(Vector2, Vector2)> {
        self.state
            .borrow()
            .windows
            .get(&hwnd)
            .map(|w| (w.location, w.size))
    }

    pub fn child_id(&self, hwnd: Hwnd) -> Option<usize> {
        self.state.borrow().windows.get(&hwnd).and_then(|w| w.child_id)
    }

    pub fn is_spliced(&self, hwnd: Hwnd) -> bool {
        self.state
            .borrow()
            .windows
            .get(&hwnd)
            .is_some_and(|w| w.proc == ENTRY_PROC)
    }

    /// Names passed to `register_class`, in call order, including failed calls.
    pub fn registrations(&self) -> Vec<String> {
        self.state.borrow().registrations.clone()
    }

    /// Handles destroyed so far, in destruction order.
    pub fn destroyed(&self) -> Vec<Hwnd> {
        self.state.borrow().destroyed.clone()
    }

    /// Messages that reached default handling.
    pub fn default_handled(&self) -> Vec<Message> {
        self.state.borrow().default_handled.clone()
    }

    /// Messages that reached a built-in control's own procedure.
    pub fn control_handled(&self) -> Vec<Message> {
        self.state.borrow().control_handled.clone()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    fn take_fault(&self, fault: Fault) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        let found = state.faults.iter().position(|f| *f == fault);
        match found {
            Some(i) => {
                state.faults.remove(i);
                trace!("headless: injected failure of {:?}", fault);
                Err(Self::INJECTED)
            }
            None => Ok(()),
        }
    }

    fn spliced_from(&self, hwnd: Hwnd) -> Option<PrevProc> {
        self.state
            .borrow()
            .windows
            .get(&hwnd)
            .and_then(|w| w.spliced_from)
            .filter(|p| *p != ENTRY_PROC)
    }

    fn deliver(&self, proc: PrevProc, msg: &Message) -> isize {
        match proc {
            ENTRY_PROC => match crate::window::dispatch_to_owner(self.desktop(), msg) {
                Some(result) => result,
                // Unowned for now: chain to whatever the entry point replaced.
                None => match self.spliced_from(msg.hwnd) {
                    Some(prev) => self.deliver(prev, msg),
                    None => self.default_proc(msg),
                },
            },
            CONTROL_PROC => {
                self.state.borrow_mut().control_handled.push(*msg);
                self.default_proc(msg)
            }
            _ => self.default_proc(msg),
        }
    }
}

impl Host for HeadlessHost {
    fn desktop(&self) -> usize {
        self as *const Self as usize
    }

    fn register_class(&self, class: &WindowClass) -> Result<(), HostError> {
        self.state
            .borrow_mut()
            .registrations
            .push(class.name.to_string());
        self.take_fault(Fault::RegisterClass)?;
        let mut state = self.state.borrow_mut();
        if state.classes.contains_key(class.name) {
            trace!("headless: class {} was already registered", class.name);
            return Ok(());
        }
        state.classes.insert(class.name.to_string(), CLASS_PROC);
        Ok(())
    }

    fn create_window(&self, params: &CreateParams<'_>) -> Result<Hwnd, HostError> {
        self.take_fault(Fault::CreateWindow)?;
        let mut state = self.state.borrow_mut();
        let proc = *state
            .classes
            .get(params.class_name)
            .ok_or(HostError::CANNOT_FIND_WND_CLASS)?;
        if let Some(parent) = params.parent {
            if !state.windows.contains_key(&parent) {
                return Err(HostError::INVALID_WINDOW_HANDLE);
            }
        }

        let hwnd = Hwnd(state.next_handle);
        state.next_handle += 4;
        state.windows.insert(
            hwnd,
            HeadlessWindow {
                parent: params.parent,
                title: params.title.to_string(),
                style: params.style,
                location: params.location,
                size: params.size,
                child_id: params.child_id,
                user_data: 0,
                proc,
                spliced_from: None,
            },
        );
        trace!("headless: created {:?} ({})", hwnd, params.class_name);
        Ok(hwnd)
    }

    fn destroy_window(&self, hwnd: Hwnd) {
        let mut state = self.state.borrow_mut();
        if !state.windows.contains_key(&hwnd) {
            return;
        }

        // Descendants go with their ancestor.
        let mut doomed = vec![hwnd];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i];
            doomed.extend(
                state
                    .windows
                    .iter()
                    .filter(|(_, w)| w.parent == Some(current))
                    .map(|(h, _)| *h),
            );
            i += 1;
        }

        for h in doomed {
            state.windows.remove(&h);
            state.destroyed.push(h);
            trace!("headless: destroyed {:?}", h);
        }
    }

    fn parent(&self, hwnd: Hwnd) -> Option<Hwnd> {
        self.state.borrow().windows.get(&hwnd).and_then(|w| w.parent)
    }

    fn set_user_data(&self, hwnd: Hwnd, value: usize) -> Result<usize, HostError> {
        self.take_fault(Fault::SetUserData)?;
        let mut state = self.state.borrow_mut();
        let window = state
            .windows
            .get_mut(&hwnd)
            .ok_or(HostError::INVALID_WINDOW_HANDLE)?;
        Ok(core::mem::replace(&mut window.user_data, value))
    }

    fn user_data(&self, hwnd: Hwnd) -> usize {
        self.state
            .borrow()
            .windows
            .get(&hwnd)
            .map_or(0, |w| w.user_data)
    }

    fn splice_proc(&self, hwnd: Hwnd) -> Result<PrevProc, HostError> {
        self.take_fault(Fault::SpliceProc)?;
        let mut state = self.state.borrow_mut();
        let window = state
            .windows
            .get_mut(&hwnd)
            .ok_or(HostError::INVALID_WINDOW_HANDLE)?;
        let prev = core::mem::replace(&mut window.proc, ENTRY_PROC);
        window.spliced_from = Some(prev);
        Ok(prev)
    }

    fn restore_proc(&self, hwnd: Hwnd, prev: PrevProc) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(&hwnd) {
            window.proc = prev;
            window.spliced_from = None;
        }
    }

    fn call_proc(&self, prev: PrevProc, msg: &Message) -> isize {
        self.deliver(prev, msg)
    }

    fn default_proc(&self, msg: &Message) -> isize {
        self.state.borrow_mut().default_handled.push(*msg);
        0
    }

    fn send_message(&self, msg: &Message) -> isize {
        let proc = self.state.borrow().windows.get(&msg.hwnd).map(|w| w.proc);
        match proc {
            Some(proc) => self.deliver(proc, msg),
            None => 0,
        }
    }

    fn post_message(&self, msg: &Message) -> Result<(), HostError> {
        self.take_fault(Fault::PostMessage)?;
        self.state.borrow_mut().queue.push_back(*msg);
        Ok(())
    }

    fn post_quit(&self, exit_code: i32) {
        self.state.borrow_mut().quit = Some(exit_code);
    }

    fn get_message(&self) -> Result<Fetched, HostError> {
        self.take_fault(Fault::GetMessage)?;
        let mut state = self.state.borrow_mut();
        if let Some(msg) = state.queue.pop_front() {
            return Ok(Fetched::Message(msg));
        }
        // Like WM_QUIT, the quit request is only seen once the queue drains.
        match state.quit.take() {
            Some(code) => Ok(Fetched::Quit(code)),
            None => Err(Self::QUEUE_EMPTY),
        }
    }

    fn dispatch_message(&self, msg: &Message) -> isize {
        self.send_message(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::WM_CLOSE;

    fn params(class_name: &str, parent: Option<Hwnd>) -> CreateParams<'_> {
        CreateParams {
            parent,
            class_name,
            title: "t",
            style: 0,
            ex_style: 0,
            location: Vector2::new(1, 2),
            size: Vector2::new(3, 4),
            child_id: None,
        }
    }

    #[test]
    fn unknown_class_is_refused() {
        let host = HeadlessHost::new();
        assert_eq!(
            host.create_window(&params("nope", None)),
            Err(HostError::CANNOT_FIND_WND_CLASS)
        );
    }

    #[test]
    fn destroying_parent_takes_descendants() {
        let host = HeadlessHost::new();
        let a = host.create_window(&params("STATIC", None)).unwrap();
        let b = host.create_window(&params("STATIC", Some(a))).unwrap();
        let c = host.create_window(&params("STATIC", Some(b))).unwrap();
        let other = host.create_window(&params("STATIC", None)).unwrap();

        host.destroy_window(a);
        assert_eq!(host.destroyed(), vec![a, b, c]);
        assert!(host.is_window(other));
        assert_eq!(host.window_count(), 1);

        // Already gone.
        host.destroy_window(a);
        assert_eq!(host.destroyed().len(), 3);
    }

    #[test]
    fn quit_is_seen_after_pending_messages() {
        let host = HeadlessHost::new();
        let a = host.create_window(&params("STATIC", None)).unwrap();
        host.post_quit(3);
        host.post_message(&Message::new(a, WM_CLOSE, 0, 0)).unwrap();

        assert!(matches!(host.get_message(), Ok(Fetched::Message(m)) if m.message == WM_CLOSE));
        assert_eq!(host.get_message(), Ok(Fetched::Quit(3)));
        assert_eq!(host.get_message(), Err(HeadlessHost::QUEUE_EMPTY));
    }

    #[test]
    fn injected_faults_fire_once() {
        let host = HeadlessHost::new();
        let a = host.create_window(&params("STATIC", None)).unwrap();
        host.inject(Fault::SetUserData);
        assert_eq!(host.set_user_data(a, 7), Err(HeadlessHost::INJECTED));
        assert_eq!(host.set_user_data(a, 7), Ok(0));
        assert_eq!(host.user_data(a), 7);
    }

    #[test]
    fn unspliced_messages_reach_class_procedure() {
        let host = HeadlessHost::new();
        let a = host.create_window(&params("STATIC", None)).unwrap();
        let msg = Message::new(a, WM_CLOSE, 0, 0);
        assert_eq!(host.send_message(&msg), 0);
        assert_eq!(host.control_handled(), vec![msg]);
        assert_eq!(host.default_handled(), vec![msg]);
        assert!(!host.is_spliced(a));
    }

    #[test]
    fn registering_known_class_succeeds() {
        let host = HeadlessHost::new();
        let class = WindowClass {
            name: "turtle.twice",
            style: 0,
        };
        assert_eq!(host.register_class(&class), Ok(()));
        assert_eq!(host.register_class(&class), Ok(()));
        assert_eq!(
            host.register_class(&WindowClass {
                name: "STATIC",
                style: 0
            }),
            Ok(())
        );
        assert_eq!(host.registrations().len(), 3);
        assert!(host.create_window(&params("turtle.twice", None)).is_ok());
    }

    #[test]
    fn unowned_spliced_handle_chains_to_replaced_procedure() {
        let host = HeadlessHost::new();
        let a = host.create_window(&params("BUTTON", None)).unwrap();
        assert_eq!(host.splice_proc(a), Ok(CONTROL_PROC));
        assert!(host.is_spliced(a));

        let msg = Message::new(a, 0x0201, 0, 0);
        host.send_message(&msg);
        assert_eq!(host.control_handled(), vec![msg]);

        host.restore_proc(a, CONTROL_PROC);
        assert!(!host.is_spliced(a));
    }

    #[test]
    fn each_host_is_its_own_desktop() {
        let a = HeadlessHost::new();
        let b = HeadlessHost::new();
        assert_ne!(a.desktop(), b.desktop());
        assert_eq!(a.desktop(), a.desktop());
    }
}
