use super::*;
use crate::host::Fetched;
use std::collections::{HashMap, HashSet};

/// Identifies a wrapper. This is what a handle's user-data slot holds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct OwnerId(pub(crate) usize);

/// Process-scoped state shared by every window of one [`App`].
///
/// * `owners` maps the value stored in a handle's user-data slot back to the
///   wrapper that owns the handle. Entries are added when a wrapper is
///   allocated and removed when it is dropped.
/// * `live_windows` starts at 0 and only moves when a top-level window is
///   created or sends its pre-destroy notification.
/// * `registered` holds the classes already registered; a class is added
///   only after the host accepted it.
pub(crate) struct Context {
    pub(crate) host: Rc<dyn Host>,
    owners: RefCell<HashMap<OwnerId, Weak<WindowState>>>,
    live_windows: Cell<u32>,
    registered: RefCell<HashSet<&'static str>>,
}

thread_local! {
    // The platform calls back with nothing but a handle, so the entry point
    // searches the contexts of this thread for the one that owns it.
    static CONTEXTS: RefCell<Vec<Weak<Context>>> = const { RefCell::new(Vec::new()) };

    // Shared by every context on the thread, so a user-data value names at
    // most one wrapper even when two contexts share a desktop.
    static NEXT_OWNER: Cell<usize> = const { Cell::new(1) };
}

impl Context {
    fn new(host: Rc<dyn Host>) -> Rc<Self> {
        let ctx = Rc::new(Self {
            host,
            owners: Default::default(),
            live_windows: Cell::new(0),
            registered: Default::default(),
        });
        CONTEXTS.with(|c| {
            let mut contexts = c.borrow_mut();
            contexts.retain(|w| w.strong_count() != 0);
            contexts.push(Rc::downgrade(&ctx));
        });
        ctx
    }

    /// Finds the wrapper owning `hwnd` on `desktop`, in whichever context of
    /// this thread allocated it.
    pub(crate) fn find_owner(desktop: usize, hwnd: Hwnd) -> Option<Rc<WindowState>> {
        // Upgrade first: a handler may create another `App` while we dispatch.
        let contexts: Vec<Rc<Context>> =
            CONTEXTS.with(|c| c.borrow().iter().filter_map(Weak::upgrade).collect());
        contexts
            .iter()
            .filter(|ctx| ctx.host.desktop() == desktop)
            .find_map(|ctx| ctx.owner_of(hwnd))
    }

    pub(crate) fn allocate_owner(&self) -> OwnerId {
        NEXT_OWNER.with(|next| {
            let id = next.get();
            next.set(id + 1);
            OwnerId(id)
        })
    }

    pub(crate) fn insert_owner(&self, id: OwnerId, state: Weak<WindowState>) {
        self.owners.borrow_mut().insert(id, state);
    }

    pub(crate) fn remove_owner(&self, id: OwnerId) {
        self.owners.borrow_mut().remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn owner_count(&self) -> usize {
        self.owners.borrow().len()
    }

    /// Finds the wrapper that currently owns `hwnd`.
    pub(crate) fn owner_of(&self, hwnd: Hwnd) -> Option<Rc<WindowState>> {
        let id = self.host.user_data(hwnd);
        if id == 0 {
            return None;
        }
        let state = self.owners.borrow().get(&OwnerId(id)).and_then(Weak::upgrade)?;
        // The slot and the wrapper must point at each other.
        (state.handle() == Some(hwnd)).then_some(state)
    }

    pub(crate) fn ensure_class(&self, class: &WindowClass) -> Result<()> {
        if self.registered.borrow().contains(class.name) {
            return Ok(());
        }
        debug!("registering window class {}", class.name);
        self.host
            .register_class(class)
            .map_err(|source| Error::Registration {
                class: class.name.to_string(),
                source,
            })?;
        self.registered.borrow_mut().insert(class.name);
        Ok(())
    }

    pub(crate) fn retain_top_level(&self) {
        let n = self.live_windows.get() + 1;
        self.live_windows.set(n);
        debug!("live top-level windows: {}", n);
    }

    pub(crate) fn release_top_level(&self, exit_code: i32) {
        match self.live_windows.get().checked_sub(1) {
            Some(n) => {
                self.live_windows.set(n);
                debug!("live top-level windows: {}", n);
                if n == 0 {
                    debug!("last top-level window gone, posting quit({})", exit_code);
                    self.host.post_quit(exit_code);
                }
            }
            None => warn!("top-level window released while none were live"),
        }
    }

    pub(crate) fn run(&self) -> Result<i32> {
        loop {
            match self.host.get_message().map_err(Error::Retrieval)? {
                Fetched::Quit(exit_code) => {
                    debug!("message loop: quit, exit code {}", exit_code);
                    return Ok(exit_code);
                }
                Fetched::Message(msg) => {
                    trace!("message loop: {:?} 0x{:04x}", msg.hwnd, msg.message);
                    self.host.dispatch_message(&msg);
                }
            }
        }
    }
}

/// Owns the process-wide windowing state and runs the message loop.
///
/// Create one before any window. Several may coexist on a thread; each
/// keeps its own windows and counter.
pub struct App {
    ctx: Rc<Context>,
}

assert_not_impl_any!(App: Send, Sync);

impl App {
    #[cfg(windows)]
    pub fn new() -> Result<Self> {
        let host = Win32Host::new().map_err(Error::Initialization)?;
        Ok(Self::with_host(Rc::new(host)))
    }

    #[cfg(not(windows))]
    pub fn new() -> Result<Self> {
        Ok(Self::with_host(Rc::new(HeadlessHost::new())))
    }

    pub fn with_host(host: Rc<dyn Host>) -> Self {
        Self {
            ctx: Context::new(host),
        }
    }

    pub(crate) fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.ctx.host
    }

    /// Number of top-level windows currently open.
    pub fn live_windows(&self) -> u32 {
        self.ctx.live_windows.get()
    }

    pub fn post_quit(&self, exit_code: i32) {
        self.ctx.host.post_quit(exit_code)
    }

    pub fn post_message(&self, msg: &Message) -> core::result::Result<(), HostError> {
        self.ctx.host.post_message(msg)
    }

    /// Retrieves and dispatches messages until the quit signal arrives, and
    /// returns the exit code it carried.
    pub fn run(&self) -> Result<i32> {
        self.ctx.run()
    }
}
