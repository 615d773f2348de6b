//! Binds a wrapper's lifetime to one native window handle.

use super::*;
use crate::app::{Context, OwnerId};
use crate::host::{CreateParams, PrevProc};
use crate::msg::WM_CLOSE;

/// Reacts to the messages delivered to a window.
///
/// Anything answered with [`Reply::Default`] goes on to the procedure the
/// window had before the wrapper took it over. Handlers may call
/// [`WindowState::destroy`] on the window they are handling.
pub trait Handler {
    fn on_message(&self, window: &WindowState, event: Event, msg: &Message) -> Reply {
        let _ = (window, event, msg);
        Reply::Default
    }
}

/// Passes every message through.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainWindow;

impl Handler for PlainWindow {}

/// The part of a wrapper that the platform callback can reach.
///
/// While a handle is owned, the handle's user-data slot names this state and
/// `handle` names the handle. Both are set up before the wrapper is handed
/// out and torn down together in `destroy`.
pub struct WindowState {
    ctx: Rc<Context>,
    owner: OwnerId,
    handler: Box<dyn Handler>,
    handle: Cell<Option<Hwnd>>,
    child_id: Cell<Option<usize>>,
    prev_proc: Cell<Option<PrevProc>>,
    /// Sparse: a destroyed child leaves `None` so that later ids stay valid.
    children: RefCell<Vec<Option<Hwnd>>>,
    destroying: Cell<bool>,
}

impl WindowState {
    fn allocate(ctx: &Rc<Context>, handler: Box<dyn Handler>) -> Rc<Self> {
        let owner = ctx.allocate_owner();
        let state = Rc::new(Self {
            ctx: ctx.clone(),
            owner,
            handler,
            handle: Cell::new(None),
            child_id: Cell::new(None),
            prev_proc: Cell::new(None),
            children: RefCell::new(Vec::new()),
            destroying: Cell::new(false),
        });
        ctx.insert_owner(owner, Rc::downgrade(&state));
        state
    }

    /// The owned handle, or `None` once destroyed or moved out.
    pub fn handle(&self) -> Option<Hwnd> {
        self.handle.get()
    }

    pub fn is_live(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Position in the parent's child list when this window was created.
    pub fn child_id(&self) -> Option<usize> {
        self.child_id.get()
    }

    pub fn children(&self) -> Vec<Option<Hwnd>> {
        self.children.borrow().clone()
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.ctx.host
    }

    pub(crate) fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    /// Hands `msg` to the procedure this window had before it was wrapped.
    pub fn call_previous(&self, msg: &Message) -> isize {
        match self.prev_proc.get() {
            Some(prev) => self.ctx.host.call_proc(prev, msg),
            None => self.ctx.host.default_proc(msg),
        }
    }

    /// Queues a close request, as if the user had clicked the close box.
    pub fn post_close(&self) -> core::result::Result<(), HostError> {
        let handle = self.handle.get().ok_or(HostError::INVALID_WINDOW_HANDLE)?;
        self.ctx.host.post_message(&Message::new(handle, WM_CLOSE, 0, 0))
    }

    /// Tears down the handle and every child still alive under it.
    ///
    /// Calling this on an empty wrapper, or again while a destroy of the same
    /// wrapper is in progress, does nothing.
    pub fn destroy(&self) {
        let Some(handle) = self.handle.get() else {
            return;
        };
        if self.destroying.replace(true) {
            return;
        }
        let host = &self.ctx.host;
        debug!("destroying window {:?}", handle);

        host.send_message(&Message::new(handle, WM_PRE_DESTROY, 0, 0));

        // Match by handle, not by child id: earlier siblings may be gone.
        if let Some(parent) = host.parent(handle).and_then(|p| self.ctx.owner_of(p)) {
            if let Some(slot) = parent
                .children
                .borrow_mut()
                .iter_mut()
                .find(|slot| **slot == Some(handle))
            {
                *slot = None;
            }
        }

        let children = self.children.take();
        for child in children.into_iter().flatten() {
            match self.ctx.owner_of(child) {
                Some(state) => state.destroy(),
                None => trace!("child {:?} has no owner, skipping", child),
            }
        }

        if let Some(prev) = self.prev_proc.take() {
            host.restore_proc(handle, prev);
        }
        host.destroy_window(handle);

        self.handle.set(None);
        self.child_id.set(None);
        self.children.borrow_mut().clear();
        self.destroying.set(false);
    }

    fn handle_message(&self, msg: &Message) -> isize {
        match self.handler.on_message(self, msg.event(), msg) {
            Reply::Handled(result) => result,
            Reply::Default => self.call_previous(msg),
        }
    }
}

impl Drop for WindowState {
    fn drop(&mut self) {
        self.ctx.remove_owner(self.owner);
    }
}

/// Entry point for every wrapped handle on `desktop`: finds the owner and
/// lets it handle the message. `None` means nobody owns the handle right now
/// (during a move, for example), and the host should chain to the procedure
/// it spliced over.
pub(crate) fn dispatch_to_owner(desktop: usize, msg: &Message) -> Option<isize> {
    let state = Context::find_owner(desktop, msg.hwnd)?;
    Some(state.handle_message(msg))
}

/// Exclusive owner of one native window. Dropping it destroys the window.
pub struct Window {
    state: Rc<WindowState>,
}

assert_not_impl_any!(Window: Clone, Send, Sync);

impl core::ops::Deref for Window {
    type Target = WindowState;
    fn deref(&self) -> &WindowState {
        &self.state
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.state.destroy();
    }
}

impl Window {
    /// Creates a window of an already-registered class (or a system class
    /// such as `STATIC`). With a parent, the new window is appended to the
    /// parent's child list and gets its index there as child id.
    pub fn new<H>(
        app: &App,
        parent: Option<&WindowState>,
        class_name: &str,
        builder: &WindowBuilder,
        handler: H,
    ) -> Result<Window>
    where
        H: Handler + 'static,
    {
        Self::create(app.context(), parent, class_name, builder, Box::new(handler))
    }

    pub(crate) fn create(
        ctx: &Rc<Context>,
        parent: Option<&WindowState>,
        class_name: &str,
        builder: &WindowBuilder,
        handler: Box<dyn Handler>,
    ) -> Result<Window> {
        let host = &ctx.host;
        let state = WindowState::allocate(ctx, handler);

        let parent_handle = match parent {
            Some(p) => Some(p.handle().ok_or(Error::Creation(HostError::INVALID_WINDOW_HANDLE))?),
            None => None,
        };
        let child_id = parent.map(|p| p.children.borrow().len());

        let handle = host
            .create_window(&CreateParams {
                parent: parent_handle,
                class_name,
                title: builder.get_title(),
                style: builder.get_style(),
                ex_style: builder.get_ex_style(),
                location: builder.get_location(),
                size: builder.get_size(),
                child_id,
            })
            .map_err(Error::Creation)?;

        if let Err(e) = host.set_user_data(handle, state.owner.0) {
            abandon(host, handle, None);
            return Err(Error::Initialization(e));
        }

        let prev = match host.splice_proc(handle) {
            Ok(prev) => prev,
            Err(e) => {
                abandon(host, handle, None);
                return Err(Error::Initialization(e));
            }
        };

        if let Some(parent) = parent {
            let mut siblings = parent.children.borrow_mut();
            if siblings.try_reserve(1).is_err() {
                drop(siblings);
                abandon(host, handle, Some(prev));
                return Err(Error::Initialization(HostError::NOT_ENOUGH_MEMORY));
            }
            siblings.push(Some(handle));
        }

        state.handle.set(Some(handle));
        state.child_id.set(child_id);
        state.prev_proc.set(Some(prev));
        debug!(
            "created window {:?} ({}), owner {:?}, child id {:?}",
            handle, class_name, state.owner, child_id
        );

        Ok(Window { state })
    }

    /// Move-assignment: takes over `source`'s window, destroying whatever
    /// `self` owned before. `source` is left empty.
    ///
    /// The handle's back-reference is repointed first; if that fails neither
    /// wrapper is touched.
    pub fn move_from(&mut self, source: &mut Window) -> Result<()> {
        if Rc::ptr_eq(&self.state, &source.state) {
            return Ok(());
        }
        let (dst, src) = (&self.state, &source.state);
        debug_assert!(Rc::ptr_eq(&dst.ctx, &src.ctx));

        if let Some(handle) = src.handle.get() {
            if let Err(e) = dst.ctx.host.set_user_data(handle, dst.owner.0) {
                warn!("could not repoint {:?} to {:?}: {}", handle, dst.owner, e);
                return Err(Error::Move(e));
            }
        }

        dst.destroy();

        dst.handle.swap(&src.handle);
        dst.child_id.swap(&src.child_id);
        dst.prev_proc.swap(&src.prev_proc);
        dst.children.swap(&src.children);
        debug!("moved window {:?} to owner {:?}", dst.handle.get(), dst.owner);
        Ok(())
    }
}

fn abandon(host: &Rc<dyn Host>, handle: Hwnd, prev: Option<PrevProc>) {
    warn!("initialization of {:?} failed, destroying it", handle);
    if let Some(prev) = prev {
        host.restore_proc(handle, prev);
    }
    host.destroy_window(handle);
}
