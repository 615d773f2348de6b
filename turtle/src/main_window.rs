//! Top-level windows, whose count decides when the application quits.

use super::*;
use crate::style::{CS_HREDRAW, CS_VREDRAW};

pub const MAIN_WINDOW_CLASS: WindowClass = WindowClass {
    name: "turtle.MainWindow",
    style: CS_HREDRAW | CS_VREDRAW,
};

/// A window with no parent. While it is open it counts as a live window;
/// when the last one is destroyed the message loop is told to quit.
pub struct MainWindow {
    window: Window,
}

impl core::ops::Deref for MainWindow {
    type Target = Window;
    fn deref(&self) -> &Window {
        &self.window
    }
}

/// Handler for top-level windows. The user's handler sees every message
/// first; it may keep a close request from destroying the window, but the
/// live-window bookkeeping on pre-destroy always runs.
struct TopLevel<H> {
    user: H,
    exit_code: i32,
}

impl<H: Handler> Handler for TopLevel<H> {
    fn on_message(&self, window: &WindowState, event: Event, msg: &Message) -> Reply {
        let reply = self.user.on_message(window, event, msg);
        match event {
            Event::Close if reply == Reply::Default => {
                window.destroy();
                Reply::Handled(0)
            }
            Event::PreDestroy => {
                window.context().release_top_level(self.exit_code);
                Reply::Handled(0)
            }
            _ => reply,
        }
    }
}

impl MainWindow {
    pub fn builder() -> WindowBuilder {
        WindowBuilder::default()
    }

    pub fn new(app: &App, builder: &WindowBuilder) -> Result<Self> {
        Self::with_handler(app, builder, PlainWindow)
    }

    pub fn with_size(app: &App, width: i32, height: i32) -> Result<Self> {
        Self::new(app, Self::builder().size((width, height)))
    }

    /// Creates a top-level window whose messages go to `handler` first.
    pub fn with_handler<H>(app: &App, builder: &WindowBuilder, handler: H) -> Result<Self>
    where
        H: Handler + 'static,
    {
        let ctx = app.context();
        ctx.ensure_class(&MAIN_WINDOW_CLASS)?;
        let window = Window::create(
            ctx,
            None,
            MAIN_WINDOW_CLASS.name,
            builder,
            Box::new(TopLevel {
                user: handler,
                exit_code: builder.get_exit_code(),
            }),
        )?;
        ctx.retain_top_level();
        Ok(Self { window })
    }

    /// Move-assignment between top-level windows. See [`Window::move_from`].
    pub fn move_from(&mut self, source: &mut MainWindow) -> Result<()> {
        self.window.move_from(&mut source.window)
    }

    /// Runs the message loop until the last top-level window is gone.
    pub fn main_loop(&self) -> Result<i32> {
        self.window.context().run()
    }
}
