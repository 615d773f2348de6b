//! A small object layer over the desktop windowing API.
//!
//! Each [`Window`] owns exactly one native window handle and destroys it when
//! dropped. Messages for the handle are routed to the wrapper's [`Handler`].
//! [`MainWindow`]s are counted, and when the last one goes away the message
//! loop run by [`App::run`] returns.
//!
//! ```no_run
//! use turtle::*;
//!
//! fn main() -> turtle::Result<()> {
//!     let app = App::new()?;
//!     let _window = MainWindow::builder()
//!         .title("Hello")
//!         .size((800, 600))
//!         .build(&app)?;
//!     let exit_code = app.run()?;
//!     std::process::exit(exit_code);
//! }
//! ```

mod app;
mod builder;
mod error;
pub mod host;
mod main_window;
pub mod msg;
pub mod style;
mod vector;
mod window;

pub use app::App;
pub use builder::WindowBuilder;
pub use error::{Error, HostError, Result};
pub use host::{HeadlessHost, Host, Hwnd, WindowClass};
pub use main_window::{MainWindow, MAIN_WINDOW_CLASS};
pub use msg::{Event, Message, Reply};
pub use vector::{Vector2, Vector2f};
pub use window::{Handler, PlainWindow, Window, WindowState};

#[cfg(windows)]
pub use host::Win32Host;

use msg::WM_PRE_DESTROY;
use static_assertions::assert_not_impl_any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};
