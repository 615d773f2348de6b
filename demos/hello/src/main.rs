use std::cell::Cell;
use tracing::info;
use tracing_subscriber::EnvFilter;
use turtle::*;

/// Counts close requests and gives in on the second one.
struct AskTwice {
    asked: Cell<u32>,
}

impl Handler for AskTwice {
    fn on_message(&self, _window: &WindowState, event: Event, _msg: &Message) -> Reply {
        match event {
            Event::Close if self.asked.get() == 0 => {
                self.asked.set(1);
                info!("close requested once, close again to quit");
                Reply::Handled(0)
            }
            Event::PreDestroy => {
                info!("window going away");
                Reply::Default
            }
            _ => Reply::Default,
        }
    }
}

fn main() -> turtle::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = App::new()?;

    let window = MainWindow::with_handler(
        &app,
        MainWindow::builder()
            .title("Hello, turtle")
            .size((800, 600))
            .exit_code(0),
        AskTwice {
            asked: Cell::new(0),
        },
    )?;

    let step = Vector2::new(3, 4);
    info!(
        "window {:?}, step {:?} has length {}",
        window.handle(),
        step,
        step.magnitude()
    );

    // Nobody can click the close box of the in-memory desktop.
    if cfg!(not(windows)) {
        let _ = window.post_close();
        let _ = window.post_close();
    }

    let exit_code = window.main_loop()?;
    info!("message loop finished with {}", exit_code);
    std::process::exit(exit_code);
}
