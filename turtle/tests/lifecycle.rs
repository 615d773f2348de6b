use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use turtle::host::Fault;
use turtle::msg::WM_CLOSE;
use turtle::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (Rc<HeadlessHost>, App) {
    init_logging();
    let host = Rc::new(HeadlessHost::new());
    let app = App::with_host(host.clone());
    (host, app)
}

/// Logs (window, event) for close and pre-destroy.
struct Log {
    name: &'static str,
    entries: Rc<RefCell<Vec<(&'static str, Event)>>>,
}

impl Handler for Log {
    fn on_message(&self, _window: &WindowState, event: Event, _msg: &Message) -> Reply {
        if matches!(event, Event::Close | Event::PreDestroy) {
            self.entries.borrow_mut().push((self.name, event));
        }
        Reply::Default
    }
}

#[test]
fn two_windows_quit_after_the_second_closes() {
    let (host, app) = setup();
    let entries = Rc::new(RefCell::new(Vec::new()));

    let first = MainWindow::with_handler(
        &app,
        MainWindow::builder().exit_code(1),
        Log {
            name: "first",
            entries: entries.clone(),
        },
    )
    .unwrap();
    let second = MainWindow::with_handler(
        &app,
        MainWindow::builder().exit_code(2),
        Log {
            name: "second",
            entries: entries.clone(),
        },
    )
    .unwrap();
    assert_eq!(app.live_windows(), 2);
    let (h1, h2) = (first.handle().unwrap(), second.handle().unwrap());

    first.post_close().unwrap();
    second.post_close().unwrap();
    assert_eq!(app.run().unwrap(), 2);

    assert_eq!(app.live_windows(), 0);
    assert_eq!(host.destroyed(), vec![h1, h2]);
    assert_eq!(
        *entries.borrow(),
        vec![
            ("first", Event::Close),
            ("first", Event::PreDestroy),
            ("second", Event::Close),
            ("second", Event::PreDestroy),
        ]
    );
}

#[test]
fn closing_one_of_two_keeps_the_loop_running() {
    let (_host, app) = setup();
    let first = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    let second = MainWindow::new(&app, &MainWindow::builder()).unwrap();

    first.post_close().unwrap();
    // Only the first close is queued: the loop drains it and then finds
    // nothing else, so no quit was posted.
    assert!(matches!(app.run(), Err(Error::Retrieval(_))));
    assert_eq!(app.live_windows(), 1);

    second.destroy();
    assert_eq!(app.run().unwrap(), 0);
}

#[test]
fn main_window_tree_tears_down_with_the_root() {
    let (host, app) = setup();
    let root = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    let panel = Window::new(&app, Some(&root), "STATIC", &WindowBuilder::child(), PlainWindow)
        .unwrap();
    let button = Window::new(&app, Some(&panel), "BUTTON", &WindowBuilder::child(), PlainWindow)
        .unwrap();
    let label = Window::new(&app, Some(&root), "STATIC", &WindowBuilder::child(), PlainWindow)
        .unwrap();

    assert_eq!(panel.child_id(), Some(0));
    assert_eq!(label.child_id(), Some(1));
    assert_eq!(button.child_id(), Some(0));

    root.post_close().unwrap();
    assert_eq!(root.main_loop().unwrap(), 0);

    for w in [&panel, &button, &label] {
        assert!(!w.is_live());
    }
    assert_eq!(host.window_count(), 0);
}

#[test]
fn second_registration_is_skipped() {
    let (host, app) = setup();
    let a = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    let b = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    assert!(a.is_live() && b.is_live());
    assert_eq!(host.registrations().len(), 1);
}

#[test]
fn moved_wrapper_owns_and_dispatches() {
    let (host, app) = setup();
    let entries = Rc::new(RefCell::new(Vec::new()));
    let mut a = MainWindow::with_handler(
        &app,
        &MainWindow::builder(),
        Log {
            name: "a",
            entries: entries.clone(),
        },
    )
    .unwrap();
    let mut b = MainWindow::with_handler(
        &app,
        &MainWindow::builder(),
        Log {
            name: "b",
            entries: entries.clone(),
        },
    )
    .unwrap();
    let ha = a.handle().unwrap();

    b.move_from(&mut a).unwrap();
    entries.borrow_mut().clear();

    a.destroy();
    assert!(host.is_window(ha));
    assert!(entries.borrow().is_empty());

    b.post_close().unwrap();
    assert_eq!(app.run().unwrap(), 0);
    assert_eq!(
        *entries.borrow(),
        vec![("b", Event::Close), ("b", Event::PreDestroy)]
    );
}

#[test]
fn failed_move_leaves_both_wrappers_alone() {
    let (host, app) = setup();
    let mut a = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    let mut b = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    let (ha, hb) = (a.handle().unwrap(), b.handle().unwrap());

    host.inject(Fault::SetUserData);
    assert!(matches!(b.move_from(&mut a), Err(Error::Move(_))));
    assert_eq!((a.handle(), b.handle()), (Some(ha), Some(hb)));
    assert_eq!(app.live_windows(), 2);
}

#[test]
fn posting_fails_for_empty_wrapper() {
    let (_host, app) = setup();
    let w = MainWindow::new(&app, &MainWindow::builder()).unwrap();
    w.destroy();
    assert_eq!(w.post_close(), Err(HostError::INVALID_WINDOW_HANDLE));
}

#[test]
fn each_app_keeps_its_own_windows() {
    let (_host_a, app_a) = setup();
    let first = MainWindow::new(&app_a, &MainWindow::builder()).unwrap();

    // A second desktop hands out the same handle values.
    let (_host_b, app_b) = setup();
    let second = MainWindow::builder().exit_code(5).build(&app_b).unwrap();
    assert_eq!(first.handle(), second.handle());

    first.destroy();
    assert_eq!(app_a.live_windows(), 0);
    assert_eq!(app_b.live_windows(), 1);
    assert!(second.is_live());
    assert_eq!(app_a.run().unwrap(), 0);

    second.post_close().unwrap();
    assert_eq!(app_b.run().unwrap(), 5);
    assert!(!second.is_live());
}

#[test]
fn apps_sharing_a_host_register_and_count_separately() {
    let (host, app_a) = setup();
    let app_b = App::with_host(host.clone());

    let a = MainWindow::new(&app_a, &MainWindow::builder()).unwrap();
    let b = MainWindow::new(&app_b, &MainWindow::builder()).unwrap();
    assert_eq!(host.registrations().len(), 2);
    assert_eq!((app_a.live_windows(), app_b.live_windows()), (1, 1));

    b.post_close().unwrap();
    assert_eq!(app_b.run().unwrap(), 0);
    assert!(!b.is_live());
    assert!(a.is_live());
    assert_eq!((app_a.live_windows(), app_b.live_windows()), (1, 0));
}
