use super::*;
use crate::style::{CW_USEDEFAULT, WS_CHILD, WS_OVERLAPPEDWINDOW, WS_VISIBLE};

/// Initial placement and appearance of a window, collected before creation.
#[derive(Clone, Debug)]
pub struct WindowBuilder {
    location: Vector2,
    size: Vector2,
    title: String,
    style: u32,
    ex_style: u32,
    exit_code: i32,
}

impl Default for WindowBuilder {
    /// A visible overlapped window, 640×480, placed by the platform.
    fn default() -> Self {
        Self {
            location: Vector2::new(CW_USEDEFAULT, CW_USEDEFAULT),
            size: Vector2::new(640, 480),
            title: "turtle".to_string(),
            style: WS_OVERLAPPEDWINDOW | WS_VISIBLE,
            ex_style: 0,
            exit_code: 0,
        }
    }
}

impl WindowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A visible child window at the parent's origin.
    pub fn child() -> Self {
        Self {
            location: Vector2::ZERO,
            title: String::new(),
            style: WS_CHILD | WS_VISIBLE,
            ..Self::default()
        }
    }

    pub fn location(&mut self, location: impl Into<Vector2>) -> &mut Self {
        self.location = location.into();
        self
    }

    pub fn size(&mut self, size: impl Into<Vector2>) -> &mut Self {
        self.size = size.into();
        self
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn style(&mut self, style: u32) -> &mut Self {
        self.style = style;
        self
    }

    pub fn ex_style(&mut self, ex_style: u32) -> &mut Self {
        self.ex_style = ex_style;
        self
    }

    /// Exit code the message loop returns if closing this top-level window
    /// leaves no other open.
    pub fn exit_code(&mut self, exit_code: i32) -> &mut Self {
        self.exit_code = exit_code;
        self
    }

    pub fn get_location(&self) -> Vector2 {
        self.location
    }

    pub fn get_size(&self) -> Vector2 {
        self.size
    }

    pub fn get_title(&self) -> &str {
        &self.title
    }

    pub fn get_style(&self) -> u32 {
        self.style
    }

    pub fn get_ex_style(&self) -> u32 {
        self.ex_style
    }

    pub fn get_exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn build(&self, app: &App) -> Result<MainWindow> {
        MainWindow::new(app, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let b = WindowBuilder::default();
        assert_eq!(b.get_location(), Vector2::new(CW_USEDEFAULT, CW_USEDEFAULT));
        assert_eq!(b.get_size(), Vector2::new(640, 480));
        assert_eq!(b.get_exit_code(), 0);
    }

    #[test]
    fn chained_setters() {
        let mut b = WindowBuilder::new();
        b.location((10, 20)).size(Vector2::new(300, 200)).title("hi").exit_code(3);
        assert_eq!(b.get_location(), Vector2::new(10, 20));
        assert_eq!(b.get_size(), Vector2::new(300, 200));
        assert_eq!(b.get_title(), "hi");
        assert_eq!(b.get_exit_code(), 3);
    }
}
