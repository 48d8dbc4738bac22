use serde::{Deserialize, Serialize};

use crate::{DisplayConfig, LightError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Windowed,
    Resizable,
    Fullscreen,
}

/// Surface acquired from a [`DisplayBackend`], passed to every draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub size: Size,
    pub mode: DisplayMode,
}

/// Window or screen the show is projected on.
pub trait DisplayBackend {
    fn native_resolution(&mut self) -> Result<Size>;
    /// Caption shown by the window manager while windowed.
    fn set_title(&mut self, title: &str);
    fn acquire_surface(&mut self, size: Size, mode: DisplayMode) -> Result<SurfaceHandle>;
    fn present_frame(&mut self) -> Result<()>;
    fn release(&mut self);
}

/// Window geometry bookkeeping across fullscreen toggles and resizes.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    size: Size,
    window_size: Size,
    native: Size,
    fullscreen: bool,
}

impl DisplayState {
    pub fn new(config: &DisplayConfig) -> Self {
        let size = Size::new(config.window_width, config.window_height);
        Self {
            size,
            window_size: size,
            native: size,
            fullscreen: false,
        }
    }

    pub fn set_native(&mut self, native: Size) {
        self.native = native;
        if self.fullscreen {
            self.size = native;
        }
    }

    /// Size and mode the surface should currently be acquired with.
    pub fn target(&self) -> (Size, DisplayMode) {
        if self.fullscreen {
            (self.native, DisplayMode::Fullscreen)
        } else {
            (self.size, DisplayMode::Resizable)
        }
    }

    /// Switches between window and fullscreen, remembering the window size.
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        if self.fullscreen {
            self.window_size = self.size;
            self.size = self.native;
        } else {
            self.size = self.window_size;
        }
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

/// Display that only logs what a real window would do.
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    native: Size,
    title: String,
    surface: Option<SurfaceHandle>,
    acquisitions: usize,
    presented: usize,
}

impl HeadlessDisplay {
    pub fn new(native: Size) -> Self {
        Self {
            native,
            title: String::new(),
            surface: None,
            acquisitions: 0,
            presented: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl DisplayBackend for HeadlessDisplay {
    fn native_resolution(&mut self) -> Result<Size> {
        Ok(self.native)
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        tracing::debug!(title, "headless window titled");
    }

    fn acquire_surface(&mut self, size: Size, mode: DisplayMode) -> Result<SurfaceHandle> {
        if size.is_empty() {
            return Err(LightError::display(format!(
                "cannot open a {}x{} surface",
                size.width, size.height
            )));
        }
        let surface = SurfaceHandle { size, mode };
        self.surface = Some(surface);
        self.acquisitions += 1;
        tracing::debug!(
            width = size.width,
            height = size.height,
            ?mode,
            "headless surface acquired"
        );
        Ok(surface)
    }

    fn present_frame(&mut self) -> Result<()> {
        if self.surface.is_none() {
            return Err(LightError::display("present without a surface"));
        }
        self.presented += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.surface = None;
        tracing::debug!(presented = self.presented, "headless surface released");
    }
}
