use crate::{
    selection::{Mood, Overlay, Pattern},
    SurfaceHandle,
};

/// Drawing backend. Implementations rasterise the patterns; the engine
/// only decides what to draw and with which phase.
pub trait Renderer {
    fn clear(&mut self, surface: &SurfaceHandle);
    fn draw_pattern(&mut self, surface: &SurfaceHandle, pattern: Pattern, phase: f64, mood: Mood);
    fn apply_effect(&mut self, surface: &SurfaceHandle, overlay: Overlay, phase: f64);
}

/// Renderer that traces every call instead of drawing.
#[derive(Debug, Default)]
pub struct LogRenderer {
    patterns_drawn: usize,
    overlays_drawn: usize,
    last_pattern: Option<(Pattern, Mood)>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patterns_drawn(&self) -> usize {
        self.patterns_drawn
    }

    pub fn overlays_drawn(&self) -> usize {
        self.overlays_drawn
    }

    pub fn last_pattern(&self) -> Option<(Pattern, Mood)> {
        self.last_pattern
    }
}

impl Renderer for LogRenderer {
    fn clear(&mut self, _surface: &SurfaceHandle) {
        tracing::trace!("clear");
    }

    fn draw_pattern(&mut self, _surface: &SurfaceHandle, pattern: Pattern, phase: f64, mood: Mood) {
        self.patterns_drawn += 1;
        if self.last_pattern != Some((pattern, mood)) {
            tracing::debug!(?pattern, ?mood, "pattern changed");
        }
        self.last_pattern = Some((pattern, mood));
        tracing::trace!(?pattern, ?mood, phase, "draw pattern");
    }

    fn apply_effect(&mut self, _surface: &SurfaceHandle, overlay: Overlay, phase: f64) {
        self.overlays_drawn += 1;
        tracing::trace!(?overlay, phase, "apply effect");
    }
}
