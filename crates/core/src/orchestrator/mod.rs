//! Per-frame driver tying input, beat tracking, the animation clock and the
//! external display and renderer together.

use crate::{
    Action, AnimationClock, AppConfig, BeatTracker, DisplayBackend, DisplayState, HeldKeys,
    InputEvent, InputFrame, InputSource, KeyBindings, Renderer, Result, SelectionState, Size,
    SurfaceHandle, TimeSource, TimedEvent,
};

/// Lifecycle of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Running,
    ShuttingDown,
    Terminated,
}

/// Owns every piece of show state and drives one frame at a time.
///
/// All input queued for a frame is applied in arrival order before the
/// clock advances, and the clock advances before anything is drawn.
pub struct FrameOrchestrator<D, R> {
    display: D,
    renderer: R,
    state: RunState,
    beat: BeatTracker,
    clock: AnimationClock,
    selection: SelectionState,
    bindings: KeyBindings,
    display_state: DisplayState,
    title: String,
    surface: Option<SurfaceHandle>,
    frames: u64,
}

impl<D: DisplayBackend, R: Renderer> FrameOrchestrator<D, R> {
    pub fn new(config: &AppConfig, display: D, renderer: R) -> Self {
        let mut display_state = DisplayState::new(&config.display);
        if config.display.start_fullscreen {
            display_state.toggle_fullscreen();
        }

        Self {
            display,
            renderer,
            state: RunState::Initializing,
            beat: BeatTracker::new(&config.beat),
            clock: AnimationClock::new(0.0),
            selection: SelectionState::new(),
            bindings: config.keys.clone(),
            display_state,
            title: config.display.title.clone(),
            surface: None,
            frames: 0,
        }
    }

    /// Acquires the display surface and starts the clock at `now`.
    ///
    /// A failure here is fatal: the orchestrator stays in
    /// [`RunState::Initializing`] and the error is returned.
    pub fn init(&mut self, now: f64) -> Result<()> {
        let native = self.display.native_resolution()?;
        self.display_state.set_native(native);
        self.display.set_title(&self.title);

        if let Err(err) = self.acquire_surface() {
            tracing::error!(%err, "could not acquire display surface");
            return Err(err);
        }

        self.clock = AnimationClock::new(now);
        self.state = RunState::Running;
        tracing::info!(
            native_width = native.width,
            native_height = native.height,
            "show running"
        );
        Ok(())
    }

    /// Processes one frame worth of input and draws it.
    pub fn frame(&mut self, now: f64, input: InputFrame) -> Result<()> {
        if self.state != RunState::Running {
            return Ok(());
        }

        for TimedEvent { at, event } in input.events {
            self.handle_event(at.min(now), event)?;
            if self.state != RunState::Running {
                return Ok(());
            }
        }

        self.advance(now, &input.held);
        self.render()?;
        self.frames += 1;
        Ok(())
    }

    /// Releases the display once a quit was requested.
    pub fn shutdown(&mut self) {
        if self.state == RunState::Terminated {
            return;
        }
        self.state = RunState::ShuttingDown;
        self.display.release();
        self.surface = None;
        self.state = RunState::Terminated;
        tracing::info!(frames = self.frames, "show terminated");
    }

    /// Runs frames until the input asks to quit, then shuts down.
    pub fn run<I, T>(&mut self, input: &mut I, time: &mut T) -> Result<()>
    where
        I: InputSource,
        T: TimeSource,
    {
        self.init(time.now())?;
        while self.state == RunState::Running {
            let now = time.now();
            let frame = input.poll(now);
            if let Err(err) = self.frame(now, frame) {
                self.shutdown();
                return Err(err);
            }
        }
        self.shutdown();
        Ok(())
    }

    fn handle_event(&mut self, now: f64, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::Quit => self.request_quit(),
            InputEvent::Resize { width, height } => {
                self.display_state.resize(Size::new(width, height));
                self.acquire_surface()?;
            }
            InputEvent::KeyDown { key, scancode } => {
                let action = self
                    .selection
                    .on_discrete_key(&self.bindings, key, scancode);
                if let Some(action) = action {
                    self.apply_action(now, action)?;
                }
            }
        }
        Ok(())
    }

    fn apply_action(&mut self, now: f64, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.request_quit(),
            Action::Tap => {
                self.beat.record_tap(now);
            }
            Action::ScaleTempo { factor } => self.beat.scale_period(factor),
            Action::ManualReverse => self.clock.manual_reverse(now),
            Action::ToggleFullscreen => {
                self.display_state.toggle_fullscreen();
                self.acquire_surface()?;
            }
            Action::RefreshDisplay => self.acquire_surface()?,
            Action::SetMood { .. } | Action::SetPattern { .. } | Action::NoOp => {}
        }
        Ok(())
    }

    fn request_quit(&mut self) {
        tracing::info!("quit requested");
        self.state = RunState::ShuttingDown;
    }

    fn advance(&mut self, now: f64, held: &HeldKeys) {
        let period = self.beat.estimate_period();
        self.beat.check_staleness(now, period);
        let modifiers = self.bindings.speed_modifiers(held);
        self.clock.advance(now, period, modifiers);
        self.selection.poll_effect(&self.bindings, held);
    }

    fn render(&mut self) -> Result<()> {
        let Some(surface) = self.surface else {
            return Ok(());
        };

        self.renderer.clear(&surface);
        self.renderer.draw_pattern(
            &surface,
            self.selection.active_pattern(),
            self.clock.primary_phase(),
            self.selection.active_mood(),
        );

        let effect = self.selection.active_effect();
        if effect.clears_pattern() {
            self.renderer.clear(&surface);
        }
        if let Some(overlay) = effect.overlay() {
            self.renderer
                .apply_effect(&surface, overlay, self.clock.secondary_phase());
        }

        self.display.present_frame()
    }

    fn acquire_surface(&mut self) -> Result<()> {
        let (size, mode) = self.display_state.target();
        let surface = self.display.acquire_surface(size, mode)?;
        tracing::info!(
            width = size.width,
            height = size.height,
            ?mode,
            "display surface acquired"
        );
        self.surface = Some(surface);
        Ok(())
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn beat(&self) -> &BeatTracker {
        &self.beat
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn display_state(&self) -> &DisplayState {
        &self.display_state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        selection::{Mood, Overlay, Pattern},
        Direction, DisplayMode, FixedStepClock, Key, KeyId, LightError, NamedKey, ScriptEntry,
        ScriptStep, ScriptedInput,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear,
        Pattern(Pattern, f64, Mood),
        Effect(Overlay, f64),
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<Call>,
    }

    impl Renderer for RecordingRenderer {
        fn clear(&mut self, _surface: &SurfaceHandle) {
            self.calls.push(Call::Clear);
        }

        fn draw_pattern(
            &mut self,
            _surface: &SurfaceHandle,
            pattern: Pattern,
            phase: f64,
            mood: Mood,
        ) {
            self.calls.push(Call::Pattern(pattern, phase, mood));
        }

        fn apply_effect(&mut self, _surface: &SurfaceHandle, overlay: Overlay, phase: f64) {
            self.calls.push(Call::Effect(overlay, phase));
        }
    }

    #[derive(Default)]
    struct FakeDisplay {
        fail: bool,
        title: Option<String>,
        acquired: Vec<(Size, DisplayMode)>,
        presented: usize,
        released: bool,
    }

    impl DisplayBackend for FakeDisplay {
        fn native_resolution(&mut self) -> Result<Size> {
            Ok(Size::new(1920, 1080))
        }

        fn set_title(&mut self, title: &str) {
            self.title = Some(title.to_string());
        }

        fn acquire_surface(&mut self, size: Size, mode: DisplayMode) -> Result<SurfaceHandle> {
            if self.fail {
                return Err(LightError::display("no screen attached"));
            }
            self.acquired.push((size, mode));
            Ok(SurfaceHandle { size, mode })
        }

        fn present_frame(&mut self) -> Result<()> {
            self.presented += 1;
            Ok(())
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    type Show = FrameOrchestrator<FakeDisplay, RecordingRenderer>;

    fn running_show() -> Show {
        let mut show = Show::new(
            &AppConfig::default(),
            FakeDisplay::default(),
            RecordingRenderer::default(),
        );
        show.init(0.0).unwrap();
        show
    }

    fn key(named: NamedKey) -> InputEvent {
        InputEvent::KeyDown {
            key: Key::Named(named),
            scancode: 0,
        }
    }

    fn scan(scancode: u32) -> InputEvent {
        InputEvent::KeyDown {
            key: Key::Other(scancode),
            scancode,
        }
    }

    fn events(now: f64, events: Vec<InputEvent>) -> InputFrame {
        InputFrame {
            events: events
                .into_iter()
                .map(|event| TimedEvent::new(now, event))
                .collect(),
            held: HeldKeys::default(),
        }
    }

    #[test]
    fn init_acquires_resizable_window() {
        let show = running_show();
        assert_eq!(show.state(), RunState::Running);
        assert_eq!(show.display().title.as_deref(), Some("Beamlight"));
        assert_eq!(
            show.display().acquired,
            vec![(Size::new(960, 540), DisplayMode::Resizable)]
        );
    }

    #[test]
    fn can_start_in_fullscreen() {
        let mut config = AppConfig::default();
        config.display.start_fullscreen = true;
        config.display.title = "Club Night".to_string();
        let mut show = Show::new(&config, FakeDisplay::default(), RecordingRenderer::default());
        show.init(0.0).unwrap();

        assert_eq!(show.display().title.as_deref(), Some("Club Night"));
        assert_eq!(
            show.display().acquired,
            vec![(Size::new(1920, 1080), DisplayMode::Fullscreen)]
        );

        show.frame(0.1, events(0.1, vec![key(NamedKey::F11)])).unwrap();
        assert_eq!(
            show.display().acquired[1],
            (Size::new(960, 540), DisplayMode::Resizable)
        );
    }

    #[test]
    fn failed_acquisition_stays_initializing() {
        let display = FakeDisplay {
            fail: true,
            ..Default::default()
        };
        let mut show = Show::new(&AppConfig::default(), display, RecordingRenderer::default());

        assert!(show.init(0.0).is_err());
        assert_eq!(show.state(), RunState::Initializing);

        show.frame(1.0, events(1.0, vec![])).unwrap();
        assert_eq!(show.frames(), 0);
    }

    #[test]
    fn frame_draws_pattern_then_presents() {
        let mut show = running_show();
        show.frame(0.5, events(0.5, vec![])).unwrap();

        let calls = &show.renderer().calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Clear);
        assert_eq!(calls[1], Call::Pattern(Pattern::PointCircle, 0.1, Mood::Gray));
        assert_eq!(show.display().presented, 1);
    }

    #[test]
    fn taps_in_a_frame_apply_before_the_clock() {
        let mut show = running_show();
        show.frame(1.0, events(1.0, vec![key(NamedKey::Return)])).unwrap();
        show.frame(1.5, events(1.5, vec![key(NamedKey::Return)])).unwrap();

        assert_eq!(show.beat().taps(), &[0.5]);
        // Three boundaries of the new 0.5s period were crossed by t=1.5.
        assert_eq!(show.clock().direction(), Direction::Backward);
        let expected = crate::clock::wrap_unit(1.0 / 5.0 - 0.5 / 0.5);
        assert!((show.clock().primary_phase() - expected).abs() < 1e-9);
    }

    #[test]
    fn taps_within_one_frame_keep_their_arrival_times() {
        let mut show = running_show();
        let input = InputFrame {
            events: [1.0, 1.5, 2.0]
                .into_iter()
                .map(|at| TimedEvent::new(at, key(NamedKey::Return)))
                .collect(),
            held: HeldKeys::default(),
        };
        show.frame(2.0, input).unwrap();

        assert_eq!(show.beat().taps(), &[0.5, 0.5]);
        assert!(show.beat().is_sequence_valid());
        assert!((show.beat().estimate_period() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn late_stamped_events_are_clamped_to_the_frame() {
        let mut show = running_show();
        show.frame(1.0, events(1.0, vec![key(NamedKey::Return)])).unwrap();
        show.frame(1.5, events(1.7, vec![key(NamedKey::Return)])).unwrap();

        assert_eq!(show.beat().last_tap(), Some(1.5));
        assert_eq!(show.beat().taps(), &[0.5]);
    }

    #[test]
    fn selection_keys_change_what_is_drawn() {
        let mut show = running_show();
        show.frame(0.1, events(0.1, vec![scan(25), scan(41)])).unwrap();

        let last = show.renderer().calls.last().cloned();
        assert!(matches!(
            last,
            Some(Call::Pattern(Pattern::DoubleWave, _, Mood::Fire))
        ));
    }

    #[test]
    fn held_effect_uses_secondary_phase() {
        let mut show = running_show();
        let held: HeldKeys = [KeyId::Scancode(52)].into_iter().collect();
        show.frame(1.0, InputFrame { events: vec![], held }).unwrap();

        let calls = &show.renderer().calls;
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], Call::Clear);
        assert_eq!(calls[3], Call::Effect(Overlay::Wave, 1.0 / 20.0));
    }

    #[test]
    fn blackout_clears_without_overlay() {
        let mut show = running_show();
        let held: HeldKeys = [KeyId::Scancode(56)].into_iter().collect();
        show.frame(1.0, InputFrame { events: vec![], held }).unwrap();

        let calls = &show.renderer().calls;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2], Call::Clear);
    }

    #[test]
    fn tempo_keys_rescale_the_estimate() {
        let mut show = running_show();
        show.frame(0.1, events(0.1, vec![scan(20)])).unwrap();
        assert!((show.beat().estimate_period() - 10.0).abs() < 1e-12);

        show.frame(0.2, events(0.2, vec![scan(61), scan(61)])).unwrap();
        assert!((show.beat().estimate_period() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn manual_reverse_flips_immediately() {
        let mut show = running_show();
        show.frame(1.0, events(1.0, vec![key(NamedKey::Tab)])).unwrap();

        assert_eq!(show.clock().direction(), Direction::Backward);
        assert!((show.clock().next_beat_boundary(5.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn fullscreen_toggle_uses_native_resolution() {
        let mut show = running_show();
        show.frame(0.1, events(0.1, vec![InputEvent::Resize { width: 800, height: 600 }]))
            .unwrap();
        show.frame(0.2, events(0.2, vec![key(NamedKey::F11)])).unwrap();
        show.frame(0.3, events(0.3, vec![key(NamedKey::F11)])).unwrap();

        let acquired = &show.display().acquired;
        assert_eq!(acquired[1], (Size::new(800, 600), DisplayMode::Resizable));
        assert_eq!(acquired[2], (Size::new(1920, 1080), DisplayMode::Fullscreen));
        assert_eq!(acquired[3], (Size::new(800, 600), DisplayMode::Resizable));
    }

    #[test]
    fn escape_stops_the_frame_and_shutdown_releases() {
        let mut show = running_show();
        show.frame(0.1, events(0.1, vec![key(NamedKey::Escape), scan(25)]))
            .unwrap();

        assert_eq!(show.state(), RunState::ShuttingDown);
        assert_eq!(show.selection().active_mood(), Mood::Gray);
        assert!(show.renderer().calls.is_empty());

        show.shutdown();
        assert_eq!(show.state(), RunState::Terminated);
        assert!(show.display().released);
    }

    #[test]
    fn stale_session_is_suspended_during_frames() {
        let mut show = running_show();
        show.frame(0.0, events(0.0, vec![key(NamedKey::Return)])).unwrap();
        show.frame(0.5, events(0.5, vec![key(NamedKey::Return)])).unwrap();
        assert_eq!(show.beat().last_tap(), Some(0.5));

        show.frame(1.4, events(1.4, vec![])).unwrap();
        assert_eq!(show.beat().last_tap(), Some(0.5));

        show.frame(1.6, events(1.6, vec![])).unwrap();
        assert_eq!(show.beat().last_tap(), None);
        assert_eq!(show.beat().taps(), &[0.5]);
    }

    #[test]
    fn run_plays_a_script_until_quit() {
        let tap = |at: f64| ScriptEntry {
            at,
            step: ScriptStep::Event(key(NamedKey::Return)),
        };
        let mut input = ScriptedInput::new(vec![tap(0.5), tap(1.0), tap(1.5)], 3.0);
        let mut time = FixedStepClock::from_fps(8.0);
        let mut show = Show::new(
            &AppConfig::default(),
            FakeDisplay::default(),
            RecordingRenderer::default(),
        );

        show.run(&mut input, &mut time).unwrap();

        assert_eq!(show.state(), RunState::Terminated);
        assert_eq!(show.beat().taps(), &[0.5, 0.5]);
        assert!(show.display().released);
        assert!(show.frames() > 20);
    }
}
