//! Core library for Beamlight, a beat-synced light show for projectors.
//!
//! The operator taps the beat on the keyboard; [`BeatTracker`] turns those
//! taps into a period, [`AnimationClock`] converts the period into phases
//! that bounce on every beat, and [`SelectionState`] tracks which pattern,
//! mood and effect are live. [`FrameOrchestrator`] runs the frame loop
//! against pluggable [`DisplayBackend`] and [`Renderer`] implementations.

pub mod beat;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod mapping;
pub mod orchestrator;
pub mod render;
pub mod selection;

pub use beat::{BeatTracker, TapOutcome};
pub use clock::{
    AnimationClock, Direction, FixedStepClock, SpeedModifiers, SystemClock, TimeSource,
};
pub use config::{AppConfig, BeatConfig, DisplayConfig};
pub use display::{
    DisplayBackend, DisplayMode, DisplayState, HeadlessDisplay, Size, SurfaceHandle,
};
pub use error::{LightError, Result};
pub use input::{
    HeldKeys, InputEvent, InputFrame, InputSource, ScriptEntry, ScriptStep, ScriptedInput,
    TimedEvent,
};
pub use mapping::{
    Action, EffectBinding, Key, KeyBinding, KeyBindings, KeyId, NamedKey, SpeedBindings,
};
pub use orchestrator::{FrameOrchestrator, RunState};
pub use render::{LogRenderer, Renderer};
pub use selection::{Effect, Mood, Overlay, Pattern, SelectionState};
