use std::collections::{btree_map::Entry, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::{Action, HeldKeys, Key, KeyBindings};

/// Drawing routine applied to the primary phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    SingleCircle,
    HorizontalLine,
    VerticalLine,
    DoubleWave,
    BonyHorizontalLine,
    #[default]
    PointCircle,
    PointCircleTen,
    RotatingBone,
    RotatingBones,
    RotatingBoneCircle,
    Snow,
}

impl Pattern {
    /// Patterns in keyboard row order.
    pub const ALL: [Pattern; 11] = [
        Pattern::SingleCircle,
        Pattern::HorizontalLine,
        Pattern::VerticalLine,
        Pattern::DoubleWave,
        Pattern::BonyHorizontalLine,
        Pattern::PointCircle,
        Pattern::PointCircleTen,
        Pattern::RotatingBone,
        Pattern::RotatingBones,
        Pattern::RotatingBoneCircle,
        Pattern::Snow,
    ];
}

/// Colour palette handed to the pattern renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Gray,
    Fire,
    Water,
    Green,
    Yellow,
    Pink,
    Red,
    BlueRed,
    YellowPink,
    Brown,
    Cyan,
}

impl Mood {
    /// Moods in keyboard row order.
    pub const ALL: [Mood; 11] = [
        Mood::Gray,
        Mood::Fire,
        Mood::Water,
        Mood::Green,
        Mood::Yellow,
        Mood::Pink,
        Mood::Red,
        Mood::BlueRed,
        Mood::YellowPink,
        Mood::Brown,
        Mood::Cyan,
    ];
}

/// Overlay drawn on top of the pattern with the secondary phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    Flash,
    Wave,
    Snowflakes,
}

/// Hold-activated effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    #[default]
    None,
    Flash,
    WaveOnBlack,
    Wave,
    SnowOnBlack,
    Snow,
    Blackout,
}

impl Effect {
    /// Whether the surface is cleared before the overlay is drawn.
    pub fn clears_pattern(self) -> bool {
        matches!(self, Self::WaveOnBlack | Self::SnowOnBlack | Self::Blackout)
    }

    pub fn overlay(self) -> Option<Overlay> {
        match self {
            Self::Flash => Some(Overlay::Flash),
            Self::WaveOnBlack | Self::Wave => Some(Overlay::Wave),
            Self::SnowOnBlack | Self::Snow => Some(Overlay::Snowflakes),
            Self::None | Self::Blackout => None,
        }
    }
}

/// Pattern, mood and effect currently shown on screen.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    active_pattern: Pattern,
    active_mood: Mood,
    active_effect: Effect,
    unrecognized: BTreeMap<u32, Key>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a key press against `bindings`.
    ///
    /// Mood and pattern actions are applied here; the resolved action is
    /// returned so the caller can run the ones that touch other subsystems.
    /// Unbound scancodes are remembered once, with the first key seen for
    /// them.
    pub fn on_discrete_key(
        &mut self,
        bindings: &KeyBindings,
        key: Key,
        scancode: u32,
    ) -> Option<Action> {
        let Some(action) = bindings.resolve(key, scancode) else {
            if let Entry::Vacant(entry) = self.unrecognized.entry(scancode) {
                tracing::debug!(scancode, ?key, "unbound key");
                entry.insert(key);
            }
            return None;
        };

        match action {
            Action::SetMood { mood } => self.active_mood = mood,
            Action::SetPattern { pattern } => self.active_pattern = pattern,
            _ => {}
        }
        Some(action)
    }

    /// Refreshes the active effect from the keys held this frame.
    pub fn poll_effect(&mut self, bindings: &KeyBindings, held: &HeldKeys) -> Effect {
        self.active_effect = bindings.held_effect(held);
        self.active_effect
    }

    pub fn active_pattern(&self) -> Pattern {
        self.active_pattern
    }

    pub fn active_mood(&self) -> Mood {
        self.active_mood
    }

    pub fn active_effect(&self) -> Effect {
        self.active_effect
    }

    /// Unbound scancodes seen so far, each with the first key reported for it.
    pub fn unrecognized(&self) -> &BTreeMap<u32, Key> {
        &self.unrecognized
    }
}
