use serde::{Deserialize, Serialize};

use crate::{
    selection::{Effect, Mood, Pattern},
    HeldKeys, LightError, Result, SpeedModifiers,
};

/// Keys that are identified by meaning rather than by physical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedKey {
    Escape,
    Return,
    Tab,
    Space,
    F5,
    F11,
    CapsLock,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
    AltGr,
}

/// Layout-dependent key reported alongside a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Named(NamedKey),
    Char(char),
    Other(u32),
}

/// Trigger of a binding and member of the held-key set.
///
/// Scancodes name physical positions so that mood and pattern rows stay in
/// place regardless of the keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyId {
    Named(NamedKey),
    Scancode(u32),
}

impl KeyId {
    /// Whether a key press reported as `key`/`scancode` triggers this id.
    pub fn matches(&self, key: Key, scancode: u32) -> bool {
        match *self {
            Self::Named(named) => key == Key::Named(named),
            Self::Scancode(code) => code == scancode,
        }
    }
}

/// Operation requested by a discrete key press.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Quit,
    Tap,
    ManualReverse,
    ToggleFullscreen,
    RefreshDisplay,
    ScaleTempo { factor: f64 },
    SetMood { mood: Mood },
    SetPattern { pattern: Pattern },
    NoOp,
}

/// Binds a discrete key press to an [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: KeyId,
    pub action: Action,
}

impl KeyBinding {
    pub fn new(key: KeyId, action: Action) -> Self {
        Self { key, action }
    }
}

/// Binds a held key to an overlay effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectBinding {
    pub key: KeyId,
    pub effect: Effect,
}

/// Held keys that bend the animation speed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedBindings {
    pub slow: Vec<KeyId>,
    pub fast: Vec<KeyId>,
    pub faster: Vec<KeyId>,
    pub freeze: Vec<KeyId>,
}

impl Default for SpeedBindings {
    fn default() -> Self {
        Self {
            slow: vec![KeyId::Named(NamedKey::AltGr), KeyId::Named(NamedKey::CapsLock)],
            fast: vec![KeyId::Named(NamedKey::LeftShift)],
            faster: vec![KeyId::Named(NamedKey::LeftCtrl)],
            freeze: vec![KeyId::Named(NamedKey::LeftAlt)],
        }
    }
}

const MOOD_ROW_START: u32 = 24;
const PATTERN_ROW_START: u32 = 38;
const EFFECT_ROW_START: u32 = 52;

/// Complete key table. Discrete bindings are scanned in order and the
/// first match wins; effect bindings are listed highest priority first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub discrete: Vec<KeyBinding>,
    pub effects: Vec<EffectBinding>,
    pub speed: SpeedBindings,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut discrete = vec![
            KeyBinding::new(KeyId::Named(NamedKey::Escape), Action::Quit),
            KeyBinding::new(KeyId::Named(NamedKey::F11), Action::ToggleFullscreen),
            KeyBinding::new(KeyId::Named(NamedKey::F5), Action::RefreshDisplay),
            KeyBinding::new(KeyId::Named(NamedKey::Return), Action::Tap),
            KeyBinding::new(KeyId::Named(NamedKey::Tab), Action::ManualReverse),
            // "-" on US layouts, "ß" on German ones
            KeyBinding::new(KeyId::Scancode(20), Action::ScaleTempo { factor: 2.0 }),
            KeyBinding::new(KeyId::Scancode(61), Action::ScaleTempo { factor: 0.5 }),
        ];

        discrete.extend(Mood::ALL.iter().zip(MOOD_ROW_START..).map(|(&mood, code)| {
            KeyBinding::new(KeyId::Scancode(code), Action::SetMood { mood })
        }));
        discrete.extend(
            Pattern::ALL
                .iter()
                .zip(PATTERN_ROW_START..)
                .map(|(&pattern, code)| {
                    KeyBinding::new(KeyId::Scancode(code), Action::SetPattern { pattern })
                }),
        );
        discrete.push(KeyBinding::new(KeyId::Scancode(51), Action::NoOp));

        let mut effects = vec![EffectBinding {
            key: KeyId::Named(NamedKey::Space),
            effect: Effect::Flash,
        }];
        effects.extend(
            [
                Effect::WaveOnBlack,
                Effect::Wave,
                Effect::SnowOnBlack,
                Effect::Snow,
                Effect::Blackout,
            ]
            .into_iter()
            .zip(EFFECT_ROW_START..)
            .map(|(effect, code)| EffectBinding {
                key: KeyId::Scancode(code),
                effect,
            }),
        );

        Self {
            discrete,
            effects,
            speed: SpeedBindings::default(),
        }
    }
}

impl KeyBindings {
    /// Looks up the action bound to a key press.
    pub fn resolve(&self, key: Key, scancode: u32) -> Option<Action> {
        self.discrete
            .iter()
            .find(|binding| binding.key.matches(key, scancode))
            .map(|binding| binding.action)
    }

    /// Highest priority effect whose key is currently held.
    pub fn held_effect(&self, held: &HeldKeys) -> Effect {
        self.effects
            .iter()
            .find(|binding| held.contains(binding.key))
            .map(|binding| binding.effect)
            .unwrap_or_default()
    }

    pub fn speed_modifiers(&self, held: &HeldKeys) -> SpeedModifiers {
        let any = |keys: &[KeyId]| keys.iter().any(|key| held.contains(*key));
        SpeedModifiers {
            slow: any(self.speed.slow.as_slice()),
            fast: any(self.speed.fast.as_slice()),
            faster: any(self.speed.faster.as_slice()),
            freeze: any(self.speed.freeze.as_slice()),
        }
    }

    /// Rejects tables that could drive the beat period to zero or below.
    pub fn validate(&self) -> Result<()> {
        for binding in &self.discrete {
            if let Action::ScaleTempo { factor } = binding.action {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(LightError::invalid_config(format!(
                        "tempo factor {factor} bound to {:?} must be positive",
                        binding.key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[KeyId]) -> HeldKeys {
        keys.iter().copied().collect()
    }

    #[test]
    fn named_keys_resolve_before_scancodes() {
        let bindings = KeyBindings::default();
        // Named bindings come first in the table.
        let action = bindings.resolve(Key::Named(NamedKey::Return), 24);
        assert_eq!(action, Some(Action::Tap));
    }

    #[test]
    fn mood_and_pattern_rows_follow_scancodes() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.resolve(Key::Char('q'), 24),
            Some(Action::SetMood { mood: Mood::Gray })
        );
        assert_eq!(
            bindings.resolve(Key::Char('p'), 34),
            Some(Action::SetMood { mood: Mood::Cyan })
        );
        assert_eq!(
            bindings.resolve(Key::Char('a'), 38),
            Some(Action::SetPattern {
                pattern: Pattern::SingleCircle
            })
        );
        assert_eq!(
            bindings.resolve(Key::Other(0xe4), 48),
            Some(Action::SetPattern {
                pattern: Pattern::Snow
            })
        );
    }

    #[test]
    fn tempo_keys_scale_by_two_and_half() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.resolve(Key::Char('-'), 20),
            Some(Action::ScaleTempo { factor: 2.0 })
        );
        assert_eq!(
            bindings.resolve(Key::Char('\''), 61),
            Some(Action::ScaleTempo { factor: 0.5 })
        );
        assert_eq!(bindings.resolve(Key::Char('`'), 51), Some(Action::NoOp));
        assert_eq!(bindings.resolve(Key::Char('z'), 52), None);
    }

    #[test]
    fn held_effects_follow_priority() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.held_effect(&HeldKeys::default()), Effect::None);

        let keys = held(&[KeyId::Scancode(55), KeyId::Scancode(53)]);
        assert_eq!(bindings.held_effect(&keys), Effect::Wave);

        let keys = held(&[KeyId::Scancode(56), KeyId::Named(NamedKey::Space)]);
        assert_eq!(bindings.held_effect(&keys), Effect::Flash);

        let keys = held(&[KeyId::Scancode(56)]);
        assert_eq!(bindings.held_effect(&keys), Effect::Blackout);
    }

    #[test]
    fn speed_modifiers_read_held_keys() {
        let bindings = KeyBindings::default();
        let keys = held(&[
            KeyId::Named(NamedKey::CapsLock),
            KeyId::Named(NamedKey::LeftAlt),
        ]);
        let modifiers = bindings.speed_modifiers(&keys);

        assert!(modifiers.slow);
        assert!(!modifiers.fast);
        assert!(!modifiers.faster);
        assert!(modifiers.freeze);
    }

    #[test]
    fn rejects_non_positive_tempo_factor() {
        let mut bindings = KeyBindings::default();
        bindings.discrete.push(KeyBinding::new(
            KeyId::Scancode(99),
            Action::ScaleTempo { factor: 0.0 },
        ));
        assert!(bindings.validate().is_err());
        assert!(KeyBindings::default().validate().is_ok());
    }

    #[test]
    fn bindings_survive_json() {
        let bindings = KeyBindings::default();
        let json = serde_json::to_string(&bindings).unwrap();
        let parsed: KeyBindings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bindings);
    }

    #[test]
    fn partial_json_keeps_default_speed_keys() {
        let json = r#"{
            "discrete": [ { "key": { "named": "return" }, "action": "tap" } ]
        }"#;
        let parsed: KeyBindings = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.discrete.len(), 1);
        assert_eq!(parsed.speed, SpeedBindings::default());
        assert!(!parsed.effects.is_empty());
    }
}
