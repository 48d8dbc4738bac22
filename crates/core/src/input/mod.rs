use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{Key, KeyId, Result};

/// Discrete event delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    Quit,
    Resize { width: u32, height: u32 },
    KeyDown { key: Key, scancode: u32 },
}

/// Keys held down at the moment the input source was polled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    keys: BTreeSet<KeyId>,
}

impl HeldKeys {
    pub fn contains(&self, key: KeyId) -> bool {
        self.keys.contains(&key)
    }

    pub fn press(&mut self, key: KeyId) {
        self.keys.insert(key);
    }

    pub fn release(&mut self, key: KeyId) {
        self.keys.remove(&key);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<KeyId> for HeldKeys {
    fn from_iter<T: IntoIterator<Item = KeyId>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Event stamped with the time it arrived at the input source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub at: f64,
    pub event: InputEvent,
}

impl TimedEvent {
    pub fn new(at: f64, event: InputEvent) -> Self {
        Self { at, event }
    }
}

/// Everything the input source reports for one frame.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    /// Events queued since the previous poll, in arrival order.
    pub events: Vec<TimedEvent>,
    pub held: HeldKeys,
}

/// Producer of input, polled once per frame.
pub trait InputSource {
    fn poll(&mut self, now: f64) -> InputFrame;
}

/// What a script entry does when its time comes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Event(InputEvent),
    Hold(KeyId),
    Release(KeyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub at: f64,
    pub step: ScriptStep,
}

/// Replays a timed list of input steps and quits once `end` is reached.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    pending: VecDeque<ScriptEntry>,
    held: HeldKeys,
    end: f64,
    quit_sent: bool,
}

impl ScriptedInput {
    pub fn new(mut entries: Vec<ScriptEntry>, end: f64) -> Self {
        entries.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            pending: entries.into(),
            held: HeldKeys::default(),
            end,
            quit_sent: false,
        }
    }

    /// Parses a JSON array of [`ScriptEntry`] values.
    pub fn from_json(json: &str, end: f64) -> Result<Self> {
        let entries: Vec<ScriptEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries, end))
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, now: f64) -> InputFrame {
        let mut events = Vec::new();
        while let Some(entry) = self.pending.front() {
            if entry.at > now {
                break;
            }
            match entry.step {
                ScriptStep::Event(event) => events.push(TimedEvent::new(entry.at, event)),
                ScriptStep::Hold(key) => self.held.press(key),
                ScriptStep::Release(key) => self.held.release(key),
            }
            self.pending.pop_front();
        }

        if now >= self.end && !self.quit_sent {
            self.quit_sent = true;
            events.push(TimedEvent::new(now, InputEvent::Quit));
        }

        InputFrame {
            events,
            held: self.held.clone(),
        }
    }
}
