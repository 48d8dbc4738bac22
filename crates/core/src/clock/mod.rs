use std::time::Instant;

/// Number of beats covered by one cycle of the secondary (effect) phase.
pub const SECONDARY_CYCLE_BEATS: f64 = 4.0;

/// Sign applied to primary phase advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Held-key speed modifiers sampled once per frame.
///
/// They only change how fast the phases move, never when the beat
/// boundary flips the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeedModifiers {
    /// Doubles the period.
    pub slow: bool,
    /// Halves the period.
    pub fast: bool,
    /// Quarters the period.
    pub faster: bool,
    /// Stops both phases while held.
    pub freeze: bool,
}

impl SpeedModifiers {
    pub fn effective_period(&self, period: f64) -> f64 {
        let mut effective = period;
        if self.slow {
            effective *= 2.0;
        }
        if self.fast {
            effective /= 2.0;
        }
        if self.faster {
            effective /= 4.0;
        }
        effective
    }
}

/// Beat-locked animation phases.
///
/// The primary phase sweeps one unit per beat and bounces at every beat
/// boundary; the secondary phase always moves forward at a quarter of that
/// speed and drives overlay effects.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    primary_phase: f64,
    secondary_phase: f64,
    direction: Direction,
    beat_reference: f64,
    last_frame: f64,
}

impl AnimationClock {
    /// Creates a clock whose first beat and frame start at `now`.
    pub fn new(now: f64) -> Self {
        Self {
            primary_phase: 0.0,
            secondary_phase: 0.0,
            direction: Direction::Forward,
            beat_reference: now,
            last_frame: now,
        }
    }

    /// Advances both phases to `now` and returns how many beat boundaries
    /// were crossed since the previous frame.
    pub fn advance(&mut self, now: f64, period: f64, modifiers: SpeedModifiers) -> u64 {
        let elapsed = (now - self.last_frame).max(0.0);
        self.last_frame = now;

        if !period.is_finite() || period <= 0.0 {
            tracing::warn!(period, "skipping clock advance for unusable period");
            return 0;
        }

        let crossed = ((now - self.beat_reference) / period).floor();
        let flips = if crossed >= 1.0 {
            self.beat_reference += crossed * period;
            if crossed.rem_euclid(2.0) == 1.0 {
                self.direction = self.direction.flipped();
            }
            crossed as u64
        } else {
            0
        };

        if !modifiers.freeze {
            let effective = modifiers.effective_period(period);
            self.primary_phase =
                wrap_unit(self.primary_phase + self.direction.sign() * elapsed / effective);
            self.secondary_phase = wrap_unit(
                self.secondary_phase + elapsed / (effective * SECONDARY_CYCLE_BEATS),
            );
        }

        flips
    }

    /// Flips the direction immediately and restarts beat counting at `now`.
    pub fn manual_reverse(&mut self, now: f64) {
        self.direction = self.direction.flipped();
        self.beat_reference = now;
        tracing::debug!(now, direction = ?self.direction, "manual direction reverse");
    }

    /// Timestamp of the next direction flip for the given period.
    pub fn next_beat_boundary(&self, period: f64) -> f64 {
        self.beat_reference + period
    }

    pub fn primary_phase(&self) -> f64 {
        self.primary_phase
    }

    pub fn secondary_phase(&self) -> f64 {
        self.secondary_phase
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_frame(&self) -> f64 {
        self.last_frame
    }
}

/// Wraps `value` into `[0, 1)`.
pub fn wrap_unit(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid rounds tiny negatives up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Source of frame timestamps in seconds.
pub trait TimeSource {
    fn now(&mut self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::start()
    }
}

impl TimeSource for SystemClock {
    fn now(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Deterministic clock that moves forward by a fixed step on every read.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    time_seconds: f64,
    step: f64,
}

impl FixedStepClock {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            time_seconds: start,
            step: step.max(0.0),
        }
    }

    pub fn from_fps(fps: f64) -> Self {
        let step = if fps > 0.0 { 1.0 / fps } else { 0.0 };
        Self::new(0.0, step)
    }
}

impl TimeSource for FixedStepClock {
    fn now(&mut self) -> f64 {
        let now = self.time_seconds;
        self.time_seconds += self.step;
        now
    }
}
