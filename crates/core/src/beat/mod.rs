use crate::BeatConfig;

/// Result of feeding a single tap into the [`BeatTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    /// No previous tap to measure against; the tap only arms the tracker.
    Armed,
    /// The gap since the previous tap was too large to be a tempo.
    GapTooLarge { delta: f64 },
    /// The gap was zero or negative and cannot describe a beat.
    NonPositive { delta: f64 },
    /// First confirmed delta of a new session; earlier taps were discarded.
    SessionStarted { delta: f64 },
    /// Delta appended to the running session.
    Accepted { delta: f64 },
}

/// Estimates the beat period from manually tapped timestamps.
///
/// The tracker keeps every delta of the current tapping session and uses
/// their arithmetic mean as the period. A session ends when the operator
/// stops tapping for longer than [`BeatConfig::stale_multiplier`] periods;
/// the next pair of taps then replaces the whole history.
#[derive(Debug, Clone)]
pub struct BeatTracker {
    taps: Vec<f64>,
    last_tap: Option<f64>,
    sequence_valid: bool,
    max_tap_gap: f64,
    stale_multiplier: f64,
}

impl BeatTracker {
    /// Creates a tracker seeded with the configured fallback period.
    pub fn new(config: &BeatConfig) -> Self {
        Self {
            taps: vec![config.initial_period],
            last_tap: None,
            sequence_valid: false,
            max_tap_gap: config.max_tap_gap,
            stale_multiplier: config.stale_multiplier,
        }
    }

    /// Records a tap at `now` (seconds).
    pub fn record_tap(&mut self, now: f64) -> TapOutcome {
        let outcome = match self.last_tap {
            None => {
                self.sequence_valid = false;
                tracing::debug!(now, "tap without a previous tap, waiting for a delta");
                TapOutcome::Armed
            }
            Some(last) => {
                let delta = now - last;
                if delta >= self.max_tap_gap {
                    tracing::debug!(
                        delta,
                        limit = self.max_tap_gap,
                        "tap gap exceeds limit, waiting for a new delta"
                    );
                    TapOutcome::GapTooLarge { delta }
                } else if delta <= 0.0 {
                    tracing::warn!(delta, "ignoring tap that does not advance time");
                    TapOutcome::NonPositive { delta }
                } else if !self.sequence_valid {
                    self.taps.clear();
                    self.taps.push(delta);
                    self.sequence_valid = true;
                    tracing::info!(delta, "new tap session, previous taps discarded");
                    TapOutcome::SessionStarted { delta }
                } else {
                    self.taps.push(delta);
                    tracing::debug!(
                        delta,
                        period = self.estimate_period(),
                        taps = self.taps.len(),
                        "tap accepted"
                    );
                    TapOutcome::Accepted { delta }
                }
            }
        };

        self.last_tap = Some(now);
        outcome
    }

    /// Mean of the recorded deltas.
    pub fn estimate_period(&self) -> f64 {
        self.taps.iter().sum::<f64>() / self.taps.len() as f64
    }

    /// Suspends the running session when no tap arrived for a while.
    ///
    /// Only the pending tap timestamp is cleared; the recorded deltas keep
    /// driving the clock until a new session replaces them. Returns `true`
    /// when the session was invalidated by this call.
    pub fn check_staleness(&mut self, now: f64, current_period: f64) -> bool {
        match self.last_tap {
            Some(last)
                if self.sequence_valid && now > last + self.stale_multiplier * current_period =>
            {
                self.last_tap = None;
                tracing::info!(now, last_tap = last, "tap session invalidated");
                true
            }
            _ => false,
        }
    }

    /// Multiplies every recorded delta by `factor`.
    pub fn scale_period(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            tracing::warn!(factor, "ignoring tempo scale factor");
            return;
        }
        for tap in &mut self.taps {
            *tap *= factor;
        }
        tracing::debug!(factor, period = self.estimate_period(), "tempo rescaled");
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn last_tap(&self) -> Option<f64> {
        self.last_tap
    }

    pub fn is_sequence_valid(&self) -> bool {
        self.sequence_valid
    }
}
