//! Count interpolation.
//!
//! A [`CountRun`] is a resumable task: the driver feeds it one frame
//! timestamp at a time and writes the returned value, until the run reports
//! it has finished. The first timestamp a run sees becomes its start time.

use std::cell::Cell;
use std::rc::Rc;

/// Direction of travel of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `min -> max`
    Up,
    /// `max -> min`
    Down,
}

/// Normalised elapsed fraction, clamped to `[0, 1]`.
pub fn progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}

/// Value displayed at `progress`: `floor(progress * (to - from) + from)`.
///
/// The offset is floored on its own and added to `from` in integer space, so
/// both endpoints are exact for any pair of `i64` bounds and the result never
/// leaves `[min(from, to), max(from, to)]`.
pub fn interpolate(from: i64, to: i64, progress: f64) -> i64 {
    if progress >= 1.0 {
        return to;
    }
    if progress <= 0.0 {
        return from;
    }
    let span = i128::from(to) - i128::from(from);
    let offset = (progress * span as f64).floor() as i128;
    let value = (i128::from(from) + offset).clamp(
        i128::from(from.min(to)),
        i128::from(from.max(to)),
    );
    value as i64
}

/// Issues run tokens for one counter. Each issue supersedes every earlier
/// token from the same slot.
#[derive(Debug, Clone, Default)]
pub struct RunSlot {
    latest: Rc<Cell<u64>>,
}

impl RunSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RunToken {
        let generation = self.latest.get() + 1;
        self.latest.set(generation);
        RunToken {
            generation,
            latest: Rc::clone(&self.latest),
        }
    }
}

/// Ownership claim of a run on its counter's display.
#[derive(Debug, Clone)]
pub struct RunToken {
    generation: u64,
    latest: Rc<Cell<u64>>,
}

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer token has been issued from the same slot.
    pub fn is_current(&self) -> bool {
        self.latest.get() == self.generation
    }
}

/// Result of advancing a run by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountFrame {
    pub value: i64,
    pub finished: bool,
}

/// One animation from `from` to `to`.
#[derive(Debug, Clone)]
pub struct CountRun {
    from: i64,
    to: i64,
    duration_ms: f64,
    started_at: Option<f64>,
    token: RunToken,
}

impl CountRun {
    pub fn new(from: i64, to: i64, duration_ms: u64, token: RunToken) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms as f64,
            started_at: None,
            token,
        }
    }

    pub fn token(&self) -> &RunToken {
        &self.token
    }

    /// Whether this run still owns its counter's display.
    pub fn is_current(&self) -> bool {
        self.token.is_current()
    }

    /// Advance to `timestamp`. The first call fixes the start time.
    pub fn advance(&mut self, timestamp: f64) -> CountFrame {
        let started_at = *self.started_at.get_or_insert(timestamp);
        let progress = progress(timestamp - started_at, self.duration_ms);
        CountFrame {
            value: interpolate(self.from, self.to, progress),
            finished: progress >= 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(from: i64, to: i64, duration_ms: u64) -> CountRun {
        CountRun::new(from, to, duration_ms, RunSlot::new().issue())
    }

    #[test]
    fn counts_up_with_floor() {
        let mut r = run(0, 50, 100);
        let values: Vec<i64> = [1000.0, 1025.0, 1050.0, 1075.0, 1100.0]
            .iter()
            .map(|t| r.advance(*t).value)
            .collect();
        assert_eq!(values, vec![0, 12, 25, 37, 50]);
    }

    #[test]
    fn counts_down_with_floor() {
        let mut r = run(50, 0, 100);
        let values: Vec<i64> = [0.0, 25.0, 50.0, 75.0, 100.0]
            .iter()
            .map(|t| r.advance(*t).value)
            .collect();
        assert_eq!(values, vec![50, 37, 25, 12, 0]);
    }

    #[test]
    fn finishes_only_at_full_progress() {
        let mut r = run(0, 10, 100);
        assert!(!r.advance(0.0).finished);
        assert!(!r.advance(99.0).finished);
        let last = r.advance(250.0);
        assert!(last.finished);
        assert_eq!(last.value, 10);
    }

    #[test]
    fn negative_bounds_floor_towards_negative_infinity() {
        let mut r = run(0, -10, 100);
        r.advance(0.0);
        assert_eq!(r.advance(25.0).value, -3);
    }

    #[test]
    fn newer_tokens_supersede_older_ones() {
        let slot = RunSlot::new();
        let first = slot.issue();
        assert!(first.is_current());
        let second = slot.issue();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.generation(), 2);
    }

    #[test]
    fn extreme_bounds_stay_in_range() {
        let mut r = run(i64::MIN, i64::MAX, 100);
        assert_eq!(r.advance(0.0).value, i64::MIN);
        let mid = r.advance(50.0).value;
        assert!((-1024..=1024).contains(&mid), "midpoint {mid}");
        assert_eq!(r.advance(100.0).value, i64::MAX);

        let mut r = run(i64::MAX, i64::MIN, 100);
        assert_eq!(r.advance(0.0).value, i64::MAX);
        assert!(r.advance(99.0).value >= i64::MIN);
        assert_eq!(r.advance(100.0).value, i64::MIN);
    }

    #[test]
    fn first_value_is_exact_beyond_f64_precision() {
        let from = 9_007_199_254_740_993;
        let mut r = run(from, from + 2, 100);
        assert_eq!(r.advance(0.0).value, from);
        assert_eq!(r.advance(100.0).value, from + 2);
    }

    proptest! {
        #[test]
        fn final_value_is_exactly_to(
            from in any::<i64>(),
            to in any::<i64>(),
            duration in 1u64..10_000,
            start in 0u32..1_000_000,
        ) {
            let start = f64::from(start);
            let mut r = run(from, to, duration);
            r.advance(start);
            let last = r.advance(start + duration as f64);
            prop_assert!(last.finished);
            prop_assert_eq!(last.value, to);
        }

        #[test]
        fn values_follow_floor_law_and_are_monotonic(
            from in any::<i64>(),
            to in any::<i64>(),
            duration in 1u64..5_000,
            steps in proptest::collection::vec(0.0f64..1.0, 1..40),
        ) {
            let mut steps = steps;
            steps.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mut r = run(from, to, duration);
            let mut previous = r.advance(0.0).value;
            prop_assert_eq!(previous, from);
            for p in steps {
                let value = r.advance(p * duration as f64).value;
                let expected = interpolate(from, to, progress(p * duration as f64, duration as f64));
                prop_assert_eq!(value, expected);
                if to >= from {
                    prop_assert!(value >= previous);
                } else {
                    prop_assert!(value <= previous);
                }
                previous = value;
            }
        }
    }
}
