//! Data snapshots and the periodic/sweep divergence checks built on top of
//! them (`spec.md` §4.6).
//!
//! Ported from `DataTracker.{h,cpp}`. The original rotates two
//! pre-allocated, tape-sized buffers to avoid reallocating on every
//! snapshot; Rust's allocator makes that trick unnecessary, so each
//! snapshot here just clones the visited slice of the tape it was taken
//! from. The comparison predicates are otherwise a direct port.

use crate::tape::DataTape;

/// A copy of tape state taken at one sampling boundary.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Copy of the full tape contents at capture time.
    data: Vec<i64>,
    head: usize,
    min_visited: usize,
    max_visited: usize,
    min_bound: usize,
    max_bound: usize,
}

impl Snapshot {
    fn capture(tape: &DataTape) -> Self {
        Self {
            data: tape.data().to_vec(),
            head: tape.head(),
            min_visited: tape.min_visited(),
            max_visited: tape.max_visited(),
            min_bound: tape.min_bound(),
            max_bound: tape.max_bound(),
        }
    }

    fn at(&self, idx: usize) -> i64 {
        self.data.get(idx).copied().unwrap_or(0)
    }
}

/// Outcome of comparing the current tape against the newest snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareResult {
    /// No visited cell changed value.
    Unchanged,
    /// Some cell changed but none moved strictly away from zero.
    Diverging,
    /// At least one visited cell moved strictly away from zero.
    Impactful,
}

/// `true` when `old -> new` is a change that could feed an unbounded growth:
/// sign-preserving and moving away from zero (`DataTracker.h`'s
/// `IMPACTFUL_CHANGE`).
fn impactful_change(old: i64, new: i64) -> bool {
    (old <= 0 && new > old) || (old >= 0 && new < old)
}

/// Sweep variant: strict sign (no zero boundary), used by
/// `sweep_hang_detected` (`IMPACTFUL_SWEEP_CHANGE`).
fn impactful_sweep_change(old: i64, new: i64) -> bool {
    (old < 0 && new > old) || (old > 0 && new < old)
}

/// Rolling pair of snapshots plus the comparison logic for the periodic and
/// regular-sweep hang detectors.
#[derive(Clone, Debug, Default)]
pub struct DataTracker {
    old: Option<Snapshot>,
    new: Option<Snapshot>,
}

impl DataTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a fresh snapshot, rotating the previous "new" into "old".
    pub fn capture(&mut self, tape: &mut DataTape) {
        let snap = Snapshot::capture(tape);
        self.old = self.new.take();
        self.new = Some(snap);
        tape.reset_visited_bounds();
    }

    pub fn clear(&mut self) {
        self.old = None;
        self.new = None;
    }

    #[must_use]
    pub fn has_two_snapshots(&self) -> bool {
        self.old.is_some() && self.new.is_some()
    }

    /// Compares the tape's currently visited range against the newest
    /// snapshot.
    #[must_use]
    pub fn compare_to_snapshot(&self, tape: &DataTape) -> CompareResult {
        let Some(new) = &self.new else {
            return CompareResult::Unchanged;
        };
        let mut diverging = false;
        for idx in tape.min_visited()..=tape.max_visited() {
            let before = new.at(idx);
            let after = tape.data().get(idx).copied().unwrap_or(0);
            if before == after {
                continue;
            }
            if impactful_change(before, after) {
                return CompareResult::Impactful;
            }
            diverging = true;
        }
        if diverging {
            CompareResult::Diverging
        } else {
            CompareResult::Unchanged
        }
    }

    /// Periodic hang check: the change from `old -> new` must equal the
    /// change from `new -> current`, shifted by the same head movement,
    /// with every changed cell moving strictly away from zero and none of
    /// them crossing zero (`DataTracker.cpp::periodicHangDetected`).
    #[must_use]
    pub fn periodic_hang_detected(&self, tape: &DataTape) -> bool {
        let (Some(old), Some(new)) = (&self.old, &self.new) else {
            return false;
        };
        let shift = tape.head() as isize - new.head as isize;
        if shift != new.head as isize - old.head as isize {
            return false;
        }

        let lo = new.min_visited.min(tape.min_visited());
        let hi = new.max_visited.max(tape.max_visited());
        for idx in lo..=hi {
            let old_before = old.at(idx);
            let new_before = new.at(idx);
            let shifted_idx = idx as isize + shift;
            let new_after = if shifted_idx >= 0 {
                new.at(shifted_idx as usize)
            } else {
                0
            };
            let cur_after = tape.data().get(idx).copied().unwrap_or(0);

            let delta_old = new_before - old_before;
            let delta_new = cur_after - new_after;
            if delta_old != delta_new {
                return false;
            }
            if delta_old == 0 {
                continue;
            }
            // Neither endpoint may touch or cross zero, and movement must be
            // away from zero (sign of delta must match sign of the value).
            if old_before == 0 || new_before == 0 {
                return false;
            }
            if (old_before > 0) != (new_before > 0) {
                return false;
            }
            if !impactful_change(old_before, new_before) {
                return false;
            }
        }

        // Newly visited cells introduced by a head shift must have been zero
        // and must not be shadowed by further (possibly non-zero) unvisited
        // cells beyond the tape's known bounds.
        if shift > 0 {
            if tape.max_visited() < tape.max_bound() {
                return false;
            }
        } else if shift < 0 && tape.min_visited() > tape.min_bound() {
            return false;
        }

        true
    }

    /// Regular-sweep hang check. `mid` is the turning point recorded on the
    /// sweep's second reversal; its cell is allowed to show an "impactful
    /// sweep change" without failing the check (`RegularSweepHangDetector`'s
    /// contract, backed by `DataTracker.cpp::sweepHangDetected`).
    #[must_use]
    pub fn sweep_hang_detected(&self, tape: &DataTape, mid: Option<usize>) -> bool {
        let (Some(old), Some(new)) = (&self.old, &self.new) else {
            return false;
        };

        let check = |lo: usize, hi: usize, before: &dyn Fn(usize) -> i64, after: &dyn Fn(usize) -> i64| -> bool {
            for idx in lo..=hi {
                let b = before(idx);
                let a = after(idx);
                if b == a {
                    continue;
                }
                if Some(idx) == mid {
                    continue;
                }
                if impactful_sweep_change(b, a) {
                    return false;
                }
            }
            true
        };

        let old_ok = check(
            new.min_visited,
            new.max_visited,
            &|i| old.at(i),
            &|i| new.at(i),
        );
        if !old_ok {
            return false;
        }

        check(
            tape.min_visited(),
            tape.max_visited(),
            &|i| new.at(i),
            &|i| tape.data().get(i).copied().unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::DataTape;

    #[test]
    fn unchanged_tape_compares_unchanged() {
        let mut tape = DataTape::new(32, 8);
        let mut tracker = DataTracker::new();
        tracker.capture(&mut tape);
        assert_eq!(tracker.compare_to_snapshot(&tape), CompareResult::Unchanged);
    }

    #[test]
    fn growing_counter_is_periodic_hang() {
        let mut tape = DataTape::new(32, 8);
        let mut tracker = DataTracker::new();
        tape.inc();
        tracker.capture(&mut tape);
        tape.inc();
        tracker.capture(&mut tape);
        tape.inc();
        assert!(tracker.periodic_hang_detected(&tape));
    }

    #[test]
    fn oscillating_value_is_not_periodic_hang() {
        let mut tape = DataTape::new(32, 8);
        let mut tracker = DataTracker::new();
        tape.inc();
        tracker.capture(&mut tape);
        tape.dec();
        tracker.capture(&mut tape);
        tape.inc();
        assert!(!tracker.periodic_hang_detected(&tape));
    }
}
