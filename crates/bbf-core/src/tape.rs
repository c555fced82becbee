//! The data tape: a fixed-size signed-integer array with a head pointer and
//! an append-only undo log (`spec.md` §3, §4.2).

use crate::trackers::{DeltaTracker, EffectiveOpTracker};

/// A point-in-time copy of the tape's two sample-period-local trackers, used
/// to roll them back across a search frame pop. See [`DataTape::tracker_snapshot`].
#[derive(Clone, Debug)]
pub struct TrackerSnapshot {
    effective: EffectiveOpTracker,
    delta: DeltaTracker,
}

/// Atoms recorded in the undo log, one per executed data step. Each is its
/// own inverse operation's tag: undoing an `Inc` is a decrement, etc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOp {
    Inc,
    Dec,
    Shr,
    Shl,
}

/// The head moved (or would move) outside the tape's hard capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataError;

/// Fixed-size signed tape plus head, visited/ever-touched bounds, and an
/// O(1)-undo log. Owns the two sample-period-local hang trackers (Hang-1,
/// Hang-2) since every mutation must feed both.
pub struct DataTape {
    data: Vec<i64>,
    head: usize,
    /// Inclusive range of cells ever visited (or whose value was ever
    /// non-zero) since the tape was created — `spec.md` §3's `[min_bound,
    /// max_bound]`. Monotonically expands for the life of one run.
    min_bound: usize,
    max_bound: usize,
    /// Inclusive range visited since the last `reset_visited_bounds` call
    /// (used by the snapshot tracker, `spec.md` §4.6).
    min_visited: usize,
    max_visited: usize,
    undo: Vec<UndoOp>,
    effective: EffectiveOpTracker,
    delta: DeltaTracker,
}

impl DataTape {
    #[must_use]
    pub fn new(size: usize, hang_sample_period: usize) -> Self {
        assert!(size >= 2, "tape must hold at least two cells");
        let head = size / 2;
        Self {
            data: vec![0; size],
            head,
            min_bound: head,
            max_bound: head,
            min_visited: head,
            max_visited: head,
            undo: Vec::with_capacity(hang_sample_period * 4),
            effective: EffectiveOpTracker::new(),
            delta: DeltaTracker::new(hang_sample_period),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub const fn head(&self) -> usize {
        self.head
    }

    #[must_use]
    pub fn val(&self) -> i64 {
        self.data[self.head]
    }

    #[must_use]
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    #[must_use]
    pub const fn min_bound(&self) -> usize {
        self.min_bound
    }

    #[must_use]
    pub const fn max_bound(&self) -> usize {
        self.max_bound
    }

    #[must_use]
    pub const fn min_visited(&self) -> usize {
        self.min_visited
    }

    #[must_use]
    pub const fn max_visited(&self) -> usize {
        self.max_visited
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    fn touch(&mut self) {
        self.min_bound = self.min_bound.min(self.head);
        self.max_bound = self.max_bound.max(self.head);
        self.min_visited = self.min_visited.min(self.head);
        self.max_visited = self.max_visited.max(self.head);
    }

    pub fn inc(&mut self) {
        self.data[self.head] += 1;
        self.undo.push(UndoOp::Dec);
        self.effective.record_inc();
        self.delta.note_value_change(self.data[self.head]);
        self.touch();
    }

    pub fn dec(&mut self) {
        self.data[self.head] -= 1;
        self.undo.push(UndoOp::Inc);
        self.effective.record_dec();
        self.delta.note_value_change(self.data[self.head]);
        self.touch();
    }

    /// Shift right. Fails (without moving the head) when doing so would run
    /// past the tape's hard capacity.
    ///
    /// # Errors
    /// Returns [`DataError`] if the head is already at the last cell.
    pub fn shr(&mut self) -> Result<(), DataError> {
        if self.head + 1 >= self.data.len() {
            return Err(DataError);
        }
        self.head += 1;
        self.undo.push(UndoOp::Shl);
        self.effective.record_shr();
        self.delta.note_shr();
        self.touch();
        Ok(())
    }

    /// Shift left. See [`Self::shr`].
    ///
    /// # Errors
    /// Returns [`DataError`] if the head is already at cell zero.
    pub fn shl(&mut self) -> Result<(), DataError> {
        if self.head == 0 {
            return Err(DataError);
        }
        self.head -= 1;
        self.undo.push(UndoOp::Shr);
        self.effective.record_shl();
        self.delta.note_shl();
        self.touch();
        Ok(())
    }

    /// Replays the last `num` undo atoms, inverting each.
    pub fn undo(&mut self, num: usize) {
        for _ in 0..num {
            match self.undo.pop().expect("undo log underflow") {
                UndoOp::Inc => self.data[self.head] += 1,
                UndoOp::Dec => self.data[self.head] -= 1,
                UndoOp::Shr => self.head += 1,
                UndoOp::Shl => self.head -= 1,
            }
        }
    }

    /// Resets the hang trackers at a sampling boundary.
    pub fn reset_hang_detection(&mut self) {
        self.effective.reset();
        self.delta.reset();
    }

    /// Snapshots the two sample-period-local trackers (`spec.md` §8's
    /// round-trip law applies to "all trackers", not just tape cell values).
    /// Both structs are bounded by `hang_sample_period`, not by tape size, so
    /// cloning them is cheap regardless of how large the tape is.
    #[must_use]
    pub fn tracker_snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            effective: self.effective.clone(),
            delta: self.delta.clone(),
        }
    }

    /// Restores the two sample-period-local trackers from a snapshot taken
    /// by [`Self::tracker_snapshot`]. Used by the search frame's `pop` to
    /// undo tracker state that `undo()` itself does not touch (it only
    /// reverses cell values and head position).
    pub fn restore_trackers(&mut self, snap: TrackerSnapshot) {
        self.effective = snap.effective;
        self.delta = snap.delta;
    }

    /// `spec.md`'s open question resolves to: Hang-1 and Hang-2 run
    /// together and either may independently report a hang.
    #[must_use]
    pub fn hang_detected(&self) -> bool {
        self.effective.is_hang() || self.delta.is_hang(&self.data, self.head)
    }

    /// Narrows the "since last snapshot" visited range back down to just
    /// the current head position. Called by the snapshot tracker after it
    /// captures a snapshot (`spec.md` §4.6).
    pub fn reset_visited_bounds(&mut self) {
        self.min_visited = self.head;
        self.max_visited = self.head;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn undo_restores_head_and_values() {
        let mut tape = DataTape::new(16, 4);
        let head0 = tape.head();
        tape.inc();
        tape.inc();
        tape.shr().unwrap();
        tape.dec();
        assert_ne!(tape.head(), head0);
        tape.undo(3);
        assert_eq!(tape.head(), head0);
        assert_eq!(tape.val(), 2);
        tape.undo(1);
        assert_eq!(tape.val(), 0);
    }

    #[test]
    fn shr_fails_at_hard_boundary() {
        let mut tape = DataTape::new(2, 4);
        tape.shr().unwrap();
        assert_eq!(tape.shr(), Err(DataError));
    }

    proptest! {
        #[test]
        fn undo_is_always_an_exact_inverse(ops in proptest::collection::vec(0u8..4, 0..200)) {
            let mut tape = DataTape::new(4096, 64);
            let head0 = tape.head();
            let mut applied = 0usize;
            for op in ops {
                let ok = match op {
                    0 => { tape.inc(); true }
                    1 => { tape.dec(); true }
                    2 => tape.shr().is_ok(),
                    _ => tape.shl().is_ok(),
                };
                if ok {
                    applied += 1;
                }
            }
            tape.undo(applied);
            prop_assert_eq!(tape.head(), head0);
            prop_assert!(tape.data().iter().all(|&v| v == 0));
        }
    }
}
