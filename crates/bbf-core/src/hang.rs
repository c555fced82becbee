//! Hang detectors that operate above the per-mutation trackers already
//! embedded in [`crate::tape::DataTape`] (`spec.md` §4.9).
//!
//! Three detectors live here:
//!
//! - [`PeriodicHangDetector`]: proposes a period from the executed-op trace
//!   ([`crate::cycle::CycleDetector`]) and confirms it against two tape
//!   snapshots, ported from `PeriodicHangDetector.cpp`.
//! - [`RegularSweepHangDetector`]: tracks sweep reversals and the snapshot
//!   comparison across them, ported from `RegularSweepHangDetector.cpp`.
//! - [`NoExitHangDetector`]: a reachability walk over the compiled block
//!   graph, ported from `ExitFinder.cpp`.
//!
//! The first two share a small capability-based interface
//! ([`start`]/[`sample`]/[`detect`] etc.) so the executor can drive a set of
//! them uniformly; `NoExitHangDetector` is a one-shot graph query instead
//! and is invoked directly where needed.

use crate::block::{Block, BlockKind, BlockStore, MAX_BLOCKS};
use crate::cycle::{CycleDetector, CycleTag};
use crate::grid::{Grid, ProgramPointer};
use crate::snapshot::DataTracker;
use crate::tape::DataTape;

/// Outcome of one hang detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HangStatus {
    /// Insufficient evidence yet; keep running.
    Ongoing,
    /// This detector is confident the program hangs.
    Hanging,
    /// This detector can no longer make a claim (e.g. its working
    /// assumption — a fixed sweep turning point — broke) and should be
    /// skipped for the rest of the run.
    Failed,
}

/// Proposes a repeat period from the executed-op trace, then confirms it
/// against the tape's own before/after snapshots.
#[derive(Clone, Debug)]
pub struct PeriodicHangDetector {
    cycle: CycleDetector,
    tracker: DataTracker,
    status: HangStatus,
}

impl PeriodicHangDetector {
    #[must_use]
    pub fn new(hang_sample_period: usize) -> Self {
        Self {
            cycle: CycleDetector::new(hang_sample_period),
            tracker: DataTracker::new(),
            status: HangStatus::Ongoing,
        }
    }

    pub fn start(&mut self) {
        self.cycle.clear();
        self.tracker.clear();
        self.status = HangStatus::Ongoing;
    }

    pub fn record_op(&mut self, tag: CycleTag) {
        self.cycle.record(tag);
    }

    /// Called at a sampling boundary. Takes a new tape snapshot, proposes a
    /// period from the trace recorded since the last call, and checks it.
    pub fn sample(&mut self, tape: &mut DataTape) -> HangStatus {
        self.tracker.capture(tape);
        if self.tracker.has_two_snapshots() {
            let period = self.cycle.get_period();
            if period < self.cycle.len() && self.tracker.periodic_hang_detected(tape) {
                self.status = HangStatus::Hanging;
            }
        }
        self.cycle.clear();
        self.status
    }

    #[must_use]
    pub fn detect(&self) -> HangStatus {
        self.status
    }
}

/// Tracks a program that sweeps back and forth over a growing data range,
/// confirming the sweep is unproductive across successive reversals.
#[derive(Clone, Debug)]
pub struct RegularSweepHangDetector {
    status: HangStatus,
    sweep_count: u32,
    mid: Option<usize>,
    sweep_start_pp: Option<ProgramPointer>,
    tracker: DataTracker,
    max_shr: i64,
    max_shl: i64,
}

impl Default for RegularSweepHangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RegularSweepHangDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: HangStatus::Ongoing,
            sweep_count: 0,
            mid: None,
            sweep_start_pp: None,
            tracker: DataTracker::new(),
            max_shr: 0,
            max_shl: 0,
        }
    }

    pub fn start(&mut self) {
        *self = Self::new();
    }

    /// Called when a new sweep leg begins: captures a fresh baseline.
    pub fn sweep_started(&mut self, tape: &mut DataTape) {
        self.tracker.capture(tape);
        self.max_shr = 0;
        self.max_shl = 0;
    }

    /// Called on every `shr`/`shl` while a sweep is in progress.
    pub fn note_shift(&mut self, was_shr: bool) {
        if was_shr {
            self.max_shr += 1;
        } else {
            self.max_shl += 1;
        }
    }

    /// Called when the program pointer turns back on itself, ending one
    /// sweep leg and starting the next.
    ///
    /// The turning point of the *second* reversal is recorded (the first
    /// stable midpoint the head settles on); the program pointer at the
    /// *third* reversal is recorded as the sweep's repeating signature.
    pub fn sweep_reversed(&mut self, tape: &mut DataTape, pp: ProgramPointer) {
        self.sweep_count += 1;
        if self.sweep_count == 2 && tape.head() > tape.min_bound() && tape.head() < tape.max_bound() {
            self.mid = Some(tape.head());
        }
        if self.sweep_count == 3 {
            self.sweep_start_pp = Some(pp);
        }
        if self.sweep_count % 2 == 1 && self.sweep_count != 3 && !self.check_for_hang(tape, pp) {
            return;
        }
        self.tracker.capture(tape);
    }

    fn check_for_hang(&mut self, tape: &DataTape, pp: ProgramPointer) -> bool {
        if !self.tracker.sweep_hang_detected(tape, self.mid) {
            self.status = HangStatus::Failed;
            return false;
        }
        let max = self.max_shr.max(self.max_shl);
        if max * 2 - 1 > i64::from(self.sweep_count) {
            // Too many shifts relative to how many sweeps we've seen; give
            // it more time before drawing a conclusion.
            return true;
        }
        if self.sweep_start_pp == Some(pp) {
            self.status = HangStatus::Hanging;
            return false;
        }
        true
    }

    pub fn sweep_broken(&mut self) {
        self.status = HangStatus::Failed;
    }

    #[must_use]
    pub fn detect(&self) -> HangStatus {
        self.status
    }
}

/// A one-shot reachability query over the compiled block graph: can
/// execution, from this block onward, ever reach the grid's edge (an
/// `Exit` block) or an as-yet-`Unset` cell? If not, the program can never
/// leave the reachable set and therefore hangs.
#[derive(Clone, Debug)]
pub struct NoExitHangDetector {
    visited: Vec<bool>,
    pending: Vec<usize>,
}

impl Default for NoExitHangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl NoExitHangDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            visited: vec![false; MAX_BLOCKS + 1],
            pending: Vec::new(),
        }
    }

    /// Returns `true` if some path out of the given block can still escape
    /// (reach an exit or an unfinished cell), `false` if the reachable,
    /// fully-compiled portion of the graph is closed under itself.
    pub fn can_exit_from(
        &mut self,
        grid: &Grid,
        store: &mut BlockStore,
        key: usize,
        entry: ProgramPointer,
        zero_assumed: bool,
    ) -> bool {
        let escaped = self.visit(grid, store, key, entry, zero_assumed);
        for &idx in &self.pending {
            self.visited[idx] = false;
        }
        self.pending.clear();
        escaped
    }

    fn visit(
        &mut self,
        grid: &Grid,
        store: &mut BlockStore,
        key: usize,
        entry: ProgramPointer,
        zero_assumed: bool,
    ) -> bool {
        if self.visited[key] {
            return false;
        }
        if !store.ensure(grid, key, entry, zero_assumed) {
            // Construction hit an Unset cell: the search can still place
            // something here, so this path cannot be ruled out as a hang.
            return true;
        }
        self.visited[key] = true;
        self.pending.push(key);

        let block: Block = *store.get(key).expect("just ensured");
        match block.kind {
            BlockKind::Exit => return true,
            BlockKind::Hang => return false,
            BlockKind::Delta | BlockKind::Shift => {}
        }

        let mut escaped = false;
        if let Some(succ) = block.zero_succ {
            escaped |= self.visit(grid, store, succ.key(), succ.entry(), succ.zero_assumed);
        }
        if let Some(succ) = block.nonzero_succ {
            escaped |= self.visit(grid, store, succ.key(), succ.entry(), succ.zero_assumed);
        }
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::entry_pointer;
    use crate::grid::Op;

    #[test]
    fn no_exit_detector_finds_escape_through_unset_cell() {
        let grid = Grid::new(3, 3);
        let mut store = BlockStore::new();
        let mut detector = NoExitHangDetector::new();
        assert!(detector.can_exit_from(&grid, &mut store, crate::block::entry_key(), entry_pointer(), true));
    }

    #[test]
    fn no_exit_detector_finds_no_escape_in_closed_loop() {
        // An interior cell surrounded on all four sides by data-free Turns:
        // rotation can never settle on a Noop/Data neighbour, so the block
        // compiler's spin guard finalizes it as a Hang block with no
        // successors, closed under itself.
        let mut grid = Grid::new(3, 3);
        grid.set(1, 2, Op::Turn);
        grid.set(0, 1, Op::Turn);
        grid.set(1, 0, Op::Turn);
        grid.set(2, 1, Op::Turn);
        let mut store = BlockStore::new();
        let mut detector = NoExitHangDetector::new();
        let entry = ProgramPointer::new(1, 1, crate::grid::Dir::Up);
        let key = crate::block::block_key(entry.p, entry.dir, true);
        assert!(!detector.can_exit_from(&grid, &mut store, key, entry, true));
    }

    #[test]
    fn periodic_detector_flags_monotonic_growth() {
        let mut tape = DataTape::new(32, 4);
        let mut detector = PeriodicHangDetector::new(4);
        detector.start();
        tape.inc();
        detector.record_op(0);
        let _ = detector.sample(&mut tape);
        tape.inc();
        detector.record_op(0);
        let status = detector.sample(&mut tape);
        assert_eq!(status, HangStatus::Hanging);
    }
}
