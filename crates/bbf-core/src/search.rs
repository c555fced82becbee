//! The `Search` value: grid, tape, block store, and hang detectors bundled
//! into one place, plus the push/pop search-frame discipline that the
//! exhaustive searcher drives (`spec.md` §3 "Search frame", §9 "Global
//! mutable state" design note).
//!
//! Nothing here is global or `static`; `Search` is constructed once per
//! search run and threaded explicitly through the scheduler.

use crate::block::BlockStore;
use crate::config::SearchConfig;
use crate::grid::{Dir, Grid, Op, ProgramPointer};
use crate::hang::{PeriodicHangDetector, RegularSweepHangDetector};
use crate::tape::{DataTape, TrackerSnapshot};

/// Grid, tape, blocks, detectors and the program pointer for one search.
pub struct Search {
    pub(crate) grid: Grid,
    pub(crate) tape: DataTape,
    pub(crate) blocks: BlockStore,
    pub(crate) config: SearchConfig,
    pub(crate) pp: ProgramPointer,
    /// Steps executed along the currently active DFS path. Rolls back with
    /// [`Frame`] pops, unlike `total_work`.
    pub(crate) steps: u64,
    /// Steps executed across the whole search, checked against
    /// `max_steps_total`. Monotonic: never rolled back by a frame pop, since
    /// its purpose is bounding total work done, not describing one branch.
    pub(crate) total_work: u64,
    pub(crate) periodic: PeriodicHangDetector,
    pub(crate) sweep: RegularSweepHangDetector,
    /// Current horizontal shift regime, if any, used to recognize sweep
    /// reversals (`spec.md` §4.9's "Regular-sweep" detector).
    pub(crate) sweep_dir: Option<Dir>,
    /// Scratch set of block keys visited so far in the current `run_grid`
    /// call, used to spot candidate loop entries for the no-exit detector.
    /// Cleared at the start of every call; not part of the frame discipline.
    pub(crate) seen_blocks: Vec<bool>,
}

/// A rollback point recorded by [`Search::push_frame`]. Must be passed back
/// to [`Search::pop_frame`] exactly once, in LIFO order with any other
/// frames pushed after it.
pub struct Frame {
    col: i32,
    row: i32,
    pp: ProgramPointer,
    steps: u64,
    tape_mark: usize,
    tracker_snapshot: TrackerSnapshot,
    block_mark: usize,
    periodic_snapshot: PeriodicHangDetector,
    sweep_snapshot: RegularSweepHangDetector,
    sweep_dir: Option<Dir>,
}

impl Search {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        let tape = DataTape::new(config.data_size, config.hang_sample_period);
        let periodic = PeriodicHangDetector::new(config.hang_sample_period);
        Self {
            grid: Grid::new(config.width, config.height),
            tape,
            blocks: BlockStore::new(),
            config,
            pp: ProgramPointer::initial(),
            steps: 0,
            total_work: 0,
            periodic,
            sweep: RegularSweepHangDetector::new(),
            sweep_dir: None,
            seen_blocks: vec![false; crate::block::MAX_BLOCKS + 1],
        }
    }

    /// Builds a `Search` around an already fully-specified program, for
    /// `bbf-fastexec`'s block-graph replay rather than the exhaustive
    /// searcher's cell-by-cell assignment.
    ///
    /// # Panics
    /// Panics if `grid`'s dimensions don't match `config`.
    #[must_use]
    pub fn with_grid(config: SearchConfig, grid: Grid) -> Self {
        assert_eq!(grid.width(), config.width, "grid width doesn't match config");
        assert_eq!(grid.height(), config.height, "grid height doesn't match config");
        let mut search = Self::new(config);
        search.grid = grid;
        search
    }

    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub const fn pp(&self) -> ProgramPointer {
        self.pp
    }

    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub const fn total_work(&self) -> u64 {
        self.total_work
    }

    /// Whether the search-wide step budget has been exhausted. The scheduler
    /// checks this after every branch completes to decide whether to stop
    /// the whole DFS early rather than merely the current branch.
    #[must_use]
    pub const fn total_budget_exceeded(&self) -> bool {
        self.total_work >= self.config.max_steps_total
    }

    /// The next cell under the pointer — the one a fresh `Branch` result
    /// invites the searcher to assign.
    #[must_use]
    pub fn next_cell(&self) -> (i32, i32) {
        let ip = self.pp.next_cell();
        (ip.col, ip.row)
    }

    /// Records a grid mutation as a new rollback point. Every tracker, the
    /// tape undo log, and the block store are all snapshotted or marked
    /// here so that `pop_frame` can restore them bitwise (`spec.md` §8's
    /// round-trip law covers "all trackers", not just tape cell values).
    pub fn push_frame(&mut self, col: i32, row: i32, op: Op) -> Frame {
        let frame = Frame {
            col,
            row,
            pp: self.pp,
            steps: self.steps,
            tape_mark: self.tape.undo_len(),
            tracker_snapshot: self.tape.tracker_snapshot(),
            block_mark: self.blocks.mark(),
            periodic_snapshot: self.periodic.clone(),
            sweep_snapshot: self.sweep.clone(),
            sweep_dir: self.sweep_dir,
        };
        self.grid.set(col, row, op);
        frame
    }

    /// Inverts a [`Frame`] produced by `push_frame`: the grid cell, tape
    /// (values, head, both hang trackers), block store, program pointer,
    /// path step count, and the periodic/sweep detectors are all restored to
    /// their state at push time. Order matters per `spec.md` §9: tape and
    /// blocks unwind before the grid cell goes back to `Unset`.
    pub fn pop_frame(&mut self, frame: Frame) {
        let undo_n = self.tape.undo_len() - frame.tape_mark;
        self.tape.undo(undo_n);
        self.tape.restore_trackers(frame.tracker_snapshot);
        self.blocks.unwind_to(frame.block_mark);
        self.grid.clear(frame.col, frame.row);
        self.pp = frame.pp;
        self.steps = frame.steps;
        self.periodic = frame.periodic_snapshot;
        self.sweep = frame.sweep_snapshot;
        self.sweep_dir = frame.sweep_dir;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;

    #[test]
    fn push_then_pop_restores_grid_and_pointer() {
        let cfg = SearchConfig::new(3, 3, 64, 1000, 100_000, 8).unwrap();
        let mut s = Search::new(cfg);
        let (col, row) = s.next_cell();
        let pp_before = s.pp();
        let frame = s.push_frame(col, row, Op::Noop);
        assert_eq!(s.grid().get(col, row), Op::Noop);
        s.pop_frame(frame);
        assert_eq!(s.grid().get(col, row), Op::Unset);
        assert_eq!(s.pp(), pp_before);
    }
}
