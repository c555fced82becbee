//! The exhaustive depth-first searcher (`spec.md` §4.10, ported from
//! `ExhaustiveSearcher.cpp`'s `branch`/`run`/`search`).
//!
//! Depth-first over grid cells in the order the program pointer visits them
//! (not row-major): at each `Unset` cell under the pointer, try `{Noop,
//! Data, Turn}` in turn, pushing/running/popping a [`bbf_core::search::Frame`]
//! around each trial. All pruning comes from the hang detectors embedded in
//! [`bbf_core::search::Search::run_grid`]; this module adds no speculative
//! search of its own.

use bbf_core::{Grid, Search, SearchConfig, SearchObserver, StepOutcome};

use crate::histogram::StepHistogram;
use crate::resume::{all_ops, ResumeCursor};

/// Aggregate outcome of one full exhaustive search.
#[derive(Clone, Debug, Default)]
pub struct SearchReport {
    /// Highest step count reached by any terminating branch so far (the
    /// busy-beaver candidate).
    pub best_steps: u64,
    /// The grid that achieved `best_steps`, if any branch has terminated.
    pub best_program: Option<Grid>,
    /// Branches that walked off the grid (terminated successfully).
    pub total_done: u64,
    /// Branches that ended in a [`bbf_core::tape::DataError`].
    pub total_errors: u64,
    /// Branches a hang detector proved were hanging.
    pub total_hangs_detected: u64,
    /// Branches that hit the per-run step budget without a detector firing
    /// (`spec.md` §7's `AssumedHang`).
    pub total_hangs_assumed: u64,
    /// Step-count distribution of every `total_done` branch.
    pub histogram: StepHistogram,
    /// Whether `max_steps_total` cut the search short of full exhaustion.
    pub total_budget_exceeded: bool,
}

impl SearchReport {
    fn record_done(&mut self, steps: u64, grid: &Grid) {
        self.total_done += 1;
        self.histogram.record(steps);
        if steps > self.best_steps || self.best_program.is_none() {
            self.best_steps = steps;
            self.best_program = Some(grid.clone());
        }
    }
}

/// Runs a full exhaustive search under `config`, optionally fast-forwarding
/// past a previously recorded prefix (`resume`), reporting every terminal
/// branch outcome to `observer`.
#[must_use]
pub fn run_search(
    config: SearchConfig,
    resume: Option<&[u8]>,
    observer: &mut dyn SearchObserver,
) -> SearchReport {
    let mut search = Search::new(config);
    let mut report = SearchReport::default();
    let cursor = resume.map(ResumeCursor::new);

    tracing::info!(
        width = config.width,
        height = config.height,
        data_size = config.data_size,
        "starting exhaustive search"
    );

    step(&mut search, 0, cursor.as_ref(), true, &mut report, observer);

    report.total_budget_exceeded = search.total_budget_exceeded();
    if report.total_budget_exceeded {
        tracing::warn!(
            total_work = search.total_work(),
            "search terminated by max_steps_total before full exhaustion"
        );
    }
    tracing::info!(
        best_steps = report.best_steps,
        total_done = report.total_done,
        total_errors = report.total_errors,
        total_hangs_detected = report.total_hangs_detected,
        total_hangs_assumed = report.total_hangs_assumed,
        "search complete"
    );

    report
}

/// Runs grid-mode interpretation from the current pointer until a
/// terminal outcome or a fresh branch point, reporting the terminal case
/// to `observer`/`report` and recursing into [`branch`] on `Branch`.
fn step(
    search: &mut Search,
    depth: usize,
    cursor: Option<&ResumeCursor<'_>>,
    on_resume_path: bool,
    report: &mut SearchReport,
    observer: &mut dyn SearchObserver,
) {
    match search.run_grid() {
        StepOutcome::Branch => branch(search, depth, cursor, on_resume_path, report, observer),
        StepOutcome::Done(steps) => {
            report.record_done(steps, search.grid());
            observer.on_done(steps);
        }
        StepOutcome::DataError => {
            report.total_errors += 1;
            observer.on_error();
        }
        StepOutcome::Hang(early) => {
            if early {
                report.total_hangs_detected += 1;
            } else {
                report.total_hangs_assumed += 1;
            }
            observer.on_hang(early);
        }
    }
}

/// Assigns each of `{Noop, Data, Turn}` in turn to the cell under the
/// pointer, recursing into [`step`] after each assignment and undoing it
/// before trying the next (`spec.md` §4.10 steps 1-3). While still on a
/// resumed path, only the ops a previous run hadn't yet finished at this
/// depth are tried — see `resume.rs`'s module doc for why that's always
/// a suffix of the fixed `{Noop, Data, Turn}` order, never all three.
fn branch(
    search: &mut Search,
    depth: usize,
    cursor: Option<&ResumeCursor<'_>>,
    on_resume_path: bool,
    report: &mut SearchReport,
    observer: &mut dyn SearchObserver,
) {
    let (col, row) = search.next_cell();
    let still_resuming = on_resume_path && cursor.is_some_and(|c| c.covers(depth));
    let ops = if still_resuming {
        cursor.expect("still_resuming implies cursor.is_some()").ops_at(depth)
    } else {
        all_ops().to_vec()
    };

    for (i, &op) in ops.iter().enumerate() {
        if search.total_budget_exceeded() {
            break;
        }
        let frame = search.push_frame(col, row, op);
        // Only the rotated-to-front choice (index 0) continues along the
        // resumed path; every other index is a fresh, previously-unexplored
        // sibling and searches normally from here on.
        let child_on_resume_path = still_resuming && i == 0;
        step(search, depth + 1, cursor, child_on_resume_path, report, observer);
        search.pop_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbf_core::NullObserver;

    #[test]
    fn search_over_1x1_grid_finds_immediate_exit() {
        // A 1x1 grid: the only cell is under the initial pointer. Turn
        // reads a zero cell, turns left for free, then walks off the top
        // edge (width=1) in 0 steps; Noop and Data both exit in 1 step.
        let cfg = SearchConfig::new(1, 1, 64, 256, 100_000, 8).unwrap();
        let mut observer = NullObserver;
        let report = run_search(cfg, None, &mut observer);
        assert!(report.total_done > 0);
        assert!(report.best_program.is_some());
    }

    #[test]
    fn search_explores_every_branch_with_a_small_grid() {
        let cfg = SearchConfig::new(2, 1, 64, 256, 100_000, 8).unwrap();
        let mut observer = NullObserver;
        let report = run_search(cfg, None, &mut observer);
        let total = report.total_done + report.total_errors + report.total_hangs_detected + report.total_hangs_assumed;
        assert!(total > 0);
    }

    #[test]
    fn resume_vector_fast_forwards_without_changing_the_best_result() {
        let cfg = SearchConfig::new(2, 1, 64, 256, 100_000, 8).unwrap();
        let mut baseline_observer = NullObserver;
        let baseline = run_search(cfg, None, &mut baseline_observer);

        // An all-zero resume vector is a no-op rotation: the DFS should
        // explore identically and find the same best result.
        let mut resumed_observer = NullObserver;
        let resumed = run_search(cfg, Some(&[0, 0]), &mut resumed_observer);
        assert_eq!(baseline.best_steps, resumed.best_steps);
        assert_eq!(baseline.total_done, resumed.total_done);
    }
}
