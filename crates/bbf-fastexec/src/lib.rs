// crates/bbf-fastexec/src/lib.rs

//! Block-graph replay of an already-finalized program (`spec.md` §4.8's
//! block-graph mode, ported from `FastExecutor.cpp`/`FastExecSearcher.cpp`).
//!
//! Once the exhaustive searcher has proven a program terminates, replaying
//! it through the grid-mode interpreter again just to get its exact step
//! count is wasteful: every hang detector fires for nothing, since the
//! answer is already known. `replay` instead drives
//! [`bbf_core::Search::run_blocks`] directly, compiling straight-line
//! segments into blocks lazily the same way the searcher does, but without
//! consulting any hang detector at all.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use bbf_core::{BlockOutcome, Grid, NullObserver, SearchConfig, SearchObserver};
pub use bbf_core::Search;

/// Terminal outcome of one replay, reported to the caller once
/// `on_fast_execution`/`on_done`/`on_error`/`on_late_escape` have already
/// been dispatched to `observer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// The program terminated after this many steps.
    Done(u64),
    /// The tape head ran off the hard capacity.
    DataError,
    /// A block construction-time cap closed a loop under itself: the graph
    /// itself proves the program never exits. Replay is only ever invoked
    /// on programs the exhaustive search already found to terminate, so
    /// seeing this means the replayed grid didn't match what was searched.
    Hang,
    /// Replay reached an unresolved successor (an `Unset` cell still in the
    /// grid, or a branch the block compiler can't resolve without one).
    Escape(u64),
    /// The per-run step budget ran out before the graph closed. As with
    /// `Hang`, this should never happen on a grid the searcher actually
    /// proved terminating; it's a defensive cap against replaying the wrong
    /// program.
    AssumedHang(u64),
}

/// Replays `grid` to completion under `config`, reporting to `observer`.
///
/// Uses `config`'s `max_steps_per_run` as the replay's own step budget
/// (`FastExecutor`'s `maxSteps` safety valve) — this is a ceiling on a
/// single replay, not the multi-branch `max_steps_total` accounting the
/// exhaustive searcher does.
#[must_use]
pub fn replay(grid: Grid, config: SearchConfig, observer: &mut dyn SearchObserver) -> ReplayOutcome {
    let mut search = Search::with_grid(config, grid);
    tracing::debug!(width = config.width, height = config.height, "starting fast replay");
    let outcome = search.run_blocks();
    observer.on_fast_execution();

    match outcome {
        BlockOutcome::Done(steps) => {
            observer.on_done(steps);
            ReplayOutcome::Done(steps)
        }
        BlockOutcome::DataError => {
            observer.on_error();
            ReplayOutcome::DataError
        }
        BlockOutcome::Hang => {
            observer.on_hang(true);
            ReplayOutcome::Hang
        }
        BlockOutcome::Escape(steps) => {
            observer.on_late_escape(steps);
            ReplayOutcome::Escape(steps)
        }
        BlockOutcome::AssumedHang(steps) => {
            observer.on_hang(false);
            ReplayOutcome::AssumedHang(steps)
        }
    }
}

/// Convenience wrapper for callers that don't need observer callbacks.
#[must_use]
pub fn replay_silent(grid: Grid, config: SearchConfig) -> ReplayOutcome {
    let mut observer = NullObserver;
    replay(grid, config, &mut observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbf_core::Op;

    #[test]
    fn replays_a_single_turn_program_in_zero_steps() {
        let cfg = SearchConfig::new(1, 1, 64, 256, 100_000, 8).unwrap();
        let mut grid = Grid::new(1, 1);
        grid.set(0, 0, Op::Turn);
        let outcome = replay_silent(grid, cfg);
        assert_eq!(outcome, ReplayOutcome::Done(0));
    }

    #[test]
    fn replaying_a_grid_with_an_unset_cell_escapes() {
        let cfg = SearchConfig::new(2, 1, 64, 256, 100_000, 8).unwrap();
        let grid = Grid::new(2, 1);
        let outcome = replay_silent(grid, cfg);
        assert!(matches!(outcome, ReplayOutcome::Escape(_)));
    }

    #[test]
    fn matches_grid_mode_step_count_on_a_terminating_program() {
        use bbf_core::{Search as CoreSearch, StepOutcome};

        let cfg = SearchConfig::new(2, 2, 64, 256, 100_000, 8).unwrap();
        let mut grid = Grid::new(2, 2);
        grid.set(0, 0, Op::Turn);
        grid.set(1, 0, Op::Noop);
        grid.set(0, 1, Op::Noop);
        grid.set(1, 1, Op::Noop);

        let mut grid_search = CoreSearch::with_grid(cfg, grid.clone());
        let grid_outcome = grid_search.run_grid();
        let StepOutcome::Done(grid_steps) = grid_outcome else {
            panic!("expected grid-mode Done, got {grid_outcome:?}");
        };

        let block_outcome = replay_silent(grid, cfg);
        assert_eq!(block_outcome, ReplayOutcome::Done(grid_steps));
    }
}
