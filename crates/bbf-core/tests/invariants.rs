//! Cross-module invariants: the push/pop round-trip law, and agreement
//! between grid-mode and block-graph replay on a terminating program.

use bbf_core::{Grid, Op, Search, SearchConfig, StepOutcome};

/// A small terminating program: Turn at the origin turns the initial
/// zero-valued tape left and exits immediately off the left edge.
fn tiny_terminating_grid() -> Grid {
    let mut grid = Grid::new(2, 2);
    grid.set(0, 0, Op::Turn);
    grid.set(1, 0, Op::Noop);
    grid.set(0, 1, Op::Noop);
    grid.set(1, 1, Op::Noop);
    grid
}

#[test]
fn grid_mode_and_block_mode_agree_on_step_count() {
    let cfg = SearchConfig::new(2, 2, 64, 256, 100_000, 8).unwrap();
    let grid = tiny_terminating_grid();

    let mut grid_search = Search::with_grid(cfg, grid.clone());
    let StepOutcome::Done(grid_steps) = grid_search.run_grid() else {
        panic!("expected grid-mode program to terminate");
    };

    let mut block_search = Search::with_grid(cfg, grid);
    let block_outcome = block_search.run_blocks();
    assert_eq!(block_outcome, bbf_core::BlockOutcome::Done(grid_steps));
}

#[test]
fn repeated_push_pop_cycles_leave_search_state_unchanged() {
    let cfg = SearchConfig::new(3, 3, 64, 1000, 100_000, 8).unwrap();
    let mut search = Search::new(cfg);
    let (col, row) = search.next_cell();
    let pp_before = search.pp();
    let steps_before = search.steps();

    for op in [Op::Noop, Op::Data, Op::Turn] {
        let frame = search.push_frame(col, row, op);
        assert_eq!(search.grid().get(col, row), op);
        let _ = search.run_grid();
        search.pop_frame(frame);
        assert_eq!(search.grid().get(col, row), Op::Unset);
        assert_eq!(search.pp(), pp_before);
        assert_eq!(search.steps(), steps_before);
    }
}

#[test]
fn running_off_the_grid_from_an_empty_program_reports_done_in_one_step() {
    // A 1x1 grid with its only cell left Unset can never be run directly,
    // but with Noop assigned the pointer walks straight off the grid.
    let cfg = SearchConfig::new(1, 1, 64, 256, 100_000, 8).unwrap();
    let mut search = Search::new(cfg);
    let (col, row) = search.next_cell();
    let _frame = search.push_frame(col, row, Op::Noop);
    assert_eq!(search.run_grid(), StepOutcome::Done(1));
}
