//! The step loop: grid-mode interpretation and block-graph replay over a
//! [`crate::search::Search`] (`spec.md` §4.8).
//!
//! Grid mode single-steps the program, feeding every mutation to the
//! sample-period-local trackers embedded in the tape and to the periodic and
//! regular-sweep hang detectors, and is what the exhaustive searcher drives.
//! Block-graph mode instead follows compiled [`crate::block::Block`] edges,
//! used by `bbf-fastexec` to replay an already-finalized program precisely
//! and quickly, without running any hang detector at all.

use crate::block::{entry_key, entry_pointer, key_for, BlockKind};
use crate::grid::{Dir, Op};
use crate::hang::HangStatus;
use crate::search::Search;
use crate::tape::DataError;

/// Terminal (or branch) outcome of one `run_grid` call. Mirrors `spec.md`
/// §9's replacement for exceptions: a small `Copy` enum instead of
/// exceptional control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The pointer stands before an `Unset` cell; the caller must assign one
    /// of `{Noop, Data, Turn}` there (via `push_frame`) and call again.
    Branch,
    /// The program walked off the grid. Carries the steps executed along
    /// the current path.
    Done(u64),
    /// The head ran off the tape's hard capacity.
    DataError,
    /// A hang detector fired. `true` means a detector proved it; `false`
    /// means the per-run step budget was exhausted without one firing
    /// (`spec.md` §7's `AssumedHang`).
    Hang(bool),
}

/// Terminal outcome of one `run_blocks` replay (`bbf-fastexec`'s mode).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block graph walked off the grid, with the total step count.
    Done(u64),
    /// The head ran off the tape's hard capacity.
    DataError,
    /// A block construction-time cap (127 steps without a turn) closed the
    /// loop under itself: the program cannot terminate.
    Hang,
    /// Replay reached a block whose successor isn't known yet (an `Unset`
    /// cell, or a successor the compiler can't resolve without one) —
    /// `spec.md` §7's `LateEscape`. The grid-mode interpretation remains
    /// authoritative; this is not an error.
    Escape(u64),
    /// The per-run step budget ran out without the graph closing under a
    /// `Hang` block. Mirrors the original `FastExecutor`'s `maxSteps` safety
    /// valve: replay is only meant for programs already proven to
    /// terminate, so this only fires on a misused or mismatched replay.
    AssumedHang(u64),
}

/// Small-integer tag recorded by the cycle detector for one executed step,
/// `spec.md` §4.5. Distinguishes op kind and direction so that a repeated
/// sub-path through the grid produces a repeated tag sequence.
#[must_use]
fn step_tag(op: Op, dir: Dir) -> u8 {
    (op as u8) << 2 | dir as u8
}

impl Search {
    /// Runs grid-mode interpretation from the current program pointer until
    /// a branch point, termination, a detected hang, or the per-run step
    /// budget is exhausted.
    #[must_use]
    pub fn run_grid(&mut self) -> StepOutcome {
        self.seen_blocks.iter_mut().for_each(|b| *b = false);

        loop {
            let next = self.pp.next_cell();
            let Some(op) = self.grid.cell_at(next) else {
                return StepOutcome::Done(self.steps);
            };

            match op {
                Op::Unset => return StepOutcome::Branch,
                Op::Noop => {
                    self.pp.p = next;
                }
                Op::Data => {
                    let result = match self.pp.dir {
                        Dir::Up => {
                            self.tape.inc();
                            Ok(())
                        }
                        Dir::Down => {
                            self.tape.dec();
                            Ok(())
                        }
                        Dir::Right => self.tape.shr(),
                        Dir::Left => self.tape.shl(),
                    };
                    if let Err(DataError) = result {
                        return StepOutcome::DataError;
                    }
                    if matches!(self.pp.dir, Dir::Right | Dir::Left) {
                        self.note_shift_step();
                    }
                    self.pp.p = next;
                }
                Op::Turn => {
                    let zero = self.tape.val() == 0;
                    let new_dir = if zero {
                        self.pp.dir.turn_ccw()
                    } else {
                        self.pp.dir.turn_cw()
                    };
                    self.note_turn(new_dir, zero);
                    // The pointer's position never changes on a `Turn` — it
                    // only pivots which neighbor of the *current* cell gets
                    // examined next (mirrors `Block::build`'s treatment of
                    // turns in `block.rs`). A `Turn` is free: it doesn't
                    // advance `steps`/`total_work`, matching the original
                    // searcher's inner do-while, which only increments its
                    // step counter once the loop exits on an advancing move.
                    self.pp.dir = new_dir;
                    self.periodic.record_op(step_tag(op, self.pp.dir));
                    if let Some(status) = self.check_no_exit_candidate(zero) {
                        if status == HangStatus::Hanging {
                            return StepOutcome::Hang(true);
                        }
                    }
                    continue;
                }
            }

            self.periodic.record_op(step_tag(op, self.pp.dir));
            self.steps += 1;
            self.total_work += 1;
            if let Some(outcome) = self.check_budgets_and_sample() {
                return outcome;
            }
        }
    }

    /// Shared tail of every step: enforce the per-run budget, then run the
    /// sample-period-local hang checks at a sampling boundary.
    fn check_budgets_and_sample(&mut self) -> Option<StepOutcome> {
        if self.steps >= u64::from(self.config.max_steps_per_run) {
            return Some(StepOutcome::Hang(false));
        }
        let period = self.config.hang_sample_period as u64;
        if self.steps % period != 0 {
            return None;
        }
        if self.tape.hang_detected() {
            return Some(StepOutcome::Hang(true));
        }
        self.tape.reset_hang_detection();
        if self.periodic.sample(&mut self.tape) == HangStatus::Hanging {
            return Some(StepOutcome::Hang(true));
        }
        None
    }

    /// Feeds one horizontal data step to the regular-sweep detector,
    /// starting a new sweep leg the first time a shift direction is seen.
    fn note_shift_step(&mut self) {
        let dir = self.pp.dir;
        if self.sweep_dir != Some(dir) {
            self.sweep_dir = Some(dir);
            self.sweep.sweep_started(&mut self.tape);
        }
        self.sweep.note_shift(dir == Dir::Right);
    }

    /// Feeds one `Turn` to the regular-sweep detector: a reversal is a turn
    /// that flips the active horizontal shift direction; a turn out of a
    /// horizontal regime into a vertical one breaks the sweep's working
    /// assumption instead.
    fn note_turn(&mut self, new_dir: Dir, _zero: bool) {
        let Some(old) = self.sweep_dir else { return };
        let is_horizontal = matches!(new_dir, Dir::Right | Dir::Left);
        if is_horizontal && new_dir != old {
            self.sweep.sweep_reversed(&mut self.tape, self.pp);
            self.sweep_dir = Some(new_dir);
        } else if !is_horizontal {
            self.sweep.sweep_broken();
            self.sweep_dir = None;
        }
    }

    /// Checks the regular-sweep detector's running verdict right after a
    /// turn is processed, and opportunistically runs the no-exit detector
    /// against a block key revisited within this same run.
    fn check_no_exit_candidate(&mut self, zero: bool) -> Option<HangStatus> {
        if self.sweep.detect() == HangStatus::Hanging {
            return Some(HangStatus::Hanging);
        }
        let key = key_for(self.pp, zero);
        if self.seen_blocks[key] {
            let mut no_exit = crate::hang::NoExitHangDetector::new();
            let can_exit = no_exit.can_exit_from(&self.grid, &mut self.blocks, key, self.pp, zero);
            if !can_exit {
                return Some(HangStatus::Hanging);
            }
        } else {
            self.seen_blocks[key] = true;
        }
        None
    }

    /// Runs block-graph replay from the program's start until the graph
    /// walks off the grid, a `Hang` block closes the loop, the tape errors,
    /// or an unresolved successor forces a `LateEscape`. Never consults any
    /// hang detector (`spec.md` §7): the caller is expected to only replay
    /// programs already proven to terminate.
    #[must_use]
    pub fn run_blocks(&mut self) -> BlockOutcome {
        let mut key = entry_key();
        let mut entry = entry_pointer();
        let mut zero_assumed = true;

        loop {
            if self.steps >= u64::from(self.config.max_steps_per_run) {
                return BlockOutcome::AssumedHang(self.steps);
            }
            if !self.blocks.ensure(&self.grid, key, entry, zero_assumed) {
                return BlockOutcome::Escape(self.steps);
            }
            let block = *self.blocks.get(key).expect("just ensured");

            match block.kind {
                BlockKind::Exit => {
                    self.steps += u64::from(block.num_steps);
                    self.total_work += u64::from(block.num_steps);
                    return BlockOutcome::Done(self.steps);
                }
                BlockKind::Hang => {
                    self.steps += u64::from(block.num_steps);
                    self.total_work += u64::from(block.num_steps);
                    return BlockOutcome::Hang;
                }
                BlockKind::Delta => {
                    if self.apply_delta(block.amount).is_err() {
                        return BlockOutcome::DataError;
                    }
                }
                BlockKind::Shift => {
                    if self.apply_shift(block.amount).is_err() {
                        return BlockOutcome::DataError;
                    }
                }
            }
            self.steps += u64::from(block.num_steps);
            self.total_work += u64::from(block.num_steps);

            let zero = self.tape.val() == 0;
            let succ = if zero { block.zero_succ } else { block.nonzero_succ };
            match succ {
                None => return BlockOutcome::Escape(self.steps),
                Some(s) => {
                    key = s.key();
                    entry = s.entry();
                    zero_assumed = s.zero_assumed;
                }
            }
        }
    }

    fn apply_delta(&mut self, amount: i32) -> Result<(), DataError> {
        if amount >= 0 {
            for _ in 0..amount {
                self.tape.inc();
            }
        } else {
            for _ in 0..amount.unsigned_abs() {
                self.tape.dec();
            }
        }
        Ok(())
    }

    fn apply_shift(&mut self, amount: i32) -> Result<(), DataError> {
        if amount >= 0 {
            for _ in 0..amount {
                self.tape.shr()?;
            }
        } else {
            for _ in 0..amount.unsigned_abs() {
                self.tape.shl()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::grid::Op;

    #[test]
    fn immediate_exit_reports_done_with_zero_steps() {
        let cfg = SearchConfig::new(1, 1, 64, 1000, 100_000, 8).unwrap();
        let mut s = Search::new(cfg);
        let (col, row) = s.next_cell();
        let _frame = s.push_frame(col, row, Op::Turn);
        // A single Turn cell with a zero tape turns ccw (Left) then walks
        // straight off the grid; the turn itself is free, so no step is
        // ever counted.
        let outcome = s.run_grid();
        assert_eq!(outcome, StepOutcome::Done(0));
    }

    #[test]
    fn stepping_onto_unset_cell_reports_branch() {
        let cfg = SearchConfig::new(3, 3, 64, 1000, 100_000, 8).unwrap();
        let mut s = Search::new(cfg);
        let (col, row) = s.next_cell();
        let _frame = s.push_frame(col, row, Op::Noop);
        let outcome = s.run_grid();
        assert_eq!(outcome, StepOutcome::Branch);
    }

    #[test]
    fn data_op_off_tape_edge_is_data_error() {
        // (0,0)=Data bumps the cell to 1 without moving the pointer's
        // position. (0,1)=Turn then reads that nonzero value from the same
        // position and turns clockwise (Up -> Right) without advancing onto
        // the turn cell, so the next neighbour examined is (1,0), not
        // (1,1). (1,0)=Data then shifts right off a size-2 tape whose head
        // already sits at the last cell.
        let cfg = SearchConfig::new(2, 2, 2, 1000, 100_000, 8).unwrap();
        let mut s = Search::new(cfg);
        let _f0 = s.push_frame(0, 0, Op::Data);
        let outcome = s.run_grid();
        assert_eq!(outcome, StepOutcome::Branch);
        let _f1 = s.push_frame(0, 1, Op::Turn);
        let outcome = s.run_grid();
        assert_eq!(outcome, StepOutcome::Branch);
        let _f2 = s.push_frame(1, 0, Op::Data);
        let outcome = s.run_grid();
        assert_eq!(outcome, StepOutcome::DataError);
    }
}
