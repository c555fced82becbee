//! Straight-line program blocks: compiling runs of cells between turns into
//! single Delta/Shift/Exit/Hang steps (`spec.md` §4.7).
//!
//! Ported from `InterpretedProgramBuilder.{h,cpp}`. Two simplifications from
//! the original are documented in `DESIGN.md`:
//!
//! - Block identity here is `(entry cell, entry direction, zero-assumed)`
//!   rather than the original's packed `(cell, turn-branch-bit)`. The
//!   original recovers the entry direction for a successor by scanning the
//!   grid for a neighbour that reads as a `Turn`; that scan is only sound
//!   when the whole grid is already filled in (its one caller rebuilds a
//!   complete, already-solved program). During an in-progress search the
//!   entry direction is always already in hand from the step that is about
//!   to enter the block, so storing it directly removes the scan and the
//!   collision risk that comes with it.
//! - The original additionally keeps a `_blockIndexLookup` table purely to
//!   support an ordered-enumeration API over activated blocks. Nothing in
//!   this port needs that enumeration, so blocks are addressed by direct,
//!   dense array indexing with no secondary lookup.

use crate::grid::{Dir, Grid, InstructionPointer, Op, ProgramPointer};

/// Blocks are keyed off a position within an 8x8 grid.
pub const MAX_DIM: usize = 8;
/// `8 * 8 positions * 4 directions * 2 branch assumptions`.
pub const MAX_BLOCKS: usize = MAX_DIM * MAX_DIM * 4 * 2;

/// Computes the dense slot index for `(pos, dir, zero_assumed)`. `pos` must
/// be a real grid cell (`col, row` both in `0..MAX_DIM`); the sentinel entry
/// position `(0, -1)` is handled separately by [`entry_key`].
#[must_use]
pub fn block_key(pos: InstructionPointer, dir: Dir, zero_assumed: bool) -> usize {
    let col = pos.col.rem_euclid(MAX_DIM as i32) as usize;
    let row = pos.row.rem_euclid(MAX_DIM as i32) as usize;
    ((col + row * MAX_DIM) * 4 + dir as usize) * 2 + usize::from(zero_assumed)
}

/// The designated entry block uses the sentinel position `(0, -1)`, which
/// falls outside every real grid cell, so it gets a reserved slot past the
/// end of the normal `(pos, dir, zero_assumed)` key space instead of risking
/// a wraparound collision with a real cell.
pub const ENTRY_KEY: usize = MAX_BLOCKS;

#[must_use]
pub fn entry_key() -> usize {
    ENTRY_KEY
}

#[must_use]
pub fn entry_pointer() -> ProgramPointer {
    ProgramPointer::initial()
}

/// The slot key for `entry` under `zero_assumed`, routing the sentinel
/// entry program pointer to its reserved slot.
#[must_use]
pub fn key_for(entry: ProgramPointer, zero_assumed: bool) -> usize {
    if entry.p.row < 0 {
        ENTRY_KEY
    } else {
        block_key(entry.p, entry.dir, zero_assumed)
    }
}

/// A successor reference: the position a block's terminating turn was taken
/// from, the rotated direction to continue in, and whether that successor
/// assumes the head cell reads zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Successor {
    pub pos: InstructionPointer,
    pub dir: Dir,
    pub zero_assumed: bool,
}

impl Successor {
    #[must_use]
    pub fn entry(self) -> ProgramPointer {
        ProgramPointer {
            p: self.pos,
            dir: self.dir,
        }
    }

    #[must_use]
    pub fn key(self) -> usize {
        block_key(self.pos, self.dir, self.zero_assumed)
    }
}

/// What a finalized block does to the tape and program pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Net change to the value under the head (`amount` applications of
    /// inc/dec).
    Delta,
    /// Net head movement (`amount` applications of shr/shl).
    Shift,
    /// The block walks straight off the grid: the program terminates.
    Exit,
    /// The block re-enters itself without ever reading a `Data` cell —
    /// `spec.md`'s 127-step construction cap was hit, so this loop can never
    /// make progress and is an immediate hang.
    Hang,
}

/// One compiled straight-line run of the program, from entry up to and
/// including its terminating `Turn`.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    pub kind: BlockKind,
    pub amount: i32,
    pub num_steps: u16,
    pub zero_succ: Option<Successor>,
    pub nonzero_succ: Option<Successor>,
}

impl Block {
    fn exit(num_steps: u16) -> Self {
        Self {
            kind: BlockKind::Exit,
            amount: 0,
            num_steps,
            zero_succ: None,
            nonzero_succ: None,
        }
    }

    fn hang(num_steps: u16) -> Self {
        Self {
            kind: BlockKind::Hang,
            amount: 0,
            num_steps,
            zero_succ: None,
            nonzero_succ: None,
        }
    }

    /// Cap on the number of real (non-turn) steps a single block may
    /// represent, mirroring `InterpretedProgramBuilder`'s `127` (the max
    /// value an `i8` step counter can hold).
    const MAX_STEPS: u16 = 127;

    /// Compiles the block starting at `entry` under the assumption that the
    /// head cell read `zero_assumed` (zero, or not) at entry time. Returns
    /// `None` if construction walks onto an `Unset` cell — the block cannot
    /// be finalized yet.
    #[must_use]
    pub fn build(grid: &Grid, entry: ProgramPointer, zero_assumed: bool) -> Option<Self> {
        let mut pos = entry.p;
        let mut dir = entry.dir;
        let mut has_data = false;
        let mut is_delta = false;
        let mut amount: i32 = 0;
        let mut num_steps: u16 = 0;

        loop {
            // Guards against a pos whose every neighbour is an unset-data
            // Turn: rotation would otherwise spin forever without ever
            // advancing or finalizing. Four rotations exhaust every
            // direction once.
            let mut spins = 0u8;
            let (next, op) = loop {
                let (dc, dr) = dir.delta();
                let next = InstructionPointer::new(pos.col + dc, pos.row + dr);
                match grid.cell_at(next) {
                    // Falling off the grid ends the run on whatever `steps`
                    // already holds: the original's `reportDone(totalSteps +
                    // steps)` fires before `steps++`, so the off-grid
                    // transition itself is never counted (`ExhaustiveSearcher.cpp`'s
                    // `run`).
                    None => return Some(Self::exit(num_steps)),
                    Some(Op::Unset) => return None,
                    Some(Op::Turn) if !has_data => {
                        // Free: the head value hasn't changed since entry,
                        // so every turn before the first Data instruction
                        // resolves the same way as the entry branch did.
                        dir = if zero_assumed { dir.turn_ccw() } else { dir.turn_cw() };
                        spins += 1;
                        if spins > 4 {
                            return Some(Self::hang(num_steps));
                        }
                    }
                    Some(other) => break (next, other),
                }
            };

            match op {
                Op::Turn => {
                    let kind = if is_delta { BlockKind::Delta } else { BlockKind::Shift };
                    // A Delta block entered on the zero assumption that then
                    // changes the cell by a nonzero amount can never see
                    // zero again on return: the zero successor is dead.
                    let zero_succ = if zero_assumed && kind == BlockKind::Delta && amount != 0 {
                        None
                    } else {
                        Some(Successor {
                            pos,
                            dir: dir.turn_ccw(),
                            zero_assumed: true,
                        })
                    };
                    let nonzero_succ = Some(Successor {
                        pos,
                        dir: dir.turn_cw(),
                        zero_assumed: false,
                    });
                    return Some(Self {
                        kind,
                        amount,
                        num_steps,
                        zero_succ,
                        nonzero_succ,
                    });
                }
                Op::Noop => pos = next,
                Op::Data => {
                    if !has_data {
                        has_data = true;
                        is_delta = matches!(dir, Dir::Up | Dir::Down);
                    }
                    match dir {
                        Dir::Up | Dir::Right => amount += 1,
                        Dir::Down | Dir::Left => amount -= 1,
                    }
                    pos = next;
                }
                Op::Unset | Op::Turn => unreachable!("resolved above"),
            }

            num_steps += 1;
            if num_steps > Self::MAX_STEPS {
                return Some(Self::hang(num_steps));
            }
        }
    }
}

/// Dense, directly-indexed store of compiled blocks with frame-undo support
/// for the exhaustive search's push/pop discipline (`spec.md` §9).
#[derive(Clone, Debug)]
pub struct BlockStore {
    slots: Vec<Option<Block>>,
    finalized: Vec<usize>,
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![None; MAX_BLOCKS + 1],
            finalized: Vec::new(),
        }
    }

    /// A rollback mark: remembers how many blocks are finalized right now.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.finalized.len()
    }

    /// Reverts every block finalized since `mark` back to latent.
    pub fn unwind_to(&mut self, mark: usize) {
        while self.finalized.len() > mark {
            let idx = self.finalized.pop().expect("mark <= finalized.len()");
            self.slots[idx] = None;
        }
    }

    #[must_use]
    pub fn get(&self, key: usize) -> Option<&Block> {
        self.slots[key].as_ref()
    }

    #[must_use]
    pub fn is_finalized(&self, key: usize) -> bool {
        self.slots[key].is_some()
    }

    /// Ensures the block at `key` is finalized, compiling it from the grid
    /// on demand. Returns `false` (construction aborted) when the walk
    /// reaches an `Unset` cell.
    pub fn ensure(&mut self, grid: &Grid, key: usize, entry: ProgramPointer, zero_assumed: bool) -> bool {
        if self.slots[key].is_some() {
            return true;
        }
        match Block::build(grid, entry, zero_assumed) {
            Some(block) => {
                self.slots[key] = Some(block);
                self.finalized.push(key);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn program_that_turns_off_grid_immediately_finalizes_as_exit() {
        let grid = Grid::new(2, 1);
        // col 0 defaults to Unset; make it a Turn so the entry block's first
        // neighbour read is a (free) turn, then walks left off the grid.
        let mut grid = grid;
        grid.set(0, 0, Op::Turn);
        let block = Block::build(&grid, ProgramPointer::initial(), true).unwrap();
        assert_eq!(block.kind, BlockKind::Exit);
        assert_eq!(block.num_steps, 0);
    }

    #[test]
    fn delta_block_with_nonzero_amount_drops_zero_successor() {
        let mut grid = Grid::new(1, 3);
        grid.set(0, 0, Op::Data);
        grid.set(0, 1, Op::Turn);
        let block = Block::build(&grid, ProgramPointer::initial(), true).unwrap();
        assert_eq!(block.kind, BlockKind::Delta);
        assert_eq!(block.amount, 1);
        assert!(block.zero_succ.is_none());
        let succ = block.nonzero_succ.unwrap();
        assert_eq!(succ.dir, Dir::Right);
        assert!(!succ.zero_assumed);
    }

    #[test]
    fn unset_neighbour_aborts_construction() {
        let grid = Grid::new(2, 2);
        assert!(Block::build(&grid, ProgramPointer::initial(), true).is_none());
    }

    #[test]
    fn store_round_trips_through_unwind() {
        let mut grid = Grid::new(1, 3);
        grid.set(0, 0, Op::Data);
        grid.set(0, 1, Op::Turn);
        let mut store = BlockStore::new();
        let mark = store.mark();
        let key = entry_key();
        assert!(store.ensure(&grid, key, entry_pointer(), true));
        assert!(store.is_finalized(key));
        store.unwind_to(mark);
        assert!(!store.is_finalized(key));
    }
}
