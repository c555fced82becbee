//! The 2D program grid, instruction alphabet, and program pointer.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// One cell of the program grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    #[default]
    Unset,
    Noop,
    Data,
    Turn,
}

impl Op {
    /// The character used by the textual encoding (`bbf-format`) for this op.
    #[must_use]
    pub const fn plain_char(self) -> char {
        match self {
            Op::Unset => '?',
            Op::Noop => '_',
            Op::Data => 'o',
            Op::Turn => '*',
        }
    }

    /// Inverse of [`Op::plain_char`].
    #[must_use]
    pub const fn from_plain_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Op::Unset),
            '_' => Some(Op::Noop),
            'o' => Some(Op::Data),
            '*' => Some(Op::Turn),
            _ => None,
        }
    }
}

/// Program pointer direction. Numeric values match the original C++ source
/// (`Up=0, Right=1, Down=2, Left=3`) so that `(dir + 1) % 4` is a clockwise
/// turn and `(dir + 3) % 4` is counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Dir {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Dir {
    /// All four directions in their canonical order.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    #[must_use]
    pub const fn from_u8(v: u8) -> Self {
        match v & 0x3 {
            0 => Dir::Up,
            1 => Dir::Right,
            2 => Dir::Down,
            _ => Dir::Left,
        }
    }

    /// Turn taken when the cell under the head is zero.
    #[must_use]
    pub const fn turn_ccw(self) -> Self {
        Self::from_u8(self as u8 + 3)
    }

    /// Turn taken when the cell under the head is non-zero.
    #[must_use]
    pub const fn turn_cw(self) -> Self {
        Self::from_u8(self as u8 + 1)
    }

    /// Grid-cell delta `(dcol, drow)` for a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, 1),
            Dir::Right => (1, 0),
            Dir::Down => (0, -1),
            Dir::Left => (-1, 0),
        }
    }
}

/// A grid-cell coordinate. Signed so that the sentinel row `-1` (used to seed
/// the initial program pointer, see `spec.md` §4.1) and one-past-the-edge
/// coordinates (used to detect falling off the grid) are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPointer {
    pub col: i32,
    pub row: i32,
}

impl InstructionPointer {
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// Program pointer: a grid position plus a direction of travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPointer {
    pub p: InstructionPointer,
    pub dir: Dir,
}

impl ProgramPointer {
    #[must_use]
    pub const fn new(col: i32, row: i32, dir: Dir) -> Self {
        Self {
            p: InstructionPointer::new(col, row),
            dir,
        }
    }

    /// The program pointer that seeds a fresh run: one row below the grid,
    /// facing up, so the very first step lands on `(0, 0)`.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(0, -1, Dir::Up)
    }

    /// The grid cell reached by advancing one step in the current direction.
    /// Does not check bounds — see [`Grid::cell_at`].
    #[must_use]
    pub fn next_cell(self) -> InstructionPointer {
        let (dc, dr) = self.dir.delta();
        InstructionPointer::new(self.p.col + dc, self.p.row + dr)
    }

    /// Two program pointers match iff position and direction are identical.
    #[must_use]
    pub fn matches(self, other: Self) -> bool {
        self == other
    }
}

/// W×H array of [`Op`] cells. `W, H <= 8` per `spec.md`'s scope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    width: u8,
    height: u8,
    cells: Vec<Op>,
}

impl Grid {
    #[must_use]
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![Op::Unset; usize::from(width) * usize::from(height)],
        }
    }

    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    fn index(&self, col: i32, row: i32) -> usize {
        debug_assert!(self.in_bounds(col, row));
        col as usize + row as usize * usize::from(self.width)
    }

    /// Whether `(col, row)` is a real grid cell (not off-grid).
    #[must_use]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < i32::from(self.width) && row < i32::from(self.height)
    }

    /// Reads a cell, returning `None` when `(col, row)` falls off the grid —
    /// the "program terminates" condition of `spec.md` §3/§4.1.
    #[must_use]
    pub fn cell_at(&self, ip: InstructionPointer) -> Option<Op> {
        if self.in_bounds(ip.col, ip.row) {
            Some(self.cells[self.index(ip.col, ip.row)])
        } else {
            None
        }
    }

    #[must_use]
    pub fn get(&self, col: i32, row: i32) -> Op {
        self.cells[self.index(col, row)]
    }

    pub fn set(&mut self, col: i32, row: i32, op: Op) {
        let idx = self.index(col, row);
        self.cells[idx] = op;
    }

    pub fn clear(&mut self, col: i32, row: i32) {
        self.set(col, row, Op::Unset);
    }

    /// Cell-major textual dump, bottom row first — matches the original
    /// `Program::dump()` layout (`spec.md` leaves the on-screen form out of
    /// scope but the ops-as-chars mapping is shared with `bbf-format`).
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        let mut s = String::with_capacity(self.cells.len());
        for row in (0..i32::from(self.height)).rev() {
            for col in 0..i32::from(self.width) {
                s.push(self.get(col, row).plain_char());
            }
        }
        s
    }

    /// Inverse of [`to_plain_string`](Self::to_plain_string): parses a
    /// newline-separated grid, one row per line, bottom row first, using
    /// the same four op characters.
    ///
    /// # Errors
    /// Returns an error if there are no rows, the rows aren't all the same
    /// width, the grid exceeds `MAX_DIM` in either dimension, or a
    /// character isn't one of the four op characters.
    pub fn from_plain_rows(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        ensure!(!rows.is_empty(), "grid text has no rows");
        let width = rows[0].chars().count();
        ensure!(width > 0 && width <= crate::block::MAX_DIM, "row width {width} out of range");
        let height = rows.len();
        ensure!(height <= crate::block::MAX_DIM, "grid height {height} exceeds maximum");
        for r in &rows {
            ensure!(r.chars().count() == width, "rows have inconsistent width");
        }

        let width = u8::try_from(width).expect("checked against MAX_DIM above");
        let height = u8::try_from(height).expect("checked against MAX_DIM above");
        let mut grid = Self::new(width, height);
        for (line_idx, line) in rows.iter().enumerate() {
            let row = i32::try_from(height).expect("height fits i32") - 1 - i32::try_from(line_idx).expect("line index fits i32");
            for (col, c) in line.chars().enumerate() {
                let op = Op::from_plain_char(c).ok_or_else(|| anyhow::anyhow!("unrecognized op character {c:?}"))?;
                grid.set(i32::try_from(col).expect("col fits i32"), row, op);
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_rotation_matches_clock_convention() {
        assert_eq!(Dir::Up.turn_cw(), Dir::Right);
        assert_eq!(Dir::Right.turn_cw(), Dir::Down);
        assert_eq!(Dir::Up.turn_ccw(), Dir::Left);
        assert_eq!(Dir::Left.turn_ccw(), Dir::Down);
    }

    #[test]
    fn grid_reports_off_grid_as_none() {
        let g = Grid::new(3, 3);
        assert_eq!(g.cell_at(InstructionPointer::new(0, 0)), Some(Op::Unset));
        assert_eq!(g.cell_at(InstructionPointer::new(-1, 0)), None);
        assert_eq!(g.cell_at(InstructionPointer::new(3, 0)), None);
        assert_eq!(g.cell_at(InstructionPointer::new(0, 3)), None);
    }

    #[test]
    fn initial_pointer_steps_onto_origin() {
        let pp = ProgramPointer::initial();
        assert_eq!(pp.next_cell(), InstructionPointer::new(0, 0));
    }

    #[test]
    fn plain_rows_round_trip_through_to_plain_string() {
        let mut grid = Grid::new(2, 2);
        grid.set(0, 0, Op::Turn);
        grid.set(1, 0, Op::Data);
        grid.set(0, 1, Op::Noop);
        grid.set(1, 1, Op::Unset);

        let rows: String = grid
            .to_plain_string()
            .chars()
            .collect::<Vec<_>>()
            .chunks(usize::from(grid.width()))
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        let back = Grid::from_plain_rows(&rows).unwrap();
        for col in 0..2 {
            for row in 0..2 {
                assert_eq!(back.get(col, row), grid.get(col, row));
            }
        }
    }

    #[test]
    fn plain_rows_rejects_inconsistent_widths() {
        assert!(Grid::from_plain_rows("??\n?").is_err());
    }
}
