//! Resume-vector support: fast-forwarding the exhaustive DFS to a
//! previously recorded position (`SPEC_FULL.md` §2, ported from
//! `Resumer.h`/`Resumer.cpp`'s `ResumeFromStack`).
//!
//! The original pops one recorded instruction per depth from a stack built
//! by a prior run; here the same idea is a flat `&[u8]` of rotation amounts,
//! one per search depth, each in `0..3`. A rotation amount `r` at depth `d`
//! records that `ORDER[0..r]` were already fully explored there before the
//! checkpoint was taken, `ORDER[r]` was in progress (recursed into, its own
//! subtree resumed by depth `d+1`'s entry), and `ORDER[r+1..]` hadn't been
//! started. [`ResumeCursor::ops_at`] returns exactly the ops still owed —
//! `3 - r` of them — never the already-done prefix, so a resumed search
//! provably redoes no completed work. The moment a sibling other than
//! index `0` of that list is taken, the path has diverged from the resumed
//! one and ordinary left-to-right search (all three ops) takes over for
//! that subtree.

use bbf_core::Op;

const ORDER: [Op; 3] = [Op::Noop, Op::Data, Op::Turn];

/// All three candidate ops at a fresh (non-resuming) branch point, in the
/// fixed order `spec.md` §4.10 mandates.
#[must_use]
pub const fn all_ops() -> [Op; 3] {
    ORDER
}

/// The ops still owed at a resumed branch point whose checkpoint recorded
/// rotation `rotate`: the in-progress op first, then every op that hadn't
/// been tried yet, in original order. Length is always `3 - (rotate % 3)`;
/// the already-completed prefix before `rotate` is never included.
#[must_use]
pub fn resumed_ops(rotate: u8) -> Vec<Op> {
    let r = usize::from(rotate % 3);
    ORDER[r..].to_vec()
}

/// Tracks progress along a resume vector while the DFS still matches it.
#[derive(Clone, Copy, Debug)]
pub struct ResumeCursor<'a> {
    vector: &'a [u8],
}

impl<'a> ResumeCursor<'a> {
    #[must_use]
    pub fn new(vector: &'a [u8]) -> Self {
        Self { vector }
    }

    /// Ops still owed at `depth` while still on the resumed path: the
    /// in-progress choice plus every not-yet-started one, never the
    /// already-completed prefix.
    #[must_use]
    pub fn ops_at(&self, depth: usize) -> Vec<Op> {
        match self.vector.get(depth) {
            Some(&rotate) => resumed_ops(rotate),
            None => all_ops().to_vec(),
        }
    }

    /// Whether `depth` is still covered by the resume vector.
    #[must_use]
    pub fn covers(&self, depth: usize) -> bool {
        depth < self.vector.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resumed_ops_drops_the_already_completed_prefix() {
        assert_eq!(resumed_ops(0), vec![Op::Noop, Op::Data, Op::Turn]);
        assert_eq!(resumed_ops(1), vec![Op::Data, Op::Turn]);
        assert_eq!(resumed_ops(2), vec![Op::Turn]);
    }

    #[test]
    fn cursor_reports_coverage_by_depth() {
        let cursor = ResumeCursor::new(&[1, 2]);
        assert!(cursor.covers(0));
        assert!(cursor.covers(1));
        assert!(!cursor.covers(2));
    }

    #[test]
    fn cursor_ops_at_a_resumed_depth_matches_resumed_ops() {
        let cursor = ResumeCursor::new(&[2]);
        assert_eq!(cursor.ops_at(0), resumed_ops(2));
    }
}
