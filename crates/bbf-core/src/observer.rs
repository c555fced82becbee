//! Progress-callback taxonomy shared by the scheduler and the fast-replay
//! executor (`SPEC_FULL.md` §2, ported from `ProgressTracker.h`'s
//! `reportDone`/`reportError`/`reportDetectedHang`/`reportAssumedHang`/
//! `reportFastExecution`/`reportLateEscape`).
//!
//! `spec.md` §1 treats progress reporting as an external collaborator of the
//! core; this trait is the seam it plugs into. Every method has a no-op
//! default so a caller only implements what it cares about.

/// Receives one terminal call per branch explored by the searcher, or per
/// replay run executed by the fast executor.
pub trait SearchObserver {
    /// A branch ran to completion (walked off the grid) after `total_steps`.
    fn on_done(&mut self, _total_steps: u64) {}

    /// A branch ended in a [`crate::tape::DataError`].
    fn on_error(&mut self) {}

    /// A branch was classified as hanging. `early` distinguishes a detector
    /// actually firing from the per-run step budget being exhausted
    /// (`spec.md` §7's `AssumedHang`, reported here as `early = false`).
    fn on_hang(&mut self, _early: bool) {}

    /// The block-graph replay executor ran one finalized program
    /// end-to-end (`SPEC_FULL.md`'s supplemented callback).
    fn on_fast_execution(&mut self) {}

    /// Block-graph replay reached a successor the compiler can't resolve
    /// without an `Unset` cell (`spec.md` §7's `LateEscape`). Carries the
    /// step count accumulated before the escape.
    fn on_late_escape(&mut self, _num_steps: u64) {}
}

/// An observer that does nothing; the default when a caller has no use for
/// progress callbacks (e.g. a library embedding the searcher in a larger
/// pipeline that only cares about the final report).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SearchObserver for NullObserver {}

/// Logs every callback through `tracing`, at the level its original C++
/// counterpart treated it: done/error/hang at `debug`, late escape at
/// `warn` (it means the search result for that branch is not fully
/// verified by fast replay).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_done(&mut self, total_steps: u64) {
        tracing::debug!(total_steps, "branch done");
    }

    fn on_error(&mut self) {
        tracing::debug!("branch data error");
    }

    fn on_hang(&mut self, early: bool) {
        tracing::debug!(early, "branch hang");
    }

    fn on_fast_execution(&mut self) {
        tracing::debug!("fast execution completed");
    }

    fn on_late_escape(&mut self, num_steps: u64) {
        tracing::warn!(num_steps, "fast replay late escape");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        done: u32,
    }

    impl SearchObserver for Counting {
        fn on_done(&mut self, _total_steps: u64) {
            self.done += 1;
        }
    }

    #[test]
    fn default_methods_are_no_ops_for_unimplemented_callbacks() {
        let mut c = Counting::default();
        c.on_error();
        c.on_hang(true);
        c.on_done(42);
        assert_eq!(c.done, 1);
    }
}
