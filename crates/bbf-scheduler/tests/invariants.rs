//! Invariants for the exhaustive searcher: resume vectors only fast-forward
//! past already-explored branches, and the step histogram always accounts
//! for every completed run.

use bbf_core::{NullObserver, SearchConfig};
use bbf_scheduler::run_search;

#[test]
fn resuming_past_the_first_branch_finds_no_worse_a_result() {
    let cfg = SearchConfig::new(2, 2, 64, 256, 100_000, 8).unwrap();

    let mut baseline_observer = NullObserver;
    let baseline = run_search(cfg, None, &mut baseline_observer);

    // Skip the first op choice at depth 0 (resume past Noop, leaving Data
    // and Turn still to explore) by recording a single non-zero rotation.
    let mut resumed_observer = NullObserver;
    let resumed = run_search(cfg, Some(&[1]), &mut resumed_observer);

    assert!(resumed.total_done <= baseline.total_done);
    assert!(resumed.best_steps <= baseline.best_steps || resumed.total_done == 0);
}

#[test]
fn histogram_total_matches_completed_run_count() {
    let cfg = SearchConfig::new(2, 1, 64, 256, 100_000, 8).unwrap();
    let mut observer = NullObserver;
    let report = run_search(cfg, None, &mut observer);

    assert_eq!(report.histogram.total(), report.total_done);
}

#[test]
fn an_exhausted_total_budget_is_reported_on_the_report() {
    // A tiny total budget forces early termination well before the 2x2
    // grid's search space is exhausted.
    let cfg = SearchConfig::new(2, 2, 64, 8, 16, 8).unwrap();
    let mut observer = NullObserver;
    let report = run_search(cfg, None, &mut observer);
    assert!(report.total_budget_exceeded);
}
