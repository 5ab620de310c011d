// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ExecutionStatus::{Cancelled, Completed, Failed, Running, Scheduled};
use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    all_completed = { vec![Completed, Completed], Completed },
    one_failed = { vec![Completed, Failed], Failed },
    failed_beats_cancelled = { vec![Failed, Cancelled], Failed },
    all_cancelled = { vec![Cancelled, Cancelled], Cancelled },
    completed_and_cancelled = { vec![Completed, Cancelled], Cancelled },
    still_running = { vec![Completed, Running], Running },
    scheduled_is_open = { vec![Scheduled], Running },
    empty = { vec![], Completed },
)]
fn roll_up_cases(branches: Vec<ExecutionStatus>, expected: ExecutionStatus) {
    assert_eq!(roll_up(branches), expected);
}

#[test]
fn tally_counts_terminal_states() {
    let counts = TargetCounts::tally(vec![Completed, Failed, Cancelled, Completed]);
    assert_eq!(
        counts,
        TargetCounts { total: 4, successful: 2, failed: 1, cancelled: 1 }
    );
}

#[test]
fn tally_open_branches_only_hit_total() {
    let counts = TargetCounts::tally(vec![Running, Completed]);
    assert_eq!(counts.total, 2);
    assert_eq!(counts.successful, 1);
    assert_eq!(counts.failed + counts.cancelled, 0);
}

fn arb_terminal_status() -> impl Strategy<Value = ExecutionStatus> {
    prop_oneof![Just(Completed), Just(Failed), Just(Cancelled)]
}

proptest! {
    /// Rollup of terminal branches is completed iff every branch completed,
    /// and failed iff at least one branch failed.
    #[test]
    fn roll_up_law(branches in proptest::collection::vec(arb_terminal_status(), 1..16)) {
        let rolled = roll_up(branches.iter().copied());
        prop_assert_eq!(rolled == Completed, branches.iter().all(|b| *b == Completed));
        prop_assert_eq!(rolled == Failed, branches.iter().any(|b| *b == Failed));
    }

    /// Tally partitions the branch set: terminal counts sum to the total.
    #[test]
    fn tally_partitions(branches in proptest::collection::vec(arb_terminal_status(), 0..16)) {
        let counts = TargetCounts::tally(branches.clone());
        prop_assert_eq!(counts.total as usize, branches.len());
        prop_assert_eq!(counts.successful + counts.failed + counts.cancelled, counts.total);
    }
}
