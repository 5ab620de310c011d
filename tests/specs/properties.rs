// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property laws over the execution record hierarchy.

use crate::support::{command_job, rig, Rig};
use muster_adapters::TransportError;
use muster_core::{EngineConfig, ExecuteSpec};
use muster_engine::Caller;
use muster_storage::JobStore;
use proptest::prelude::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    #[allow(clippy::expect_used)]
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .expect("runtime")
        .block_on(future)
}

async fn run_job(rig: &Rig, targets: usize, actions: usize) -> i64 {
    let target_list: Vec<(i64, String, String)> = (1..=targets as i64)
        .map(|i| (i, format!("web-{i:03}"), format!("10.0.0.{i}")))
        .collect();
    for (id, name, host) in &target_list {
        rig.store
            .put_target(muster_core::test_support::linux_target(*id, name, host))
            .await
            .unwrap();
    }
    let commands: Vec<(String, String)> =
        (1..=actions).map(|i| (format!("step-{i}"), format!("echo {i}"))).collect();
    let command_refs: Vec<(&str, &str)> =
        commands.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
    let spec = command_job("prop-job", &command_refs, (1..=targets as i64).collect());
    let caller = Caller::user("prop");
    let detail = rig.service.create_job(spec, &caller).await.unwrap();
    let summary =
        rig.service.execute_job(detail.job.id, ExecuteSpec::default(), &caller).await.unwrap();
    summary.execution_id
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Branch ids of an execution are exactly the dense, zero-padded set
    /// 001..N, and action orders are exactly 1..M.
    #[test]
    fn serial_and_order_density(targets in 1usize..7, actions in 1usize..5) {
        block_on(async {
            let rig = rig(EngineConfig::default());
            let execution_id = run_job(&rig, targets, actions).await;

            let branches = rig.service.get_branches(execution_id).await.unwrap();
            let got: Vec<String> =
                branches.iter().map(|b| b.branch_id.to_string()).collect();
            let expected: Vec<String> = (1..=targets).map(|i| format!("{i:03}")).collect();
            prop_assert_eq!(got, expected);

            for branch in &branches {
                let results = rig.service.get_action_results(execution_id).await.unwrap();
                let mut orders: Vec<u32> = results
                    .iter()
                    .filter(|r| r.branch_id == branch.id)
                    .map(|r| r.action_order)
                    .collect();
                orders.sort_unstable();
                let expected: Vec<u32> = (1..=actions as u32).collect();
                prop_assert_eq!(orders, expected);
            }
            Ok(())
        })?;
    }

    /// Execution numbers are strictly increasing across repeated runs.
    #[test]
    fn execution_numbers_monotonic(runs in 1usize..5) {
        block_on(async {
            let rig = rig(EngineConfig::default());
            rig.seed_targets(&[(1, "web-01", "10.0.0.1")]).await;
            let caller = Caller::user("prop");
            let detail = rig
                .service
                .create_job(command_job("mono", &[("who", "whoami")], vec![1]), &caller)
                .await
                .unwrap();

            let mut numbers = Vec::new();
            for _ in 0..runs {
                let summary = rig
                    .service
                    .execute_job(detail.job.id, ExecuteSpec::default(), &caller)
                    .await
                    .unwrap();
                let execution = rig
                    .service
                    .get_execution(muster_storage::ExecutionRef::Id(summary.execution_id))
                    .await
                    .unwrap();
                numbers.push(execution.execution_number);
            }
            prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]), "numbers {:?}", numbers);
            Ok(())
        })?;
    }

    /// With retries enabled and MAX_RETRIES=k, the transport sees at most
    /// k+1 attempts for one action.
    #[test]
    fn retry_bound(max_retries in 0u32..4) {
        block_on(async {
            let rig = rig(EngineConfig::default().max_retries(max_retries));
            rig.seed_targets(&[(1, "web-01", "10.0.0.1")]).await;
            for _ in 0..=max_retries {
                rig.executor
                    .script_error("10.0.0.1", TransportError::Timeout("read".into()));
            }
            let caller = Caller::user("prop");
            let detail = rig
                .service
                .create_job(command_job("bounded", &[("who", "whoami")], vec![1]), &caller)
                .await
                .unwrap();
            rig.service
                .execute_job(detail.job.id, ExecuteSpec::default(), &caller)
                .await
                .unwrap();

            prop_assert_eq!(
                rig.executor.executions("10.0.0.1"),
                (max_retries + 1) as usize
            );
            Ok(())
        })?;
    }
}

/// No persisted row and no emitted event carries plaintext secrets; only the
/// username may appear.
#[tokio::test(start_paused = true)]
async fn credentials_are_never_persisted() {
    let rig = rig(EngineConfig::default());
    rig.seed_targets(&[(1, "web-01", "10.0.0.1")]).await;
    let caller = Caller::user("alice");
    let detail = rig
        .service
        .create_job(command_job("leaky?", &[("who", "whoami")], vec![1]), &caller)
        .await
        .unwrap();
    let summary =
        rig.service.execute_job(detail.job.id, ExecuteSpec::default(), &caller).await.unwrap();

    // The fixture password from `muster_core::test_support::ssh_method`.
    let secret = "hunter2-fixture";

    let mut haystacks = Vec::new();
    let results = rig.service.get_action_results(summary.execution_id).await.unwrap();
    haystacks.push(serde_json::to_string(&results).unwrap());
    let branches = rig.service.get_branches(summary.execution_id).await.unwrap();
    haystacks.push(serde_json::to_string(&branches).unwrap());
    let logs = rig.service.get_execution_logs(summary.execution_id).await.unwrap();
    haystacks.push(serde_json::to_string(&logs).unwrap());
    haystacks.push(serde_json::to_string(&rig.audit.events()).unwrap());
    for call in rig.notify.calls() {
        haystacks.push(format!("{} {}", call.title, call.message));
    }

    for haystack in &haystacks {
        assert!(!haystack.contains(secret), "secret leaked: {haystack}");
    }
    // The username is allowed in diagnostics and shows up in the logs.
    assert!(haystacks.iter().any(|h| h.contains("ops")));
}
