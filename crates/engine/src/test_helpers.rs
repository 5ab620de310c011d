// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for engine tests: in-memory store, scriptable transport, and
//! recording sinks wired into one `EngineDeps`.

use crate::deps::EngineDeps;
use muster_adapters::{
    ExecutorRegistry, FakeDecryptor, FakeExecutor, RecordingAuditSink, RecordingNotifySink,
};
use muster_core::test_support::linux_target;
use muster_core::{ActionSpec, EngineConfig, ExecuteSpec, FakeClock, JobSpec};
use muster_storage::{ExecutionPlan, JobDetail, JobStore, MemoryStore};
use std::sync::Arc;

pub(crate) struct Rig {
    pub store: Arc<MemoryStore<FakeClock>>,
    pub executor: FakeExecutor,
    pub audit: RecordingAuditSink,
    pub notify: RecordingNotifySink,
    pub clock: FakeClock,
    pub deps: Arc<EngineDeps<FakeClock>>,
}

/// Build a rig with an `ssh` and a `winrm` fake transport registered.
pub(crate) fn rig(config: EngineConfig) -> Rig {
    let clock = FakeClock::new();
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let executor = FakeExecutor::ssh();
    let audit = RecordingAuditSink::new();
    let notify = RecordingNotifySink::new();
    let registry = ExecutorRegistry::new()
        .with(Arc::new(executor.clone()))
        .with(Arc::new(FakeExecutor::new("winrm", 5985)));
    let deps = Arc::new(EngineDeps {
        store: Arc::clone(&store) as Arc<dyn JobStore>,
        executors: Arc::new(registry),
        decryptor: Arc::new(FakeDecryptor::new()),
        audit: Arc::new(audit.clone()),
        notifier: Arc::new(notify.clone()),
        config,
        clock: clock.clone(),
    });
    Rig { store, executor, audit, notify, clock, deps }
}

impl Rig {
    /// Seed `(id, name, host)` targets reachable over ssh with passwords.
    pub(crate) async fn seed_targets(&self, targets: &[(i64, &str, &str)]) {
        for &(id, name, host) in targets {
            self.store.put_target(linux_target(id, name, host)).await.unwrap();
        }
    }

    /// Create a command job over the given targets.
    pub(crate) async fn job(
        &self,
        commands: &[(&str, &str)],
        target_ids: Vec<i64>,
    ) -> JobDetail {
        let actions =
            commands.iter().map(|&(name, cmd)| ActionSpec::command(name, cmd)).collect();
        let spec = JobSpec::new("test-job").actions(actions).target_ids(target_ids);
        self.store.create_job(spec, "u-tests").await.unwrap()
    }

    /// Create a job, begin an execution, and load its plan.
    pub(crate) async fn plan(
        &self,
        commands: &[(&str, &str)],
        target_ids: Vec<i64>,
    ) -> ExecutionPlan {
        let detail = self.job(commands, target_ids).await;
        let execution =
            self.store.begin_execution(detail.job.id, ExecuteSpec::default()).await.unwrap();
        self.store.load_execution_plan(execution.id).await.unwrap()
    }
}
