// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for workspace specs: the full service wired to the in-memory
//! store, scriptable transports, and recording sinks.

use muster_adapters::{
    ExecutorRegistry, FakeDecryptor, FakeExecutor, RecordingAuditSink, RecordingNotifySink,
};
use muster_core::test_support::linux_target;
use muster_core::{ActionSpec, EngineConfig, FakeClock, JobSpec};
use muster_engine::{EngineDeps, JobService};
use muster_storage::{JobStore, MemoryStore};
use std::sync::Arc;

pub struct Rig {
    pub store: Arc<MemoryStore<FakeClock>>,
    pub executor: FakeExecutor,
    pub audit: RecordingAuditSink,
    pub notify: RecordingNotifySink,
    pub clock: FakeClock,
    pub service: JobService<FakeClock>,
}

pub fn rig(config: EngineConfig) -> Rig {
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
    let service = JobService::new(deps);
    Rig { store, executor, audit, notify, clock, service }
}

impl Rig {
    /// Seed `(id, name, host)` targets reachable over ssh with passwords.
    pub async fn seed_targets(&self, targets: &[(i64, &str, &str)]) {
        for &(id, name, host) in targets {
            self.store.put_target(linux_target(id, name, host)).await.unwrap();
        }
    }
}

/// A command job spec over the given targets.
pub fn command_job(
    name: &str,
    commands: &[(&str, &str)],
    target_ids: Vec<i64>,
) -> JobSpec {
    let actions = commands.iter().map(|&(n, c)| ActionSpec::command(n, c)).collect();
    JobSpec::new(name).actions(actions).target_ids(target_ids)
}
