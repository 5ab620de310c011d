// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs all actions of one job against one target.
//!
//! One branch is one task: select the communication method, resolve
//! credentials, then walk the actions in order, each attempt governed by the
//! retry policy. A fatal failure (or exhausted retries) short-circuits the
//! remaining actions of this branch only; peers are untouched.

use crate::deps::EngineDeps;
use crate::error::EngineError;
use crate::retry::{Classification, RetryPolicy};
use chrono::{DateTime, Utc};
use muster_adapters::{
    resolve, CommandOutput, RemoteExecutor, RemoteSession, ResolvedCredential, TransportError,
};
use muster_core::{
    Action, ActionStatus, Branch, Clock, Execution, ExecutionStatus, LogCategory, LogLevel,
    LogPhase, Target,
};
use muster_storage::{BranchOutcome, NewActionResult, NewExecutionLog};
use tokio_util::sync::CancellationToken;

pub(crate) async fn run_branch<C: Clock>(
    deps: &EngineDeps<C>,
    execution: &Execution,
    branch: &Branch,
    target: Option<&Target>,
    actions: &[Action],
    policy: &RetryPolicy,
    token: &CancellationToken,
) -> Result<ExecutionStatus, EngineError> {
    let ctx = Ctx { deps, execution, branch };

    let Some(target) = target else {
        let message = format!("target {} not found", branch.target_id);
        ctx.log(LogPhase::TargetSelection, LogLevel::Error, LogCategory::System, &message).await;
        return ctx.fail(message, None).await;
    };
    ctx.log(
        LogPhase::TargetSelection,
        LogLevel::Info,
        LogCategory::System,
        &format!("Selected target: {}", target.name),
    )
    .await;

    let Some(method) = target.primary_method() else {
        let message = "no communication method".to_owned();
        ctx.log(LogPhase::TargetSelection, LogLevel::Error, LogCategory::System, &message).await;
        return ctx.fail(message, None).await;
    };

    let credential = match resolve(deps.decryptor.as_ref(), method).await {
        Ok(credential) => credential,
        Err(error) => {
            let message = format!("authentication failed: {error}");
            ctx.log(
                LogPhase::Authentication,
                LogLevel::Error,
                LogCategory::Authentication,
                &message,
            )
            .await;
            if let Some(action) = actions.first() {
                ctx.record_failure(action, deps.clock.now(), message.clone(), None, None).await?;
            }
            return ctx.fail(message, None).await;
        }
    };
    ctx.log(
        LogPhase::Authentication,
        LogLevel::Info,
        LogCategory::Authentication,
        &format!("Resolved credentials for user {}", credential.username()),
    )
    .await;

    // Transport configuration failures are fatal before any attempt is made.
    let endpoint = deps.executors.get(&method.method_type).and_then(|executor| {
        let host = method
            .host()
            .map(str::to_owned)
            .ok_or_else(|| TransportError::MalformedHost("method config has no host".into()))?;
        let port = method.port().unwrap_or_else(|| executor.default_port());
        Ok((executor, host, port))
    });
    let (executor, host, port) = match endpoint {
        Ok(endpoint) => endpoint,
        Err(error) => {
            let message = error.to_string();
            ctx.log(LogPhase::Communication, LogLevel::Error, LogCategory::Communication, &message)
                .await;
            if let Some(action) = actions.first() {
                ctx.record_failure(action, deps.clock.now(), message.clone(), None, None).await?;
            }
            return ctx.fail(message, None).await;
        }
    };
    ctx.log(
        LogPhase::Communication,
        LogLevel::Info,
        LogCategory::Communication,
        &format!("Connecting to {host}:{port} via {}", method.method_type),
    )
    .await;

    let mut session: Option<Box<dyn RemoteSession>> = None;
    let mut completed_count: usize = 0;

    for action in actions {
        if token.is_cancelled() {
            return ctx.cancel(action, deps.clock.now()).await;
        }
        let Some(command) = action.kind.command().map(str::to_owned) else {
            let message = format!("unsupported action type: {}", action.kind.action_type());
            ctx.record_failure(action, deps.clock.now(), message.clone(), None, None).await?;
            return ctx.fail(message, None).await;
        };

        let started_at = deps.clock.now();
        let mut retry_index: u32 = 0;
        loop {
            let attempted = attempt(
                deps,
                executor.as_ref(),
                &mut session,
                &host,
                port,
                &credential,
                &command,
                token,
            )
            .await;
            let outcome = match attempted {
                Attempt::Cancelled => return ctx.cancel(action, started_at).await,
                Attempt::Outcome(outcome) => outcome,
            };

            match policy.classify(outcome) {
                Classification::Success(output) => {
                    ctx.record_success(action, started_at, &output, &command).await?;
                    ctx.log(
                        LogPhase::ActionExecution,
                        LogLevel::Info,
                        LogCategory::CommandExecution,
                        &format!(
                            "Action {} '{}' completed with exit code 0",
                            action.action_order, action.name
                        ),
                    )
                    .await;
                    completed_count += 1;
                    break;
                }
                Classification::CommandFailed(output) => {
                    ctx.record_failure(
                        action,
                        started_at,
                        command_error(&output),
                        Some(&output),
                        Some(&command),
                    )
                    .await?;
                    let summary = format!("1 of {} actions failed.", completed_count + 1);
                    return ctx.fail(summary, Some(output.exit_code)).await;
                }
                Classification::Fatal(error) => {
                    let message = if error.is_authentication() {
                        format!("authentication failed: {error}")
                    } else {
                        error.to_string()
                    };
                    ctx.record_failure(action, started_at, message.clone(), None, Some(&command))
                        .await?;
                    return ctx.fail(message, None).await;
                }
                Classification::Retriable(error) => {
                    if retry_index >= policy.max_retries() {
                        let message =
                            format!("failed after {} retries: {error}", policy.max_retries());
                        ctx.record_failure(
                            action,
                            started_at,
                            message.clone(),
                            None,
                            Some(&command),
                        )
                        .await?;
                        return ctx.fail(message, None).await;
                    }
                    let delay = policy.backoff(retry_index);
                    retry_index += 1;
                    tracing::warn!(
                        branch = %branch.serial,
                        action = action.action_order,
                        attempt = retry_index,
                        delay_s = delay.as_secs_f64(),
                        error = %error,
                        "retriable failure, backing off"
                    );
                    tokio::select! {
                        _ = token.cancelled() => return ctx.cancel(action, started_at).await,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    if let Some(mut open) = session.take() {
        open.close().await;
    }
    let branch_row = deps
        .store
        .complete_branch(
            branch.id,
            BranchOutcome::completed(format!("Executed {} actions", completed_count)),
        )
        .await?;
    ctx.log(
        LogPhase::Completion,
        LogLevel::Info,
        LogCategory::CommandExecution,
        &format!("Branch {} completed", branch.branch_id),
    )
    .await;
    Ok(branch_row.status)
}

/// Result of one connect-and-execute attempt.
enum Attempt {
    Outcome(Result<CommandOutput, TransportError>),
    Cancelled,
}

/// Establish the session if needed, then run the command. The session is
/// invalidated after any transport error so the next attempt reconnects.
#[allow(clippy::too_many_arguments)]
async fn attempt<C: Clock>(
    deps: &EngineDeps<C>,
    executor: &dyn RemoteExecutor,
    session: &mut Option<Box<dyn RemoteSession>>,
    host: &str,
    port: u16,
    credential: &ResolvedCredential,
    command: &str,
    token: &CancellationToken,
) -> Attempt {
    let connect_timeout = deps.config.connection_timeout;
    let command_timeout = deps.config.command_timeout;

    if session.is_none() {
        let connected = tokio::select! {
            _ = token.cancelled() => return Attempt::Cancelled,
            result = tokio::time::timeout(
                connect_timeout,
                executor.connect(host, port, credential, connect_timeout),
            ) => result,
        };
        match connected {
            Ok(Ok(open)) => *session = Some(open),
            Ok(Err(error)) => return Attempt::Outcome(Err(error)),
            Err(_) => {
                return Attempt::Outcome(Err(TransportError::Timeout(format!(
                    "connection to {host}:{port} timed out after {}s",
                    connect_timeout.as_secs()
                ))));
            }
        }
    }

    let ran = {
        let Some(open) = session.as_mut() else {
            return Attempt::Outcome(Err(TransportError::Other("no open session".into())));
        };
        tokio::select! {
            _ = token.cancelled() => None,
            result = tokio::time::timeout(command_timeout, open.execute(command, command_timeout)) => {
                Some(result)
            }
        }
    };
    match ran {
        None => {
            *session = None;
            Attempt::Cancelled
        }
        Some(Ok(Ok(output))) => Attempt::Outcome(Ok(output)),
        Some(Ok(Err(error))) => {
            *session = None;
            Attempt::Outcome(Err(error))
        }
        Some(Err(_)) => {
            *session = None;
            Attempt::Outcome(Err(TransportError::Timeout(format!(
                "command timed out after {}s",
                command_timeout.as_secs()
            ))))
        }
    }
}

fn command_error(output: &CommandOutput) -> String {
    if output.stderr.is_empty() {
        format!("command exited with code {}", output.exit_code)
    } else {
        output.stderr.clone()
    }
}

/// Per-branch helpers over the shared deps.
struct Ctx<'a, C: Clock> {
    deps: &'a EngineDeps<C>,
    execution: &'a Execution,
    branch: &'a Branch,
}

impl<C: Clock> Ctx<'_, C> {
    async fn log(&self, phase: LogPhase, level: LogLevel, category: LogCategory, message: &str) {
        self.deps
            .log_execution(NewExecutionLog {
                execution_id: self.execution.id,
                branch_id: Some(self.branch.id),
                phase,
                level,
                category,
                message: message.to_owned(),
                details: None,
            })
            .await;
    }

    async fn record_success(
        &self,
        action: &Action,
        started_at: DateTime<Utc>,
        output: &CommandOutput,
        command: &str,
    ) -> Result<(), EngineError> {
        let completed_at = self.deps.clock.now();
        let capture = action.kind.capture_output();
        // Error text is recorded unconditionally; only stdout is gated by
        // the action's capture setting.
        let result_error = (!output.stderr.is_empty()).then(|| output.stderr.clone());
        self.deps
            .store
            .record_action_result(
                self.branch.id,
                NewActionResult {
                    action_id: action.id,
                    action_order: action.action_order,
                    action_name: action.name.clone(),
                    action_type: action.kind.action_type().to_owned(),
                    status: ActionStatus::Completed,
                    started_at,
                    completed_at: Some(completed_at),
                    execution_time_ms: elapsed_ms(started_at, completed_at),
                    result_output: capture.then(|| output.stdout.clone()),
                    result_error,
                    exit_code: Some(output.exit_code),
                    command_executed: Some(command.to_owned()),
                },
            )
            .await?;
        Ok(())
    }

    /// Record a terminal failed result. Errors are captured regardless of the
    /// action's output-capture setting; stdout stays gated by it.
    async fn record_failure(
        &self,
        action: &Action,
        started_at: DateTime<Utc>,
        error: String,
        output: Option<&CommandOutput>,
        command: Option<&str>,
    ) -> Result<(), EngineError> {
        let completed_at = self.deps.clock.now();
        let capture = action.kind.capture_output();
        self.deps
            .store
            .record_action_result(
                self.branch.id,
                NewActionResult {
                    action_id: action.id,
                    action_order: action.action_order,
                    action_name: action.name.clone(),
                    action_type: action.kind.action_type().to_owned(),
                    status: ActionStatus::Failed,
                    started_at,
                    completed_at: Some(completed_at),
                    execution_time_ms: elapsed_ms(started_at, completed_at),
                    result_output: output
                        .filter(|_| capture)
                        .map(|o| o.stdout.clone())
                        .filter(|s| !s.is_empty()),
                    result_error: Some(error),
                    exit_code: output.map(|o| o.exit_code),
                    command_executed: command.map(str::to_owned),
                },
            )
            .await?;
        Ok(())
    }

    async fn fail(
        &self,
        error: String,
        exit_code: Option<i32>,
    ) -> Result<ExecutionStatus, EngineError> {
        let branch = self
            .deps
            .store
            .complete_branch(self.branch.id, BranchOutcome::failed(error.clone(), exit_code))
            .await?;
        self.log(
            LogPhase::Completion,
            LogLevel::Error,
            LogCategory::CommandExecution,
            &format!("Branch {} failed: {error}", self.branch.branch_id),
        )
        .await;
        Ok(branch.status)
    }

    /// Record the current action as failed with reason `cancelled` and mark
    /// the branch cancelled.
    async fn cancel(
        &self,
        action: &Action,
        started_at: DateTime<Utc>,
    ) -> Result<ExecutionStatus, EngineError> {
        self.record_failure(action, started_at, "cancelled".to_owned(), None, action.kind.command())
            .await?;
        let branch = self
            .deps
            .store
            .complete_branch(self.branch.id, BranchOutcome::cancelled("cancelled"))
            .await?;
        self.log(
            LogPhase::Completion,
            LogLevel::Warn,
            LogCategory::CommandExecution,
            &format!("Branch {} cancelled", self.branch.branch_id),
        )
        .await;
        Ok(branch.status)
    }
}

fn elapsed_ms(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Option<u64> {
    u64::try_from((completed_at - started_at).num_milliseconds()).ok()
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
