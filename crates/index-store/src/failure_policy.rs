/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::MutationBatch;
use crate::WriteError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use tracing::error;
use tracing::warn;

/// Recovery strategy invoked after a definitive index write failure. The
/// failed batch is handed over intact so a policy can retry, spill or
/// escalate. `stop` must tolerate repeated calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FailurePolicy: Send + Sync {
    async fn handle_failure(&self, batch: &MutationBatch, cause: &WriteError);

    fn stop(&self, reason: &str);
}

/// Process-termination seam so the kill-server policy stays testable.
#[cfg_attr(test, mockall::automock)]
pub trait ServerKill: Send + Sync {
    fn kill(&self, reason: &str);
}

/// Aborts the hosting process. The default kill target in production.
pub struct AbortProcess;

impl ServerKill for AbortProcess {
    fn kill(&self, reason: &str) {
        error!("aborting the server process: {reason}");
        std::process::abort();
    }
}

/// Escalates an index write failure to a server kill. An index permanently
/// out of sync with its base table is worse than a restart, since replaying
/// the write-ahead log repairs the index while a silent divergence does not.
pub struct KillServerOnFailurePolicy {
    server: Arc<dyn ServerKill>,
}

impl KillServerOnFailurePolicy {
    pub fn new(server: Arc<dyn ServerKill>) -> Self {
        Self { server }
    }
}

impl Default for KillServerOnFailurePolicy {
    fn default() -> Self {
        Self::new(Arc::new(AbortProcess))
    }
}

#[async_trait]
impl FailurePolicy for KillServerOnFailurePolicy {
    async fn handle_failure(&self, batch: &MutationBatch, cause: &WriteError) {
        error!(
            "index write of {} mutation(s) to {} table(s) failed definitively: {cause}",
            batch.mutation_count(),
            batch.table_count(),
        );
        self.server
            .kill(&format!("unrecoverable index write failure: {cause}"));
    }

    fn stop(&self, reason: &str) {
        debug!("stopping the kill-server failure policy: {reason}");
    }
}

/// Logs the failure and keeps the server alive. Leaves the index out of
/// sync; only for deployments that repair indexes out of band.
pub struct LoggingFailurePolicy;

#[async_trait]
impl FailurePolicy for LoggingFailurePolicy {
    async fn handle_failure(&self, batch: &MutationBatch, cause: &WriteError) {
        warn!(
            "ignoring failed index write of {} mutation(s) to {} table(s): {cause}",
            batch.mutation_count(),
            batch.table_count(),
        );
    }

    fn stop(&self, reason: &str) {
        debug!("stopping the logging failure policy: {reason}");
    }
}
