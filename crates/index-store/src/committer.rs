/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

pub mod opensearch;

use crate::Mutation;
use crate::MutationBatch;
use crate::TableRef;
use crate::WriteError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;
use tracing::info;

/// Protocol version of the client that originated the base write, forwarded
/// so destination stores can apply version-gated behavior.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
pub struct ClientVersion(u32);

/// Destination-store write strategy. `write` applies a whole grouped batch;
/// a returned error means some per-table write was definitively rejected.
/// `stop` releases the strategy's resources and must tolerate repeated and
/// concurrent calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexCommitter: Send + Sync {
    async fn write(
        &self,
        batch: &MutationBatch,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> Result<(), WriteError>;

    fn stop(&self, reason: &str);
}

/// Data-path client of the primary store, applying one table's mutations
/// as a single call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn write_rows(
        &self,
        table: &TableRef,
        mutations: &[Mutation],
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> anyhow::Result<()>;
}

/// Writes each table group of a batch as its own task over a shared store
/// client, bounded by a concurrency limit. The first definitive per-table
/// failure suppresses tasks not yet started; tasks already in flight run to
/// completion and that first failure is reported.
pub struct ParallelStoreCommitter {
    store: Arc<dyn StoreClient>,
    concurrency: usize,
}

impl ParallelStoreCommitter {
    pub fn new(store: Arc<dyn StoreClient>, concurrency: usize) -> Self {
        Self {
            store,
            // A zero limit would leave every write waiting on the semaphore.
            concurrency: concurrency.max(1),
        }
    }
}

#[async_trait]
impl IndexCommitter for ParallelStoreCommitter {
    async fn write(
        &self,
        batch: &MutationBatch,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> Result<(), WriteError> {
        let failed = Arc::new(AtomicBool::new(false));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (table, mutations) in batch.iter() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore should not be closed");
            if failed.load(Ordering::Acquire) {
                break;
            }
            let store = Arc::clone(&self.store);
            let failed = Arc::clone(&failed);
            let table = table.clone();
            let mutations = mutations.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = store
                    .write_rows(&table, &mutations, allow_local_updates, client_version)
                    .await;
                if let Err(cause) = result {
                    failed.store(true, Ordering::Release);
                    return Err(WriteError::Table { table, cause });
                }
                Ok(())
            });
        }
        let mut result = Ok(());
        while let Some(joined) = tasks.join_next().await {
            let task_result = joined.map_err(WriteError::Worker).and_then(|result| result);
            if result.is_ok() {
                result = task_result;
            }
        }
        result
    }

    fn stop(&self, reason: &str) {
        debug!("stopping the parallel store committer: {reason}");
    }
}

/// Committer that only records what would have been written. Stands in for
/// destinations not wired up in a deployment.
pub struct LoggingCommitter;

#[async_trait]
impl IndexCommitter for LoggingCommitter {
    async fn write(
        &self,
        batch: &MutationBatch,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> Result<(), WriteError> {
        for (table, mutations) in batch.iter() {
            info!(
                "would write {} mutation(s) to table {table} \
                 (allow_local_updates: {allow_local_updates}, client version: {client_version})",
                mutations.len(),
            );
        }
        Ok(())
    }

    fn stop(&self, reason: &str) {
        debug!("stopping the logging committer: {reason}");
    }
}
