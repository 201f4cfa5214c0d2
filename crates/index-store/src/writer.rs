/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::ClientVersion;
use crate::Config;
use crate::FailurePolicyKind;
use crate::Metrics;
use crate::Mutation;
use crate::MutationBatch;
use crate::TableName;
use crate::WriteError;
use crate::classify;
use crate::classify::TableMetadataProvider;
use crate::committer::IndexCommitter;
use crate::committer::LoggingCommitter;
use crate::committer::ParallelStoreCommitter;
use crate::committer::StoreClient;
use crate::committer::opensearch::OpenSearchCommitter;
use crate::failure_policy::FailurePolicy;
use crate::failure_policy::KillServerOnFailurePolicy;
use crate::failure_policy::LoggingFailurePolicy;
use crate::metrics::EXTERNAL_DESTINATION;
use crate::metrics::INTERNAL_DESTINATION;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tracing::debug;
use tracing::error;

/// Coordinates one index write batch end to end: grouping, destination
/// classification, the internal and external committers and the failure
/// policy. Collaborators are injected at construction and never change for
/// the writer's lifetime.
pub struct IndexWriter {
    committer: Arc<dyn IndexCommitter>,
    external_committer: Arc<dyn IndexCommitter>,
    failure_policy: Arc<dyn FailurePolicy>,
    metadata: Arc<dyn TableMetadataProvider>,
    metrics: Arc<Metrics>,
    stopped: AtomicBool,
}

impl IndexWriter {
    pub fn new(
        committer: Arc<dyn IndexCommitter>,
        external_committer: Arc<dyn IndexCommitter>,
        failure_policy: Arc<dyn FailurePolicy>,
        metadata: Arc<dyn TableMetadataProvider>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            committer,
            external_committer,
            failure_policy,
            metadata,
            metrics,
            stopped: AtomicBool::new(false),
        }
    }

    /// Assembles the production wiring: a parallel committer over the
    /// primary store, an OpenSearch committer when an address is configured
    /// and the configured failure policy.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn StoreClient>,
        metadata: Arc<dyn TableMetadataProvider>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let committer = Arc::new(ParallelStoreCommitter::new(
            store,
            config.writer_concurrency,
        ));
        let external_committer: Arc<dyn IndexCommitter> = match &config.opensearch_addr {
            Some(addr) => Arc::new(OpenSearchCommitter::new(addr)?),
            None => Arc::new(LoggingCommitter),
        };
        let failure_policy: Arc<dyn FailurePolicy> = match config.failure_policy {
            FailurePolicyKind::KillServer => Arc::new(KillServerOnFailurePolicy::default()),
            FailurePolicyKind::Log => Arc::new(LoggingFailurePolicy),
        };
        Ok(Self::new(
            committer,
            external_committer,
            failure_policy,
            metadata,
            metrics,
        ))
    }

    /// Groups raw (mutation, destination) pairs and writes them. A
    /// definitive failure is propagated to the caller; use
    /// [`Self::write_and_handle_failure`] to engage the failure policy
    /// instead.
    pub async fn write(
        &self,
        updates: Vec<(Mutation, TableName)>,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> Result<(), WriteError> {
        let batch = MutationBatch::resolve(updates);
        self.write_batch(batch, allow_local_updates, client_version)
            .await
    }

    /// Groups raw (mutation, destination) pairs and writes them, handing a
    /// definitive failure to the failure policy instead of propagating it.
    /// The default policy does not return.
    pub async fn write_and_handle_failure(
        &self,
        updates: Vec<(Mutation, TableName)>,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) {
        let batch = MutationBatch::resolve(updates);
        self.write_batch_and_handle_failure(batch, allow_local_updates, client_version)
            .await;
    }

    /// Batch-accepting variant of [`Self::write_and_handle_failure`].
    pub async fn write_batch_and_handle_failure(
        &self,
        batch: MutationBatch,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) {
        if let Err((err, batch)) = self
            .dispatch(batch, allow_local_updates, client_version)
            .await
        {
            self.failure_policy.handle_failure(&batch, &err).await;
        }
    }

    /// Classifies and writes an already grouped batch. Both destinations
    /// are always attempted; when both fail, the internal error wins since
    /// the internal store is the durable one.
    pub async fn write_batch(
        &self,
        batch: MutationBatch,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> Result<(), WriteError> {
        self.dispatch(batch, allow_local_updates, client_version)
            .await
            .map_err(|(err, _)| err)
    }

    /// A definitive error comes back paired with the attempted batch,
    /// reassembled from its classified halves, so the failure path needs no
    /// upfront clone.
    async fn dispatch(
        &self,
        batch: MutationBatch,
        allow_local_updates: bool,
        client_version: ClientVersion,
    ) -> Result<(), (WriteError, MutationBatch)> {
        let (internal, external) =
            classify::classify(batch, self.metadata.as_ref(), &self.metrics).await;

        let mut result = Ok(());
        if !internal.is_empty() {
            self.metrics
                .written
                .with_label_values(&[INTERNAL_DESTINATION])
                .inc_by(internal.mutation_count() as u64);
            if let Err(err) = self
                .committer
                .write(&internal, allow_local_updates, client_version)
                .await
            {
                self.metrics
                    .write_failures
                    .with_label_values(&[INTERNAL_DESTINATION])
                    .inc();
                error!("internal index write failed: {err}");
                result = Err(err);
            }
        }
        if !external.is_empty() {
            self.metrics
                .written
                .with_label_values(&[EXTERNAL_DESTINATION])
                .inc_by(external.mutation_count() as u64);
            if let Err(err) = self
                .external_committer
                .write(&external, allow_local_updates, client_version)
                .await
            {
                self.metrics
                    .write_failures
                    .with_label_values(&[EXTERNAL_DESTINATION])
                    .inc();
                error!("external index write failed: {err}");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                let mut batch = internal;
                for (table, mutations) in external {
                    batch.insert(table, mutations);
                }
                Err((err, batch))
            }
        }
    }

    /// Stops the writer and its collaborators. Safe to call from multiple
    /// threads; only the first call propagates.
    pub fn stop(&self, reason: &str) {
        if self
            .stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("stopping the index writer: {reason}");
        self.committer.stop(reason);
        self.external_committer.stop(reason);
        self.failure_policy.stop(reason);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableRef;
    use crate::Timestamp;
    use crate::classify::EXTERNAL_INDEX_TYPE;
    use crate::classify::MockTableMetadataProvider;
    use crate::classify::TableDescriptor;
    use crate::committer::MockIndexCommitter;
    use crate::failure_policy::MockFailurePolicy;
    use anyhow::anyhow;

    fn updates(tables: &[&str]) -> Vec<(Mutation, TableName)> {
        tables
            .iter()
            .enumerate()
            .map(|(row, table)| {
                (
                    Mutation::put(vec![row as u8], Timestamp::from(1)),
                    TableName::from(*table),
                )
            })
            .collect()
    }

    fn metadata_with_external(external: &'static str) -> MockTableMetadataProvider {
        let mut metadata = MockTableMetadataProvider::new();
        metadata
            .expect_get_table_descriptors()
            .returning(move |names| {
                Ok(names
                    .iter()
                    .map(|name| TableDescriptor {
                        name: name.clone(),
                        index_type: (name == &TableName::from(external))
                            .then(|| EXTERNAL_INDEX_TYPE.to_string()),
                    })
                    .collect())
            });
        metadata
    }

    fn table_error(table: &str) -> WriteError {
        WriteError::Table {
            table: TableRef::new(table.into()),
            cause: anyhow!("region offline"),
        }
    }

    fn writer(
        committer: MockIndexCommitter,
        external: MockIndexCommitter,
        policy: MockFailurePolicy,
        metadata: MockTableMetadataProvider,
    ) -> IndexWriter {
        IndexWriter::new(
            Arc::new(committer),
            Arc::new(external),
            Arc::new(policy),
            Arc::new(metadata),
            Arc::new(Metrics::new()),
        )
    }

    #[tokio::test]
    async fn routes_each_destination_to_its_committer() {
        let mut committer = MockIndexCommitter::new();
        committer
            .expect_write()
            .withf(|batch, _, _| {
                batch.table_count() == 1
                    && batch.get(&TableRef::new("LOCAL_IDX".into())).is_some()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut external = MockIndexCommitter::new();
        external
            .expect_write()
            .withf(|batch, _, _| {
                batch.table_count() == 1
                    && batch.get(&TableRef::new("SEARCH_IDX".into())).is_some()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let policy = MockFailurePolicy::new();
        let writer = writer(
            committer,
            external,
            policy,
            metadata_with_external("SEARCH_IDX"),
        );

        writer
            .write(
                updates(&["LOCAL_IDX", "SEARCH_IDX"]),
                false,
                ClientVersion::from(1),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn handled_failure_reaches_the_policy_with_the_cause() {
        let mut committer = MockIndexCommitter::new();
        committer
            .expect_write()
            .returning(|_, _, _| Err(table_error("LOCAL_IDX")));
        let external = MockIndexCommitter::new();
        let mut policy = MockFailurePolicy::new();
        policy
            .expect_handle_failure()
            .withf(|batch, cause| {
                batch.mutation_count() == 1 && matches!(cause, WriteError::Table { .. })
            })
            .times(1)
            .return_const(());
        let writer = writer(committer, external, policy, metadata_with_external("NONE"));

        writer
            .write_and_handle_failure(updates(&["LOCAL_IDX"]), false, ClientVersion::from(1))
            .await;
    }

    #[tokio::test]
    async fn policy_receives_the_whole_batch_across_destinations() {
        let mut committer = MockIndexCommitter::new();
        committer
            .expect_write()
            .returning(|_, _, _| Err(table_error("LOCAL_IDX")));
        let mut external = MockIndexCommitter::new();
        external.expect_write().returning(|_, _, _| Ok(()));
        let mut policy = MockFailurePolicy::new();
        policy
            .expect_handle_failure()
            .withf(|batch, _| {
                batch.table_count() == 2
                    && batch.get(&TableRef::new("LOCAL_IDX".into())).is_some()
                    && batch.get(&TableRef::new("SEARCH_IDX".into())).is_some()
            })
            .times(1)
            .return_const(());
        let writer = writer(
            committer,
            external,
            policy,
            metadata_with_external("SEARCH_IDX"),
        );

        writer
            .write_and_handle_failure(
                updates(&["LOCAL_IDX", "SEARCH_IDX"]),
                false,
                ClientVersion::from(1),
            )
            .await;
    }

    #[tokio::test]
    async fn propagating_write_leaves_the_policy_alone() {
        let mut committer = MockIndexCommitter::new();
        committer
            .expect_write()
            .returning(|_, _, _| Err(table_error("LOCAL_IDX")));
        let external = MockIndexCommitter::new();
        let mut policy = MockFailurePolicy::new();
        policy.expect_handle_failure().never();
        let writer = writer(committer, external, policy, metadata_with_external("NONE"));

        let result = writer
            .write(updates(&["LOCAL_IDX"]), false, ClientVersion::from(1))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn external_failure_does_not_block_the_internal_write() {
        let mut committer = MockIndexCommitter::new();
        committer.expect_write().times(1).returning(|_, _, _| Ok(()));
        let mut external = MockIndexCommitter::new();
        external
            .expect_write()
            .times(1)
            .returning(|_, _, _| Err(table_error("SEARCH_IDX")));
        let policy = MockFailurePolicy::new();
        let writer = writer(
            committer,
            external,
            policy,
            metadata_with_external("SEARCH_IDX"),
        );

        let result = writer
            .write(
                updates(&["LOCAL_IDX", "SEARCH_IDX"]),
                false,
                ClientVersion::from(1),
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn internal_failure_still_attempts_the_external_write() {
        let mut committer = MockIndexCommitter::new();
        committer
            .expect_write()
            .times(1)
            .returning(|_, _, _| Err(table_error("LOCAL_IDX")));
        let mut external = MockIndexCommitter::new();
        external.expect_write().times(1).returning(|_, _, _| Ok(()));
        let policy = MockFailurePolicy::new();
        let writer = writer(
            committer,
            external,
            policy,
            metadata_with_external("SEARCH_IDX"),
        );

        let result = writer
            .write(
                updates(&["LOCAL_IDX", "SEARCH_IDX"]),
                false,
                ClientVersion::from(1),
            )
            .await;

        match result.unwrap_err() {
            WriteError::Table { table, .. } => {
                assert_eq!(table, TableRef::new("LOCAL_IDX".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn metadata_failure_falls_back_to_the_internal_store() {
        let mut committer = MockIndexCommitter::new();
        committer
            .expect_write()
            .withf(|batch, _, _| batch.table_count() == 2)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut external = MockIndexCommitter::new();
        external.expect_write().never();
        let policy = MockFailurePolicy::new();
        let mut metadata = MockTableMetadataProvider::new();
        metadata
            .expect_get_table_descriptors()
            .returning(|_| Err(anyhow!("metadata service unavailable")));
        let writer = writer(committer, external, policy, metadata);

        writer
            .write(
                updates(&["LOCAL_IDX", "SEARCH_IDX"]),
                false,
                ClientVersion::from(1),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_write_touches_no_committer() {
        let mut committer = MockIndexCommitter::new();
        committer.expect_write().never();
        let mut external = MockIndexCommitter::new();
        external.expect_write().never();
        let policy = MockFailurePolicy::new();
        let metadata = MockTableMetadataProvider::new();
        let writer = writer(committer, external, policy, metadata);

        writer
            .write(vec![], false, ClientVersion::from(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stop_propagates_to_collaborators_exactly_once() {
        let mut committer = MockIndexCommitter::new();
        committer.expect_stop().times(1).return_const(());
        let mut external = MockIndexCommitter::new();
        external.expect_stop().times(1).return_const(());
        let mut policy = MockFailurePolicy::new();
        policy.expect_stop().times(1).return_const(());
        let metadata = MockTableMetadataProvider::new();
        let writer = writer(committer, external, policy, metadata);

        assert!(!writer.is_stopped());
        writer.stop("shutting down");
        writer.stop("shutting down again");
        assert!(writer.is_stopped());
    }
}
