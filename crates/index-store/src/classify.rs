/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::Metrics;
use crate::MutationBatch;
use crate::TableName;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

/// Index-type attribute value marking a table as hosted by an external
/// index service.
pub const EXTERNAL_INDEX_TYPE: &str = "EXTERNAL";

/// Table metadata as exposed by the store administration layer.
#[derive(Clone, Debug)]
pub struct TableDescriptor {
    pub name: TableName,
    pub index_type: Option<String>,
}

/// Administration boundary answering bulk descriptor lookups. Read-only
/// per call; may be cached by the collaborator, never by the engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableMetadataProvider: Send + Sync {
    async fn get_table_descriptors(
        &self,
        names: &[TableName],
    ) -> anyhow::Result<Vec<TableDescriptor>>;
}

/// Partitions a batch into (internal, external) destination groups with one
/// bulk metadata fetch. Tables whose descriptor carries the external
/// index-type attribute go external; everything else, including tables with
/// no descriptor, goes internal. A fetch failure routes the whole batch to
/// the internal store: external writes are best-effort, so ambiguity is
/// resolved in favor of the durable path instead of dropping writes.
pub async fn classify(
    batch: MutationBatch,
    metadata: &dyn TableMetadataProvider,
    metrics: &Metrics,
) -> (MutationBatch, MutationBatch) {
    if batch.is_empty() {
        return (batch, MutationBatch::new());
    }
    let names = batch
        .tables()
        .map(|table| table.name().clone())
        .collect::<Vec<_>>();
    let descriptors = match metadata.get_table_descriptors(&names).await {
        Ok(descriptors) => descriptors,
        Err(err) => {
            warn!("unable to fetch table descriptors, treating the whole batch as internal: {err}");
            metrics.classify_fallbacks.inc();
            return (batch, MutationBatch::new());
        }
    };
    let external_names = descriptors
        .into_iter()
        .filter(|descriptor| descriptor.index_type.as_deref() == Some(EXTERNAL_INDEX_TYPE))
        .map(|descriptor| descriptor.name)
        .collect::<HashSet<_>>();

    let mut internal = MutationBatch::new();
    let mut external = MutationBatch::new();
    for (table, mutations) in batch {
        if external_names.contains(table.name()) {
            external.insert(table, mutations);
        } else {
            internal.insert(table, mutations);
        }
    }
    (internal, external)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mutation;
    use crate::TableRef;
    use crate::Timestamp;
    use anyhow::anyhow;

    fn batch(tables: &[&str]) -> MutationBatch {
        MutationBatch::resolve(
            tables
                .iter()
                .enumerate()
                .map(|(row, table)| {
                    (
                        Mutation::put(vec![row as u8], Timestamp::from(1)),
                        TableName::from(*table),
                    )
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn external_attribute_routes_to_external() {
        let mut metadata = MockTableMetadataProvider::new();
        metadata.expect_get_table_descriptors().returning(|names| {
            Ok(names
                .iter()
                .map(|name| TableDescriptor {
                    name: name.clone(),
                    index_type: (name == &TableName::from("SEARCH_IDX"))
                        .then(|| EXTERNAL_INDEX_TYPE.to_string()),
                })
                .collect())
        });
        let metrics = Metrics::new();

        let (internal, external) =
            classify(batch(&["T1", "SEARCH_IDX"]), &metadata, &metrics).await;

        assert_eq!(internal.table_count(), 1);
        assert!(internal.get(&TableRef::new("T1".into())).is_some());
        assert_eq!(external.table_count(), 1);
        assert!(external.get(&TableRef::new("SEARCH_IDX".into())).is_some());
        assert_eq!(metrics.classify_fallbacks.get(), 0);
    }

    #[tokio::test]
    async fn missing_descriptor_defaults_to_internal() {
        let mut metadata = MockTableMetadataProvider::new();
        metadata
            .expect_get_table_descriptors()
            .returning(|_| Ok(vec![]));
        let metrics = Metrics::new();

        let (internal, external) = classify(batch(&["T1", "T2"]), &metadata, &metrics).await;

        assert_eq!(internal.table_count(), 2);
        assert!(external.is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_routes_whole_batch_to_internal() {
        let mut metadata = MockTableMetadataProvider::new();
        metadata
            .expect_get_table_descriptors()
            .returning(|_| Err(anyhow!("metadata service unavailable")));
        let metrics = Metrics::new();

        let (internal, external) = classify(batch(&["T1", "SEARCH_IDX"]), &metadata, &metrics).await;

        assert_eq!(internal.table_count(), 2);
        assert_eq!(internal.mutation_count(), 2);
        assert!(external.is_empty());
        assert_eq!(metrics.classify_fallbacks.get(), 1);
    }

    #[tokio::test]
    async fn empty_batch_skips_the_lookup() {
        let mut metadata = MockTableMetadataProvider::new();
        metadata.expect_get_table_descriptors().never();
        let metrics = Metrics::new();

        let (internal, external) = classify(MutationBatch::new(), &metadata, &metrics).await;

        assert!(internal.is_empty());
        assert!(external.is_empty());
    }
}
