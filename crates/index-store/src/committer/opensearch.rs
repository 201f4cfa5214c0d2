/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::Mutation;
use crate::MutationBatch;
use crate::TableRef;
use crate::WriteError;
use crate::committer::ClientVersion;
use crate::committer::IndexCommitter;
use crate::mutation::MutationKind;
use anyhow::anyhow;
use async_trait::async_trait;
use opensearch::DeleteParts;
use opensearch::IndexParts;
use opensearch::OpenSearch;
use opensearch::http::Url;
use opensearch::http::transport::SingleNodeConnectionPool;
use opensearch::http::transport::TransportBuilder;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

/// Committer backed by an external OpenSearch cluster. Each destination
/// table maps to an OpenSearch index, each row to a document keyed by the
/// hex form of the row key.
pub struct OpenSearchCommitter {
    client: Arc<OpenSearch>,
}

impl OpenSearchCommitter {
    pub fn new(addr: &str) -> anyhow::Result<Self> {
        let url = Url::parse(addr)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;
        Ok(Self {
            client: Arc::new(OpenSearch::new(transport)),
        })
    }
}

#[async_trait]
impl IndexCommitter for OpenSearchCommitter {
    async fn write(
        &self,
        batch: &MutationBatch,
        _allow_local_updates: bool,
        _client_version: ClientVersion,
    ) -> Result<(), WriteError> {
        for (table, mutations) in batch.iter() {
            let index = index_name(table);
            for mutation in mutations {
                // Mutations stay ordered within a table, so later writes
                // for the same row win.
                apply(&self.client, &index, mutation)
                    .await
                    .map_err(|cause| WriteError::Table {
                        table: table.clone(),
                        cause,
                    })?;
            }
        }
        Ok(())
    }

    fn stop(&self, reason: &str) {
        debug!("stopping the opensearch committer: {reason}");
    }
}

async fn apply(client: &OpenSearch, index: &str, mutation: &Mutation) -> anyhow::Result<()> {
    let id = hex(mutation.row_key());
    match mutation.kind() {
        MutationKind::Put => {
            client
                .index(IndexParts::IndexId(index, &id))
                .body(document(mutation))
                .send()
                .await
                .map_or_else(
                    Err,
                    opensearch::http::response::Response::error_for_status_code,
                )
                .map_err(|err| anyhow!("unable to index document {id}: {err}"))?;
        }
        MutationKind::Delete => {
            client
                .delete(DeleteParts::IndexId(index, &id))
                .send()
                .await
                .map_or_else(
                    Err,
                    opensearch::http::response::Response::error_for_status_code,
                )
                .map_err(|err| anyhow!("unable to delete document {id}: {err}"))?;
        }
    }
    Ok(())
}

/// OpenSearch index names must be lowercase.
fn index_name(table: &TableRef) -> String {
    String::from_utf8_lossy(table.name().as_bytes()).to_lowercase()
}

fn document(mutation: &Mutation) -> serde_json::Value {
    let cells = mutation
        .cells()
        .iter()
        .flat_map(|(family, cells)| {
            cells
                .iter()
                .map(move |cell| {
                    (
                        format!("{family}:{}", cell.qualifier),
                        serde_json::Value::from(hex(&cell.value)),
                    )
                })
        })
        .collect::<serde_json::Map<String, serde_json::Value>>();
    json!({
        "cells": cells,
        "timestamp": u64::from(mutation.timestamp()),
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            _ = write!(out, "{byte:02x}");
            out
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableName;
    use crate::Timestamp;

    #[test]
    fn table_names_map_to_lowercase_indexes() {
        let table = TableRef::new(TableName::from("SEARCH_IDX"));
        assert_eq!(index_name(&table), "search_idx");
    }

    #[test]
    fn documents_carry_cells_and_timestamp() {
        let mutation = Mutation::put(vec![0xab], Timestamp::from(42))
            .with_cell("f".into(), "c".into(), vec![0x01, 0xff], Timestamp::from(42))
            .with_cell("g".into(), "d".into(), vec![0x02], Timestamp::from(42));

        let document = document(&mutation);

        assert_eq!(document["timestamp"], 42);
        assert_eq!(document["cells"]["f:c"], "01ff");
        assert_eq!(document["cells"]["g:d"], "02");
    }

    #[test]
    fn hex_encoding_is_zero_padded() {
        assert_eq!(hex(&[0x00, 0x0f, 0xf0]), "000ff0");
    }
}
