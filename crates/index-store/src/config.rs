/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use serde::Deserialize;

pub const DEFAULT_WRITER_CONCURRENCY: usize = 10;

/// Engine configuration. Every field has a working default so an empty
/// document yields a usable config.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on concurrent per-table writes to the primary store.
    pub writer_concurrency: usize,

    /// Address of the external index service. External destinations are
    /// logged instead of written when unset.
    pub opensearch_addr: Option<String>,

    pub failure_policy: FailurePolicyKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            writer_concurrency: DEFAULT_WRITER_CONCURRENCY,
            opensearch_addr: None,
            failure_policy: FailurePolicyKind::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyKind {
    #[default]
    KillServer,
    Log,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.writer_concurrency, DEFAULT_WRITER_CONCURRENCY);
        assert_eq!(config.opensearch_addr, None);
        assert_eq!(config.failure_policy, FailurePolicyKind::KillServer);
    }

    #[test]
    fn fields_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "writer_concurrency": 4,
                "opensearch_addr": "http://localhost:9200",
                "failure_policy": "log"
            }"#,
        )
        .unwrap();
        assert_eq!(config.writer_concurrency, 4);
        assert_eq!(config.opensearch_addr.as_deref(), Some("http://localhost:9200"));
        assert_eq!(config.failure_policy, FailurePolicyKind::Log);
    }
}
