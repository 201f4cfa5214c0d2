/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

//! Secondary-index maintenance engine: derives index-table mutations from
//! base-table writes and coordinates their delivery to internal and external
//! destination stores with pluggable failure recovery.

pub mod batch;
pub mod classify;
pub mod committer;
pub mod config;
pub mod data_type;
pub mod derive;
pub mod error;
pub mod failure_policy;
pub mod metrics;
pub mod mutation;
pub mod row_key;
pub mod schema;
pub mod writer;

pub use crate::batch::MutationBatch;
pub use crate::batch::TableRef;
pub use crate::classify::TableDescriptor;
pub use crate::classify::TableMetadataProvider;
pub use crate::committer::ClientVersion;
pub use crate::committer::IndexCommitter;
pub use crate::committer::StoreClient;
pub use crate::config::Config;
pub use crate::config::FailurePolicyKind;
pub use crate::data_type::DataType;
pub use crate::data_type::SortOrder;
pub use crate::derive::derive_index_mutation;
pub use crate::derive::derive_index_mutations;
pub use crate::derive::derive_updates;
pub use crate::error::DecodeError;
pub use crate::error::DeriveError;
pub use crate::error::WriteError;
pub use crate::failure_policy::FailurePolicy;
pub use crate::metrics::Metrics;
pub use crate::mutation::Cell;
pub use crate::mutation::FamilyName;
pub use crate::mutation::Mutation;
pub use crate::mutation::MutationKind;
pub use crate::mutation::QualifierName;
pub use crate::mutation::TableName;
pub use crate::mutation::Timestamp;
pub use crate::row_key::KeyField;
pub use crate::row_key::RowKeySchema;
pub use crate::schema::IndexSchema;
pub use crate::schema::SchemaProvider;
pub use crate::schema::TableSchema;
pub use crate::writer::IndexWriter;
