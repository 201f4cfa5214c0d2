/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::batch::TableRef;
use crate::data_type::DataType;
use thiserror::Error;

/// Malformed row key bytes. Surfaced immediately to the caller of the
/// deriver, never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("row key is too short for the declared salt byte")]
    MissingSaltByte,

    #[error(
        "row key component {position} is truncated: expected {expected} bytes, {remaining} remain"
    )]
    TruncatedComponent {
        position: usize,
        expected: usize,
        remaining: usize,
    },

    #[error("{remaining} trailing bytes left after the last row key component")]
    TrailingBytes { remaining: usize },
}

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("missing value for non-nullable index key component {position}")]
    MissingKeyComponent { position: usize },

    #[error("absent fixed-width key component {position} precedes later present components")]
    NullFixedWidth { position: usize },

    #[error("key value arity mismatch: schema has {expected} components, got {got}")]
    KeyArity { expected: usize, got: usize },

    #[error("cannot coerce {from:?} to {to:?}: incompatible byte widths")]
    IncompatibleCoercion { from: DataType, to: DataType },

    #[error("value width {got} does not match the fixed width {expected} of {data_type:?}")]
    WidthMismatch {
        data_type: DataType,
        expected: usize,
        got: usize,
    },

    #[error("schema lookup failed: {0}")]
    Schema(anyhow::Error),
}

/// A destination store rejected or could not complete a write. Never
/// swallowed: the coordinator forwards it to the failure policy.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write index updates to table {table}: {cause}")]
    Table { table: TableRef, cause: anyhow::Error },

    #[error("index write worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
