/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::DeriveError;

/// Semantic type of a column value as laid out in key and cell bytes. The
/// engine never re-parses values; it only needs the width class to walk and
/// rebuild composite keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Double,
    Varchar,
    Varbinary,
}

impl DataType {
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Boolean | Self::TinyInt => Some(1),
            Self::SmallInt => Some(2),
            Self::Int => Some(4),
            Self::BigInt | Self::Double => Some(8),
            Self::Varchar | Self::Varbinary => None,
        }
    }
}

/// Sort direction of the stored bytes. Descending values are stored with
/// every bit inverted so plain byte comparison still orders them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Separator byte terminating a variable-width key component with this
    /// sort order. Inverted values cannot contain the inverted separator.
    pub fn separator(&self) -> u8 {
        match self {
            Self::Asc => 0x00,
            Self::Desc => 0xff,
        }
    }
}

/// Coerce a base column value into the byte representation of an index
/// column. This is a byte-level transform: compatible types share the same
/// width class and only a sort-order flip rewrites the bytes.
pub fn coerce(
    value: &[u8],
    from: (DataType, SortOrder),
    to: (DataType, SortOrder),
) -> Result<Vec<u8>, DeriveError> {
    let (from_type, from_order) = from;
    let (to_type, to_order) = to;
    if from_type.fixed_width() != to_type.fixed_width() {
        return Err(DeriveError::IncompatibleCoercion {
            from: from_type,
            to: to_type,
        });
    }
    if let Some(expected) = from_type.fixed_width()
        && value.len() != expected
    {
        return Err(DeriveError::WidthMismatch {
            data_type: from_type,
            expected,
            got: value.len(),
        });
    }
    let mut bytes = value.to_vec();
    if from_order != to_order {
        bytes.iter_mut().for_each(|byte| *byte = !*byte);
    }
    Ok(bytes)
}
