/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use std::collections::BTreeMap;
use std::fmt;

/// Reserved qualifier carrying the existence marker of a row. It signals
/// row presence only and is never translated into an index column.
pub const EMPTY_MARKER_QUALIFIER: &[u8] = b"_0";

/// Destination table name compared byte-exact, not as a string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::AsRef, derive_more::From)]
pub struct TableName(Vec<u8>);

impl TableName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl From<&[u8]> for TableName {
    fn from(name: &[u8]) -> Self {
        Self(name.to_vec())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::AsRef, derive_more::From)]
pub struct FamilyName(Vec<u8>);

impl FamilyName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for FamilyName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl fmt::Display for FamilyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::AsRef, derive_more::From)]
pub struct QualifierName(Vec<u8>);

impl QualifierName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for QualifierName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl From<&[u8]> for QualifierName {
    fn from(name: &[u8]) -> Self {
        Self(name.to_vec())
    }
}

impl fmt::Display for QualifierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Write timestamp in milliseconds since the UNIX epoch. Carried through
/// unchanged; the engine never interprets it.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
pub struct Timestamp(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub qualifier: QualifierName,
    pub value: Vec<u8>,
    pub timestamp: Timestamp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Put,
    Delete,
}

/// A change record for one row: a row key, a modification kind and the
/// affected cells grouped by column family. A delete with no cells is a
/// whole-row delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    row_key: Vec<u8>,
    kind: MutationKind,
    cells: BTreeMap<FamilyName, Vec<Cell>>,
    timestamp: Timestamp,
}

impl Mutation {
    pub fn put(row_key: Vec<u8>, timestamp: Timestamp) -> Self {
        Self {
            row_key,
            kind: MutationKind::Put,
            cells: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn delete(row_key: Vec<u8>, timestamp: Timestamp) -> Self {
        Self {
            row_key,
            kind: MutationKind::Delete,
            cells: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn with_cell(
        mut self,
        family: FamilyName,
        qualifier: QualifierName,
        value: Vec<u8>,
        timestamp: Timestamp,
    ) -> Self {
        self.add_cell(family, qualifier, value, timestamp);
        self
    }

    pub fn add_cell(
        &mut self,
        family: FamilyName,
        qualifier: QualifierName,
        value: Vec<u8>,
        timestamp: Timestamp,
    ) {
        self.cells.entry(family).or_default().push(Cell {
            qualifier,
            value,
            timestamp,
        });
    }

    pub fn row_key(&self) -> &[u8] {
        &self.row_key
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn cells(&self) -> &BTreeMap<FamilyName, Vec<Cell>> {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// A delete carrying no cell data deletes the whole row.
    pub fn is_row_delete(&self) -> bool {
        self.kind == MutationKind::Delete && self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_compare_byte_exact() {
        let first = TableName::from("T1");
        let second = TableName::from("T1".as_bytes());
        assert_eq!(first, second);
        assert_ne!(first, TableName::from("t1"));
    }

    #[test]
    fn delete_without_cells_is_row_delete() {
        let delete = Mutation::delete(vec![1], Timestamp::from(10));
        assert!(delete.is_row_delete());

        let column_delete = Mutation::delete(vec![1], Timestamp::from(10)).with_cell(
            "f".into(),
            "q".into(),
            vec![],
            Timestamp::from(10),
        );
        assert!(!column_delete.is_row_delete());
        assert_eq!(column_delete.cell_count(), 1);
    }

    #[test]
    fn cells_keep_insertion_order_per_family() {
        let put = Mutation::put(vec![1], Timestamp::from(10))
            .with_cell("f".into(), "b".into(), vec![2], Timestamp::from(10))
            .with_cell("f".into(), "a".into(), vec![1], Timestamp::from(10));
        let cells = put.cells().get(&FamilyName::from("f")).unwrap();
        assert_eq!(cells[0].qualifier, QualifierName::from("b"));
        assert_eq!(cells[1].qualifier, QualifierName::from("a"));
    }
}
