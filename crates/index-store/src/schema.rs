/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::FamilyName;
use crate::QualifierName;
use crate::TableName;
use crate::data_type::DataType;
use crate::data_type::SortOrder;
use crate::row_key::KeyField;
use crate::row_key::RowKeySchema;
use anyhow::bail;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub family: FamilyName,
    pub qualifier: QualifierName,
    pub data_type: DataType,
    pub sort_order: SortOrder,
    pub nullable: bool,
}

/// Schema of a base table: the ordered primary-key columns defining the
/// composite row key layout, and the non-key columns addressable by
/// (family, qualifier). Immutable once loaded, owned by the catalog.
#[derive(Clone, Debug)]
pub struct TableSchema {
    name: TableName,
    pk_columns: Vec<Column>,
    columns: Vec<Column>,
    row_key: RowKeySchema,
}

impl TableSchema {
    pub fn new(name: TableName, pk_columns: Vec<Column>, columns: Vec<Column>, salted: bool) -> Self {
        let fields = pk_columns
            .iter()
            .map(|column| KeyField {
                data_type: column.data_type,
                sort_order: column.sort_order,
                nullable: column.nullable,
            })
            .collect();
        Self {
            name,
            pk_columns,
            columns,
            row_key: RowKeySchema::new(fields, salted),
        }
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn pk_columns(&self) -> &[Column] {
        &self.pk_columns
    }

    pub fn row_key(&self) -> &RowKeySchema {
        &self.row_key
    }

    pub fn column_for(&self, family: &FamilyName, qualifier: &QualifierName) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.family == *family && column.qualifier == *qualifier)
    }
}

/// Where an index column sources its value from in the base table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSource {
    /// Position within the base table's primary-key column list.
    BaseKey(usize),
    /// A base table cell addressed by family and qualifier.
    BaseCell {
        family: FamilyName,
        qualifier: QualifierName,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexColumnKind {
    /// Part of the index table's own primary key.
    Key,
    /// Covered column carrying a copy of a base value.
    Covered,
}

#[derive(Clone, Debug)]
pub struct IndexColumn {
    pub column: Column,
    pub source: ColumnSource,
    pub kind: IndexColumnKind,
}

/// Schema of an index table plus the per-column mapping back to the base
/// table. Key columns come first, in index key order; the index row key
/// layout is derived from them.
#[derive(Clone, Debug)]
pub struct IndexSchema {
    name: TableName,
    columns: Vec<IndexColumn>,
    row_key: RowKeySchema,
    key_count: usize,
}

impl IndexSchema {
    pub fn new(name: TableName, columns: Vec<IndexColumn>) -> anyhow::Result<Self> {
        let key_count = columns
            .iter()
            .take_while(|column| column.kind == IndexColumnKind::Key)
            .count();
        if columns[key_count..]
            .iter()
            .any(|column| column.kind == IndexColumnKind::Key)
        {
            bail!("index {name}: key columns must precede covered columns");
        }
        if key_count == 0 {
            bail!("index {name}: at least one key column is required");
        }
        let fields = columns[..key_count]
            .iter()
            .map(|column| KeyField {
                data_type: column.column.data_type,
                sort_order: column.column.sort_order,
                nullable: column.column.nullable,
            })
            .collect();
        Ok(Self {
            name,
            columns,
            row_key: RowKeySchema::new(fields, false),
            key_count,
        })
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    pub fn row_key(&self) -> &RowKeySchema {
        &self.row_key
    }

    pub fn key_count(&self) -> usize {
        self.key_count
    }

    /// Slot of the index column sourced from the given base primary-key
    /// position, if this index carries it.
    pub fn position_for_key(&self, base_position: usize) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.source == ColumnSource::BaseKey(base_position))
    }

    /// Slot of the index column sourced from the given base cell, if this
    /// index carries it. A miss means the base column is simply not part of
    /// this index.
    pub fn position_for_cell(
        &self,
        family: &FamilyName,
        qualifier: &QualifierName,
    ) -> Option<usize> {
        self.columns.iter().position(|column| {
            matches!(
                &column.source,
                ColumnSource::BaseCell { family: f, qualifier: q } if f == family && q == qualifier
            )
        })
    }
}

/// Catalog boundary supplying table schemas. Read-only and safe for
/// concurrent use; column lookup by (family, qualifier) goes through
/// [`TableSchema::column_for`].
#[cfg_attr(test, mockall::automock)]
pub trait SchemaProvider: Send + Sync {
    fn get_schema(&self, table: &TableName) -> anyhow::Result<Arc<TableSchema>>;
}
