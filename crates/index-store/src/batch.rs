/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::Mutation;
use crate::TableName;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::sync::Arc;

/// Resolved handle to a destination table, compared and hashed by the
/// byte-exact table name. Built once per distinct name per batch so
/// grouping stays cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef(Arc<TableName>);

impl TableRef {
    pub fn new(name: TableName) -> Self {
        Self(Arc::new(name))
    }

    pub fn name(&self) -> &TableName {
        &self.0
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutations grouped by destination table. Insertion order within a table
/// is preserved end-to-end; order across tables is not.
#[derive(Clone, Debug, Default)]
pub struct MutationBatch {
    updates: HashMap<TableRef, Vec<Mutation>>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups raw (mutation, destination) pairs by table. Destination names
    /// repeated across pairs collapse to one [`TableRef`] through a
    /// byte-exact comparison; mutations keep their arrival order per table.
    /// Pure in-memory grouping, O(n) in the number of pairs.
    pub fn resolve(pairs: Vec<(Mutation, TableName)>) -> Self {
        let mut tables: HashMap<TableName, TableRef> = HashMap::new();
        let mut updates: HashMap<TableRef, Vec<Mutation>> = HashMap::new();
        for (mutation, name) in pairs {
            let table = tables
                .entry(name)
                .or_insert_with_key(|name| TableRef::new(name.clone()))
                .clone();
            updates.entry(table).or_default().push(mutation);
        }
        Self { updates }
    }

    pub fn insert(&mut self, table: TableRef, mutations: Vec<Mutation>) {
        self.updates.entry(table).or_default().extend(mutations);
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.updates.len()
    }

    pub fn mutation_count(&self) -> usize {
        self.updates.values().map(Vec::len).sum()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.updates.keys()
    }

    pub fn get(&self, table: &TableRef) -> Option<&[Mutation]> {
        self.updates.get(table).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableRef, &Vec<Mutation>)> {
        self.updates.iter()
    }
}

impl IntoIterator for MutationBatch {
    type Item = (TableRef, Vec<Mutation>);
    type IntoIter = hash_map::IntoIter<TableRef, Vec<Mutation>>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}
