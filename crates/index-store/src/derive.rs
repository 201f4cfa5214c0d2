/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::DeriveError;
use crate::Mutation;
use crate::TableName;
use crate::Timestamp;
use crate::data_type::coerce;
use crate::mutation::EMPTY_MARKER_QUALIFIER;
use crate::row_key::Component;
use crate::schema::IndexColumnKind;
use crate::schema::IndexSchema;
use crate::schema::SchemaProvider;
use crate::schema::TableSchema;

/// Derives the index table mutations equivalent to a batch of base table
/// mutations, preserving input order.
pub fn derive_index_mutations(
    index: &IndexSchema,
    base: &TableSchema,
    mutations: &[Mutation],
) -> Result<Vec<Mutation>, DeriveError> {
    mutations
        .iter()
        .map(|mutation| derive_index_mutation(index, base, mutation))
        .collect()
}

/// Derives the index table mutation equivalent to one base table mutation.
///
/// The base row key is walked component by component and each present key
/// value is coerced into its index column slot; the walk does not stop at
/// absent components. A whole-row delete derives to a lone row delete.
/// Otherwise every base cell with a mapped index column fills either an
/// index key slot or a covered slot; unmapped cells and the reserved empty
/// marker are skipped. The returned mutation always carries a complete,
/// well-formed index row key.
pub fn derive_index_mutation(
    index: &IndexSchema,
    base: &TableSchema,
    mutation: &Mutation,
) -> Result<Mutation, DeriveError> {
    let mut slots: Vec<Option<(Vec<u8>, Timestamp)>> = vec![None; index.columns().len()];

    let mut walker = base.row_key().walker(mutation.row_key())?;
    let mut position = 0;
    while let Some(component) = walker.next_component()? {
        if let Component::Present(value) = component {
            let Some(base_column) = base.pk_columns().get(position) else {
                return Err(DeriveError::KeyArity {
                    expected: base.pk_columns().len(),
                    got: position + 1,
                });
            };
            if let Some(slot) = index.position_for_key(position) {
                let index_column = &index.columns()[slot].column;
                let value = coerce(
                    value,
                    (base_column.data_type, base_column.sort_order),
                    (index_column.data_type, index_column.sort_order),
                )?;
                slots[slot] = Some((value, mutation.timestamp()));
            }
        }
        position += 1;
    }

    if mutation.is_row_delete() {
        let row_key = encode_index_key(index, &slots)?;
        return Ok(Mutation::delete(row_key, mutation.timestamp()));
    }

    for (family, cells) in mutation.cells() {
        for cell in cells {
            if cell.qualifier.as_bytes() == EMPTY_MARKER_QUALIFIER {
                continue;
            }
            let Some(base_column) = base.column_for(family, &cell.qualifier) else {
                continue;
            };
            let Some(slot) = index.position_for_cell(family, &cell.qualifier) else {
                // The base column is not part of this index.
                continue;
            };
            let index_column = &index.columns()[slot].column;
            let value = coerce(
                &cell.value,
                (base_column.data_type, base_column.sort_order),
                (index_column.data_type, index_column.sort_order),
            )?;
            slots[slot] = Some((value, cell.timestamp));
        }
    }

    let row_key = encode_index_key(index, &slots)?;
    let mut derived = Mutation::put(row_key, mutation.timestamp());
    for (slot, index_column) in slots.into_iter().zip(index.columns()).skip(index.key_count()) {
        if index_column.kind == IndexColumnKind::Covered
            && let Some((value, timestamp)) = slot
        {
            derived.add_cell(
                index_column.column.family.clone(),
                index_column.column.qualifier.clone(),
                value,
                timestamp,
            );
        }
    }
    Ok(derived)
}

/// Derives the full coordinator input for one base table write: the
/// mutations for every supplied index schema, paired with their destination
/// table names. The base schema is looked up through the catalog provider.
pub fn derive_updates(
    provider: &dyn SchemaProvider,
    base: &TableName,
    indexes: &[IndexSchema],
    mutations: &[Mutation],
) -> Result<Vec<(Mutation, TableName)>, DeriveError> {
    let base = provider.get_schema(base).map_err(DeriveError::Schema)?;
    let mut updates = Vec::with_capacity(indexes.len() * mutations.len());
    for index in indexes {
        for mutation in derive_index_mutations(index, &base, mutations)? {
            updates.push((mutation, index.name().clone()));
        }
    }
    Ok(updates)
}

fn encode_index_key(
    index: &IndexSchema,
    slots: &[Option<(Vec<u8>, Timestamp)>],
) -> Result<Vec<u8>, DeriveError> {
    let key_values = slots[..index.key_count()]
        .iter()
        .map(|slot| slot.as_ref().map(|(value, _)| value.as_slice()))
        .collect::<Vec<_>>();
    index.row_key().encode(&key_values)
}
