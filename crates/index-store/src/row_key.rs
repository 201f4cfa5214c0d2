/*
 * Copyright 2026-present ScyllaDB
 * SPDX-License-Identifier: LicenseRef-ScyllaDB-Source-Available-1.0
 */

use crate::DecodeError;
use crate::DeriveError;
use crate::data_type::DataType;
use crate::data_type::SortOrder;

/// One component of a composite row key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyField {
    pub data_type: DataType,
    pub sort_order: SortOrder,
    pub nullable: bool,
}

/// Byte layout of a composite row key: fixed-width components packed as-is,
/// variable-width components terminated by a sort-order separator except in
/// trailing position, optionally prefixed by a single salt byte. Stateless,
/// reused across rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowKeySchema {
    fields: Vec<KeyField>,
    salted: bool,
}

/// A decoded byte range of a composite key, or the absence of one. Absent
/// components are part of a well-formed walk, not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Component<'a> {
    Present(&'a [u8]),
    Absent,
}

impl RowKeySchema {
    pub fn new(fields: Vec<KeyField>, salted: bool) -> Self {
        Self { fields, salted }
    }

    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn salted(&self) -> bool {
        self.salted
    }

    /// Starts a lazy, finite, non-restartable walk over the components of
    /// `row_key`, skipping the leading salt byte when the schema declares
    /// one.
    pub fn walker<'a>(&'a self, row_key: &'a [u8]) -> Result<RowKeyWalker<'a>, DecodeError> {
        if self.salted && row_key.is_empty() {
            return Err(DecodeError::MissingSaltByte);
        }
        Ok(RowKeyWalker {
            fields: &self.fields,
            bytes: row_key,
            pos: usize::from(self.salted),
            field: 0,
        })
    }

    /// Packs component values into a row key, the inverse of the walk.
    /// Trailing absent components are trimmed; an absent non-nullable
    /// component is a hard error.
    pub fn encode(&self, values: &[Option<&[u8]>]) -> Result<Vec<u8>, DeriveError> {
        if values.len() != self.fields.len() {
            return Err(DeriveError::KeyArity {
                expected: self.fields.len(),
                got: values.len(),
            });
        }
        let last_present = values.iter().rposition(Option::is_some);
        let mut key = Vec::new();
        if self.salted {
            key.push(0);
        }
        if let Some(last_present) = last_present {
            for (position, (field, value)) in
                self.fields.iter().zip(values).enumerate().take(last_present + 1)
            {
                match value {
                    Some(value) => {
                        if let Some(expected) = field.data_type.fixed_width()
                            && value.len() != expected
                        {
                            return Err(DeriveError::WidthMismatch {
                                data_type: field.data_type,
                                expected,
                                got: value.len(),
                            });
                        }
                        key.extend_from_slice(value);
                        if field.data_type.fixed_width().is_none() && position < last_present {
                            key.push(field.sort_order.separator());
                        }
                    }
                    None => {
                        if !field.nullable {
                            return Err(DeriveError::MissingKeyComponent { position });
                        }
                        if field.data_type.fixed_width().is_some() {
                            return Err(DeriveError::NullFixedWidth { position });
                        }
                        key.push(field.sort_order.separator());
                    }
                }
            }
        }
        let first_absent = last_present.map_or(0, |position| position + 1);
        for (position, field) in self.fields.iter().enumerate().skip(first_absent) {
            if !field.nullable {
                return Err(DeriveError::MissingKeyComponent { position });
            }
        }
        if self.salted {
            key[0] = salt_byte(&key[1..]);
        }
        Ok(key)
    }
}

/// Salt byte spreading rows across buckets, recomputed from the rest of the
/// key so salted keys stay deterministic.
pub(crate) fn salt_byte(key: &[u8]) -> u8 {
    key.iter()
        .fold(0u32, |hash, byte| {
            hash.wrapping_mul(31).wrapping_add(u32::from(*byte))
        }) as u8
}

/// Lazy walk over the byte ranges of a composite key. Yields one component
/// per schema field; malformed bytes surface a [`DecodeError`] instead of a
/// silent partial decode.
#[derive(Debug)]
pub struct RowKeyWalker<'a> {
    fields: &'a [KeyField],
    bytes: &'a [u8],
    pos: usize,
    field: usize,
}

impl<'a> RowKeyWalker<'a> {
    pub fn next_component(&mut self) -> Result<Option<Component<'a>>, DecodeError> {
        let max = self.bytes.len();
        let Some(field) = self.fields.get(self.field) else {
            if self.pos < max {
                return Err(DecodeError::TrailingBytes {
                    remaining: max - self.pos,
                });
            }
            return Ok(None);
        };
        let position = self.field;
        self.field += 1;
        if self.pos >= max {
            return Ok(Some(Component::Absent));
        }
        match field.data_type.fixed_width() {
            Some(width) => {
                if self.pos + width > max {
                    return Err(DecodeError::TruncatedComponent {
                        position,
                        expected: width,
                        remaining: max - self.pos,
                    });
                }
                let component = &self.bytes[self.pos..self.pos + width];
                self.pos += width;
                Ok(Some(Component::Present(component)))
            }
            None => {
                let separator = field.sort_order.separator();
                let last = self.field == self.fields.len();
                let end = if last {
                    max
                } else {
                    self.bytes[self.pos..]
                        .iter()
                        .position(|byte| *byte == separator)
                        // Trailing components were trimmed during encoding.
                        .map_or(max, |offset| self.pos + offset)
                };
                let component = &self.bytes[self.pos..end];
                self.pos = end;
                if !last && end < max {
                    // Skip the separator.
                    self.pos += 1;
                }
                Ok(Some(if component.is_empty() {
                    Component::Absent
                } else {
                    Component::Present(component)
                }))
            }
        }
    }
}
