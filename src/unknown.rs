//! Side-store for records whose field number the schema does not declare.

use bytes::{BufMut, Bytes};

use crate::wire::{Key, WireType};

/// A single preserved record.
///
/// Holds the complete record exactly as received, key included, so it can
/// be re-emitted byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    key: Key,
    record: Bytes,
    value_offset: usize,
}

impl UnknownField {
    pub(crate) fn new(key: Key, record: Bytes, value_offset: usize) -> Self {
        debug_assert!(value_offset <= record.len());
        UnknownField {
            key,
            record,
            value_offset,
        }
    }

    pub fn number(&self) -> u32 {
        self.key.number()
    }

    pub fn wire_type(&self) -> WireType {
        self.key.wire_type()
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// The raw value bytes following the key.
    ///
    /// For [`WireType::Len`] this still includes the length prefix.
    pub fn raw_value(&self) -> &[u8] {
        &self.record[self.value_offset..]
    }

    /// The whole record, key and value.
    pub fn record(&self) -> &Bytes {
        &self.record
    }
}

/// Unknown records of a message, in arrival order.
///
/// Duplicate field numbers are all kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownFields {
    fields: Vec<UnknownField>,
}

impl UnknownFields {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, UnknownField> {
        self.fields.iter()
    }

    /// All records carrying field number `number`.
    pub fn get(&self, number: u32) -> impl Iterator<Item = &UnknownField> + '_ {
        self.fields.iter().filter(move |field| field.number() == number)
    }

    pub(crate) fn push(&mut self, field: UnknownField) {
        self.fields.push(field);
    }

    pub(crate) fn clear(&mut self) {
        self.fields.clear();
    }

    pub(crate) fn encoded_len(&self) -> usize {
        self.fields.iter().map(|field| field.record.len()).sum()
    }

    pub(crate) fn encode<B: BufMut>(&self, buf: &mut B) {
        for field in &self.fields {
            buf.put_slice(&field.record);
        }
    }
}

impl<'a> IntoIterator for &'a UnknownFields {
    type Item = &'a UnknownField;
    type IntoIter = core::slice::Iter<'a, UnknownField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
