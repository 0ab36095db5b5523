//! Serializing messages.

use bytes::BufMut;

use crate::schema::FieldKind;
use crate::value::Value;
use crate::wire::{
    encode_key, encode_len_delimited, encode_varint, encode_zigzag32, encode_zigzag64,
    encoded_key_len, encoded_len_delimited_len, encoded_varint_len,
};
use crate::Message;

/// Encode the body of `message`: known fields in ascending number order,
/// then the preserved unknown records.
pub(crate) fn encode_message<B: BufMut>(message: &Message, buf: &mut B) {
    let fields = message.field_set();
    for field in message.descriptor().fields_in_number_order() {
        if field.is_repeated() {
            for value in fields.values(field) {
                encode_key(field.key(), buf);
                encode_value(field.kind(), value, buf);
            }
        } else if let Some(value) = fields.value(field) {
            encode_key(field.key(), buf);
            encode_value(field.kind(), value, buf);
        }
    }
    fields.unknown().encode(buf);
}

/// Length of [`encode_message`]'s output.
pub(crate) fn encoded_message_len(message: &Message) -> usize {
    let fields = message.field_set();
    let mut len = 0;
    for field in message.descriptor().fields_in_number_order() {
        let key_len = encoded_key_len(field.number());
        if field.is_repeated() {
            len += fields
                .values(field)
                .iter()
                .map(|value| key_len + encoded_value_len(field.kind(), value))
                .sum::<usize>();
        } else if let Some(value) = fields.value(field) {
            len += key_len + encoded_value_len(field.kind(), value);
        }
    }
    len + fields.unknown().encoded_len()
}

/// Encode a single value, without its key.
///
/// `int32` and enum values are sign extended, negative numbers always take
/// ten bytes.
fn encode_value<B: BufMut>(kind: &FieldKind, value: &Value, buf: &mut B) {
    match (kind, value) {
        (FieldKind::Sint32, Value::I32(v)) => {
            encode_varint(u64::from(encode_zigzag32(*v)), buf);
        }
        (FieldKind::Sint64, Value::I64(v)) => {
            encode_varint(encode_zigzag64(*v), buf);
        }
        (FieldKind::Sfixed32, Value::I32(v)) => buf.put_i32_le(*v),
        (FieldKind::Sfixed64, Value::I64(v)) => buf.put_i64_le(*v),
        (FieldKind::Fixed32, Value::U32(v)) => buf.put_u32_le(*v),
        (FieldKind::Fixed64, Value::U64(v)) => buf.put_u64_le(*v),
        (_, Value::Bool(v)) => {
            encode_varint(u64::from(*v), buf);
        }
        (_, Value::I32(v) | Value::Enum(v)) => {
            encode_varint(i64::from(*v) as u64, buf);
        }
        (_, Value::I64(v)) => {
            encode_varint(*v as u64, buf);
        }
        (_, Value::U32(v)) => {
            encode_varint(u64::from(*v), buf);
        }
        (_, Value::U64(v)) => {
            encode_varint(*v, buf);
        }
        (_, Value::F32(v)) => buf.put_f32_le(*v),
        (_, Value::F64(v)) => buf.put_f64_le(*v),
        (_, Value::String(v)) => encode_len_delimited(v.as_bytes(), buf),
        (_, Value::Bytes(v)) => encode_len_delimited(v, buf),
        (_, Value::Message(v)) => {
            encode_varint(encoded_message_len(v) as u64, buf);
            encode_message(v, buf);
        }
    }
}

fn encoded_value_len(kind: &FieldKind, value: &Value) -> usize {
    match (kind, value) {
        (FieldKind::Sint32, Value::I32(v)) => encoded_varint_len(u64::from(encode_zigzag32(*v))),
        (FieldKind::Sint64, Value::I64(v)) => encoded_varint_len(encode_zigzag64(*v)),
        (FieldKind::Sfixed32 | FieldKind::Fixed32, _) | (_, Value::F32(_)) => 4,
        (FieldKind::Sfixed64 | FieldKind::Fixed64, _) | (_, Value::F64(_)) => 8,
        (_, Value::Bool(_)) => 1,
        (_, Value::I32(v) | Value::Enum(v)) => encoded_varint_len(i64::from(*v) as u64),
        (_, Value::I64(v)) => encoded_varint_len(*v as u64),
        (_, Value::U32(v)) => encoded_varint_len(u64::from(*v)),
        (_, Value::U64(v)) => encoded_varint_len(*v),
        (_, Value::String(v)) => encoded_len_delimited_len(v.len()),
        (_, Value::Bytes(v)) => encoded_len_delimited_len(v.len()),
        (_, Value::Message(v)) => encoded_len_delimited_len(encoded_message_len(v)),
    }
}
