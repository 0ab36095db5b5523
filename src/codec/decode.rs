//! Parsing messages.

use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::error::DecodeError;
use crate::message::FieldSet;
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};
use crate::unknown::UnknownField;
use crate::value::{ProtoString, Value};
use crate::wire::{
    decode_key, decode_len_delimited, decode_varint_buf, decode_zigzag32, decode_zigzag64,
    skip_field, WireType,
};
use crate::Message;

/// Default maximum depth of nested messages.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Options controlling how bytes are decoded.
///
/// ```
/// use protodrift::codec::DecodeOptions;
///
/// let mut options = DecodeOptions::new();
/// options.recursion_limit(16).discard_unknown_fields(true);
/// ```
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    recursion_limit: u32,
    discard_unknown_fields: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            discard_unknown_fields: false,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum nesting of embedded messages, defaults to 100.
    pub fn recursion_limit(&mut self, limit: u32) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Skip unknown records instead of preserving them.
    ///
    /// Messages decoded this way no longer re-encode losslessly.
    pub fn discard_unknown_fields(&mut self, discard: bool) -> &mut Self {
        self.discard_unknown_fields = discard;
        self
    }

    /// Decode `data` as a message of type `descriptor` with these options.
    pub fn decode<B: Buf>(
        &self,
        descriptor: &Arc<MessageDescriptor>,
        mut data: B,
    ) -> Result<Message, DecodeError> {
        let data = data.copy_to_bytes(data.remaining());
        decode_message(descriptor, data, self, 0).inspect_err(|err| {
            tracing::debug!(message = %descriptor.name(), error = %err, "decode failed");
        })
    }
}

/// Decode one message body spanning all of `data`.
///
/// `depth` is the nesting level of this message, zero for the outermost.
pub(crate) fn decode_message(
    descriptor: &Arc<MessageDescriptor>,
    data: Bytes,
    options: &DecodeOptions,
    depth: u32,
) -> Result<Message, DecodeError> {
    let mut fields = FieldSet::new(descriptor);
    let mut buf = data.clone();

    while buf.has_remaining() {
        let record_start = data.len() - buf.remaining();
        let key = decode_key(&mut buf)?;
        let (wire_type, number) = key.into_parts();

        match descriptor.field_by_number(number) {
            Some(field) => {
                decode_field(descriptor, field, wire_type, &mut buf, &mut fields, options, depth)?
            }
            None => {
                let value_start = data.len() - buf.remaining();
                skip_field(wire_type, &mut buf)?;
                let record_end = data.len() - buf.remaining();

                if options.discard_unknown_fields {
                    continue;
                }
                tracing::trace!(
                    message = %descriptor.name(),
                    number,
                    ?wire_type,
                    len = record_end - value_start,
                    "preserving unknown field"
                );
                fields.unknown_mut().push(UnknownField::new(
                    key,
                    data.slice(record_start..record_end),
                    value_start - record_start,
                ));
            }
        }
    }

    Ok(Message::from_parts(Arc::clone(descriptor), fields))
}

fn decode_field(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut Bytes,
    fields: &mut FieldSet,
    options: &DecodeOptions,
    depth: u32,
) -> Result<(), DecodeError> {
    if wire_type != field.wire_type() {
        if field.is_repeated() && wire_type == WireType::Len && field.kind().is_packable() {
            let mut packed = decode_len_delimited(buf)?;
            while packed.has_remaining() {
                let value = decode_value(descriptor, field, &mut packed, options, depth)?;
                if let Some(values) = fields.values_mut(field) {
                    values.push(value);
                }
            }
            return Ok(());
        }

        return Err(DecodeError::WireTypeMismatch {
            message: descriptor.name().to_string(),
            field: field.name().to_string(),
            number: field.number(),
            expected: field.wire_type(),
            actual: wire_type,
        });
    }

    let value = decode_value(descriptor, field, buf, options, depth)?;
    if field.is_repeated() {
        if let Some(values) = fields.values_mut(field) {
            values.push(value);
        }
    } else {
        // Last one wins, also for embedded messages and across a oneof.
        fields.set(field, value);
    }
    Ok(())
}

/// Decode a single value of `field`'s kind, the key already consumed.
fn decode_value(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
    buf: &mut Bytes,
    options: &DecodeOptions,
    depth: u32,
) -> Result<Value, DecodeError> {
    let value = match field.kind() {
        FieldKind::Bool => Value::Bool(decode_varint_buf(buf)? != 0),
        // 32-bit varints keep the low 32 bits, negatives arrive sign extended.
        FieldKind::Int32 => Value::I32(decode_varint_buf(buf)? as i32),
        FieldKind::Int64 => Value::I64(decode_varint_buf(buf)? as i64),
        FieldKind::Uint32 => Value::U32(decode_varint_buf(buf)? as u32),
        FieldKind::Uint64 => Value::U64(decode_varint_buf(buf)?),
        FieldKind::Sint32 => Value::I32(decode_zigzag32(decode_varint_buf(buf)? as u32)),
        FieldKind::Sint64 => Value::I64(decode_zigzag64(decode_varint_buf(buf)?)),
        FieldKind::Fixed32 => Value::U32(fixed(buf, 4, Bytes::get_u32_le)?),
        FieldKind::Sfixed32 => Value::I32(fixed(buf, 4, Bytes::get_i32_le)?),
        FieldKind::Float => Value::F32(fixed(buf, 4, Bytes::get_f32_le)?),
        FieldKind::Fixed64 => Value::U64(fixed(buf, 8, Bytes::get_u64_le)?),
        FieldKind::Sfixed64 => Value::I64(fixed(buf, 8, Bytes::get_i64_le)?),
        FieldKind::Double => Value::F64(fixed(buf, 8, Bytes::get_f64_le)?),
        FieldKind::String => {
            let data = decode_len_delimited(buf)?;
            let string = ProtoString::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8 {
                message: descriptor.name().to_string(),
                field: field.name().to_string(),
            })?;
            Value::String(string)
        }
        FieldKind::Bytes => Value::Bytes(decode_len_delimited(buf)?),
        FieldKind::Enum(enumeration) => {
            let number = decode_varint_buf(buf)? as i32;
            if !enumeration.is_known(number) {
                tracing::trace!(
                    enumeration = %enumeration.name(),
                    number,
                    "unrecognized enum value"
                );
            }
            Value::Enum(number)
        }
        FieldKind::Message(nested) => {
            if depth >= options.recursion_limit {
                return Err(DecodeError::RecursionLimitExceeded {
                    limit: options.recursion_limit,
                });
            }
            let data = decode_len_delimited(buf)?;
            Value::Message(decode_message(nested, data, options, depth + 1)?)
        }
    };
    Ok(value)
}

#[inline]
fn fixed<T>(buf: &mut Bytes, width: usize, get: fn(&mut Bytes) -> T) -> Result<T, DecodeError> {
    if buf.remaining() < width {
        return Err(DecodeError::truncated());
    }
    Ok(get(buf))
}
