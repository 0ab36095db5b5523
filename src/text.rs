//! Protobuf text format rendering, used by the `Display` impls.
//!
//! ```text
//! id: 42
//! name: "Test"
//! tags: "vip"
//! tags: "beta"
//! contact {
//!   zip: "12345"
//! }
//! 15: 7
//! ```

use core::fmt::{self, Write};

use crate::schema::FieldKind;
use crate::unknown::UnknownField;
use crate::value::Value;
use crate::wire::{decode_len, WireType};
use crate::{Message, MessageBuilder};

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_message(f, self, 0)
    }
}

impl fmt::Display for MessageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_message(f, &self.build(), 0)
    }
}

fn write_message<W: Write>(out: &mut W, message: &Message, indent: usize) -> fmt::Result {
    let fields = message.field_set();
    for field in message.present_fields() {
        if field.is_repeated() {
            for value in fields.values(field) {
                write_field(out, field.name(), field.kind(), value, indent)?;
            }
        } else if let Some(value) = fields.value(field) {
            write_field(out, field.name(), field.kind(), value, indent)?;
        }
    }
    for unknown in message.unknown_fields() {
        write_unknown(out, unknown, indent)?;
    }
    Ok(())
}

fn write_field<W: Write>(
    out: &mut W,
    name: &str,
    kind: &FieldKind,
    value: &Value,
    indent: usize,
) -> fmt::Result {
    write!(out, "{:indent$}{name}", "", indent = indent)?;
    match (kind, value) {
        (_, Value::Message(nested)) => {
            writeln!(out, " {{")?;
            write_message(out, nested, indent + 2)?;
            return writeln!(out, "{:indent$}}}", "", indent = indent);
        }
        (FieldKind::Enum(enumeration), Value::Enum(number)) => {
            match enumeration.number_to_name(*number) {
                Some(symbol) => write!(out, ": {symbol}")?,
                None => write!(out, ": {number}")?,
            }
        }
        (_, Value::Bool(v)) => write!(out, ": {v}")?,
        (_, Value::I32(v) | Value::Enum(v)) => write!(out, ": {v}")?,
        (_, Value::I64(v)) => write!(out, ": {v}")?,
        (_, Value::U32(v)) => write!(out, ": {v}")?,
        (_, Value::U64(v)) => write!(out, ": {v}")?,
        (_, Value::F32(v)) if v.is_nan() => out.write_str(": nan")?,
        (_, Value::F64(v)) if v.is_nan() => out.write_str(": nan")?,
        (_, Value::F32(v)) => write!(out, ": {v}")?,
        (_, Value::F64(v)) => write!(out, ": {v}")?,
        (_, Value::String(v)) => {
            out.write_str(": \"")?;
            escape_str(out, v.as_str())?;
            out.write_char('"')?;
        }
        (_, Value::Bytes(v)) => {
            out.write_str(": \"")?;
            escape_bytes(out, v)?;
            out.write_char('"')?;
        }
    }
    out.write_char('\n')
}

fn write_unknown<W: Write>(out: &mut W, unknown: &UnknownField, indent: usize) -> fmt::Result {
    let number = unknown.number();
    let raw = unknown.raw_value();
    write!(out, "{:indent$}{number}: ", "", indent = indent)?;
    match unknown.wire_type() {
        WireType::Varint => match crate::wire::decode_varint(raw, 0) {
            Ok((value, _)) => write!(out, "{value}")?,
            Err(_) => out.write_str("?")?,
        },
        WireType::I32 => write!(out, "0x{:08x}", le_value(raw))?,
        WireType::I64 => write!(out, "0x{:016x}", le_value(raw))?,
        WireType::Len => {
            let mut payload = raw;
            if decode_len(&mut payload).is_err() {
                payload = raw;
            }
            out.write_char('"')?;
            escape_bytes(out, payload)?;
            out.write_char('"')?;
        }
    }
    out.write_char('\n')
}

fn le_value(raw: &[u8]) -> u64 {
    raw.iter()
        .rev()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

fn escape_char<W: Write>(out: &mut W, c: char) -> Result<bool, fmt::Error> {
    match c {
        '\n' => out.write_str("\\n")?,
        '\r' => out.write_str("\\r")?,
        '\t' => out.write_str("\\t")?,
        '"' => out.write_str("\\\"")?,
        '\'' => out.write_str("\\'")?,
        '\\' => out.write_str("\\\\")?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// Escapes control characters, quotes and backslashes, other text is kept.
fn escape_str<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    for c in s.chars() {
        if escape_char(out, c)? {
            continue;
        }
        if c.is_control() {
            for byte in c.to_string().bytes() {
                write!(out, "\\{byte:03o}")?;
            }
        } else {
            out.write_char(c)?;
        }
    }
    Ok(())
}

/// Escapes everything outside printable ASCII as octal.
fn escape_bytes<W: Write>(out: &mut W, data: &[u8]) -> fmt::Result {
    for &byte in data {
        if escape_char(out, char::from(byte))? {
            continue;
        }
        if (0x20..0x7f).contains(&byte) {
            out.write_char(char::from(byte))?;
        } else {
            write!(out, "\\{byte:03o}")?;
        }
    }
    Ok(())
}
