//! Static descriptions of message and enum types.
//!
//! Descriptors are built once, validated, and shared behind an [`Arc`]. A
//! message field of message or enum kind holds the descriptor it refers to,
//! so schema graphs are acyclic by construction.

mod enumeration;
mod field;
mod message;
mod registry;

use std::sync::Arc;

pub use enumeration::{EnumDescriptor, EnumDescriptorBuilder, EnumSymbol, EnumValueDescriptor};
pub use field::FieldDescriptor;
pub use message::{MessageDescriptor, MessageDescriptorBuilder, OneofBuilder, OneofDescriptor};
pub use registry::{Registry, RegistryBuilder};

pub(crate) use field::Storage;

use crate::value::{ProtoString, Value};
use crate::wire::WireType;
use crate::Message;

/// The declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    /// Zig-zag encoded `int32`.
    Sint32,
    /// Zig-zag encoded `int64`.
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    String,
    Bytes,
    /// An open enum, any `i32` is representable.
    Enum(Arc<EnumDescriptor>),
    /// An embedded message.
    Message(Arc<MessageDescriptor>),
}

impl FieldKind {
    /// The [`WireType`] a single value of this kind is encoded with.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldKind::Bool
            | FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Uint32
            | FieldKind::Uint64
            | FieldKind::Sint32
            | FieldKind::Sint64
            | FieldKind::Enum(_) => WireType::Varint,
            FieldKind::Fixed32 | FieldKind::Sfixed32 | FieldKind::Float => WireType::I32,
            FieldKind::Fixed64 | FieldKind::Sfixed64 | FieldKind::Double => WireType::I64,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) => WireType::Len,
        }
    }

    /// Name of this kind as it would appear in a `.proto` file.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Sint32 => "sint32",
            FieldKind::Sint64 => "sint64",
            FieldKind::Fixed32 => "fixed32",
            FieldKind::Fixed64 => "fixed64",
            FieldKind::Sfixed32 => "sfixed32",
            FieldKind::Sfixed64 => "sfixed64",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Enum(_) => "enum",
            FieldKind::Message(_) => "message",
        }
    }

    /// Whether repeated fields of this kind may arrive packed.
    pub fn is_packable(&self) -> bool {
        !matches!(
            self,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_)
        )
    }

    /// The zero value a field of this kind reads as when absent.
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => Value::I32(0),
            FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => Value::I64(0),
            FieldKind::Uint32 | FieldKind::Fixed32 => Value::U32(0),
            FieldKind::Uint64 | FieldKind::Fixed64 => Value::U64(0),
            FieldKind::Float => Value::F32(0.0),
            FieldKind::Double => Value::F64(0.0),
            FieldKind::String => Value::String(ProtoString::default()),
            FieldKind::Bytes => Value::Bytes(bytes::Bytes::new()),
            FieldKind::Enum(descriptor) => Value::Enum(descriptor.default_number()),
            FieldKind::Message(descriptor) => Value::Message(Message::new(descriptor)),
        }
    }

    /// Whether `value` can be stored in a field of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32, Value::I32(_))
            | (FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64, Value::I64(_))
            | (FieldKind::Uint32 | FieldKind::Fixed32, Value::U32(_))
            | (FieldKind::Uint64 | FieldKind::Fixed64, Value::U64(_))
            | (FieldKind::Float, Value::F32(_))
            | (FieldKind::Double, Value::F64(_))
            | (FieldKind::String, Value::String(_))
            | (FieldKind::Bytes, Value::Bytes(_))
            | (FieldKind::Enum(_), Value::Enum(_)) => true,
            (FieldKind::Message(expected), Value::Message(message)) => {
                Arc::ptr_eq(expected, message.descriptor())
                    || expected.name() == message.descriptor().name()
            }
            _ => false,
        }
    }

    /// Convert `value` to the variant this kind stores, if lossless.
    ///
    /// Integers convert between widths and signedness when in range, so a
    /// plain `42` can be stored in an `int64` field. `f64` narrows to `f32`.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        if self.accepts(&value) {
            return Some(value);
        }
        if let (FieldKind::Float, Value::F64(v)) = (self, &value) {
            return Some(Value::F32(*v as f32));
        }

        let int = match value {
            Value::I32(v) => i128::from(v),
            Value::I64(v) => i128::from(v),
            Value::U32(v) => i128::from(v),
            Value::U64(v) => i128::from(v),
            _ => return None,
        };
        match self {
            FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => {
                i32::try_from(int).ok().map(Value::I32)
            }
            FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => {
                i64::try_from(int).ok().map(Value::I64)
            }
            FieldKind::Uint32 | FieldKind::Fixed32 => u32::try_from(int).ok().map(Value::U32),
            FieldKind::Uint64 | FieldKind::Fixed64 => u64::try_from(int).ok().map(Value::U64),
            FieldKind::Enum(_) => i32::try_from(int).ok().map(Value::Enum),
            _ => None,
        }
    }
}

/// How many values a field holds and whether it tracks presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A singular field with implicit presence (proto3 default).
    ///
    /// Present exactly when it holds a non-zero value.
    Singular,
    /// A singular field with explicit presence (`optional`).
    ///
    /// Setting the zero value is observably different from never setting it.
    Optional,
    /// A repeated field.
    Repeated,
}

impl Cardinality {
    /// Returns whether this field can appear multiple times.
    pub fn is_repeated(&self) -> bool {
        matches!(self, Cardinality::Repeated)
    }
}
