//! Dynamically typed field values.

use core::fmt;
use core::str::Utf8Error;

use bytes::Bytes;

use crate::Message;

/// Contents of a `string` field: UTF-8 validated, reference counted bytes.
///
/// Decoding slices these out of the input buffer without copying.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ProtoString(Bytes);

impl ProtoString {
    /// Wrap `data`, failing if it is not valid UTF-8.
    pub fn from_utf8(data: Bytes) -> Result<Self, Utf8Error> {
        core::str::from_utf8(&data)?;
        Ok(ProtoString(data))
    }

    /// Returns the string as a `&str`.
    pub fn as_str(&self) -> &str {
        // SAFETY: every constructor validates or starts from UTF-8.
        unsafe { core::str::from_utf8_unchecked(&self.0) }
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the string and returns the underlying [`Bytes`].
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl core::ops::Deref for ProtoString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Debug for ProtoString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ProtoString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProtoString {
    fn from(s: &str) -> Self {
        ProtoString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for ProtoString {
    fn from(s: String) -> Self {
        ProtoString(Bytes::from(s))
    }
}

/// A single field value.
///
/// Every [`FieldKind`](crate::schema::FieldKind) maps onto exactly one
/// variant, e.g. `sint64` and `sfixed64` fields both hold [`Value::I64`].
/// Enum fields hold their raw number so unrecognized values survive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(ProtoString),
    Bytes(Bytes),
    Enum(i32),
    Message(Message),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
        }
    }

    /// Whether this is the zero value of its type.
    ///
    /// `-0.0` is not a zero value, it has a distinct encoding. Messages are
    /// never zero values, an empty message is still present.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Bool(v) => !v,
            Value::I32(v) | Value::Enum(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::F32(v) => v.to_bits() == 0,
            Value::F64(v) => v.to_bits() == 0,
            Value::String(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Message(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Integer payload of any integer-like variant, widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) | Value::Enum(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U32(v) => Some(i64::from(*v)),
            Value::U64(v) => i64::try_from(*v).ok(),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        }
    )+};
}

impl_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    &str => String,
    String => String,
    ProtoString => String,
    Bytes => Bytes,
    Vec<u8> => Bytes,
    &'static [u8] => Bytes,
    Message => Message,
}
