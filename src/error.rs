//! Error types for the codec, the schema registry and the field accessors.

use crate::wire::WireType;

/// Failure while decoding protobuf encoded bytes.
///
/// Decoding is all-or-nothing: whenever one of these is returned no
/// [`Message`](crate::Message) has been produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated input: buffer ends inside a tag or value")]
    TruncatedInput,
    #[error("malformed varint: longer than 10 bytes or overflows 64 bits")]
    MalformedVarint,
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    #[error("invalid field number: {number}")]
    InvalidFieldNumber { number: u64 },
    #[error(
        "wire type mismatch for field '{field}' ({number}) of '{message}': \
         expected {expected:?}, found {actual:?}"
    )]
    WireTypeMismatch {
        message: String,
        field: String,
        number: u32,
        expected: WireType,
        actual: WireType,
    },
    #[error("invalid UTF-8 in string field '{field}' of '{message}'")]
    InvalidUtf8 { message: String, field: String },
    #[error("length prefix {value} exceeds platform addressable memory")]
    LengthOverflow { value: u64 },
    #[error("message nesting exceeds the recursion limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },
}

impl DecodeError {
    #[cold]
    pub(crate) fn truncated() -> Self {
        DecodeError::TruncatedInput
    }

    #[cold]
    pub(crate) fn malformed_varint() -> Self {
        DecodeError::MalformedVarint
    }
}

/// Failure while encoding.
///
/// A [`Message`](crate::Message) built against a validated descriptor always
/// encodes, so this only surfaces from the raw [`wire`](crate::wire) helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("invalid field number: {number} (expected 1..=536870911)")]
    InvalidFieldNumber { number: u32 },
}

/// An invalid message or enum descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field '{field}' of '{message}' has invalid number {number}")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: u32,
    },
    #[error("field number {number} is declared twice in '{message}'")]
    DuplicateFieldNumber { message: String, number: u32 },
    #[error("field name '{name}' is declared twice in '{message}'")]
    DuplicateFieldName { message: String, name: String },
    #[error("oneof '{oneof}' is declared twice in '{message}'")]
    DuplicateOneof { message: String, oneof: String },
    #[error("oneof '{oneof}' of '{message}' has no members")]
    EmptyOneof { message: String, oneof: String },
    #[error("enum '{name}' declares no values")]
    EmptyEnum { name: String },
    #[error("first value of enum '{name}' must be 0, found {number}")]
    EnumMissingZero { name: String, number: i32 },
    #[error("enum '{name}' declares value '{value}' twice")]
    DuplicateEnumValue { name: String, value: String },
    #[error("a different type named '{name}' is already registered")]
    DuplicateRegistration { name: String },
}

/// Misuse of the field accessors on a message or builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("'{message}' has no field {field}")]
    NoSuchField { message: String, field: String },
    #[error("'{message}' has no oneof '{oneof}'")]
    NoSuchOneof { message: String, oneof: String },
    #[error("field '{field}' of '{message}' is {expected}, got a {actual} value")]
    KindMismatch {
        message: String,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("field '{field}' of '{message}' is repeated")]
    Repeated { message: String, field: String },
    #[error("field '{field}' of '{message}' is not repeated")]
    NotRepeated { message: String, field: String },
    #[error("enum '{enumeration}' has no value named '{symbol}'")]
    UnknownEnumSymbol { enumeration: String, symbol: String },
}

/// Failure while parsing the JSON projection of a message.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("expected a JSON object for '{message}'")]
    ExpectedObject { message: String },
    #[error("'{message}' has no field named '{field}'")]
    UnknownField { message: String, field: String },
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Any error produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
