//! Immutable message values.

use std::sync::Arc;

use crate::builder::MessageBuilder;
use crate::error::FieldError;
use crate::schema::{
    EnumSymbol, FieldDescriptor, FieldKind, MessageDescriptor, OneofDescriptor, Storage,
};
use crate::unknown::UnknownFields;
use crate::value::Value;

/// Anything that names a field of a message: its number, its declared or
/// JSON name, or its descriptor.
pub trait FieldKey {
    /// Find the field in `descriptor`.
    fn resolve<'d>(&self, descriptor: &'d MessageDescriptor) -> Option<&'d FieldDescriptor>;

    /// How to refer to the field in error messages.
    fn describe(&self) -> String;
}

impl FieldKey for u32 {
    fn resolve<'d>(&self, descriptor: &'d MessageDescriptor) -> Option<&'d FieldDescriptor> {
        descriptor.field_by_number(*self)
    }

    fn describe(&self) -> String {
        format!("#{self}")
    }
}

// Lets unsuffixed literals such as `message.get_i64(1)` resolve.
impl FieldKey for i32 {
    fn resolve<'d>(&self, descriptor: &'d MessageDescriptor) -> Option<&'d FieldDescriptor> {
        u32::try_from(*self)
            .ok()
            .and_then(|number| descriptor.field_by_number(number))
    }

    fn describe(&self) -> String {
        format!("#{self}")
    }
}

impl FieldKey for &str {
    fn resolve<'d>(&self, descriptor: &'d MessageDescriptor) -> Option<&'d FieldDescriptor> {
        descriptor.field_by_name(self)
    }

    fn describe(&self) -> String {
        format!("'{self}'")
    }
}

impl FieldKey for &FieldDescriptor {
    fn resolve<'d>(&self, descriptor: &'d MessageDescriptor) -> Option<&'d FieldDescriptor> {
        descriptor
            .field_by_number(self.number())
            .filter(|field| field.name() == self.name())
    }

    fn describe(&self) -> String {
        format!("'{}'", self.name())
    }
}

pub(crate) fn resolve<'d>(
    descriptor: &'d MessageDescriptor,
    key: impl FieldKey,
) -> Result<&'d FieldDescriptor, FieldError> {
    key.resolve(descriptor).ok_or_else(|| FieldError::NoSuchField {
        message: descriptor.name().to_string(),
        field: key.describe(),
    })
}

pub(crate) fn kind_mismatch(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
    actual: &'static str,
) -> FieldError {
    FieldError::KindMismatch {
        message: descriptor.name().to_string(),
        field: field.name().to_string(),
        expected: field.kind().name(),
        actual,
    }
}

pub(crate) fn repeated_error(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
) -> FieldError {
    FieldError::Repeated {
        message: descriptor.name().to_string(),
        field: field.name().to_string(),
    }
}

pub(crate) fn not_repeated_error(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
) -> FieldError {
    FieldError::NotRepeated {
        message: descriptor.name().to_string(),
        field: field.name().to_string(),
    }
}

/// Storage of one non-oneof field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Singular(Option<Value>),
    Repeated(Vec<Value>),
}

/// The active member of a oneof group.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OneofCase {
    /// Declaration index of the member field.
    pub(crate) field: usize,
    pub(crate) value: Value,
}

/// Field values laid out after a [`MessageDescriptor`].
///
/// Shared by [`Message`] and [`MessageBuilder`]. Each oneof group is a
/// single tagged slot, so at most one member can ever be present.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldSet {
    slots: Vec<Slot>,
    oneofs: Vec<Option<OneofCase>>,
    unknown: UnknownFields,
}

impl FieldSet {
    pub(crate) fn new(descriptor: &MessageDescriptor) -> Self {
        let mut slots = Vec::with_capacity(descriptor.slot_count());
        for field in descriptor.fields() {
            if let Storage::Slot(_) = field.storage() {
                slots.push(if field.is_repeated() {
                    Slot::Repeated(Vec::new())
                } else {
                    Slot::Singular(None)
                });
            }
        }
        FieldSet {
            slots,
            oneofs: vec![None; descriptor.oneofs().len()],
            unknown: UnknownFields::default(),
        }
    }

    /// The value of a singular field, `None` when absent.
    pub(crate) fn value(&self, field: &FieldDescriptor) -> Option<&Value> {
        match field.storage() {
            Storage::Slot(slot) => match &self.slots[slot] {
                Slot::Singular(value) => value.as_ref(),
                Slot::Repeated(_) => None,
            },
            Storage::Oneof(group) => self.oneofs[group]
                .as_ref()
                .filter(|case| case.field == field.index())
                .map(|case| &case.value),
        }
    }

    /// The elements of a repeated field.
    pub(crate) fn values(&self, field: &FieldDescriptor) -> &[Value] {
        match field.storage() {
            Storage::Slot(slot) => match &self.slots[slot] {
                Slot::Repeated(values) => values,
                Slot::Singular(_) => &[],
            },
            Storage::Oneof(_) => &[],
        }
    }

    pub(crate) fn values_mut(&mut self, field: &FieldDescriptor) -> Option<&mut Vec<Value>> {
        match field.storage() {
            Storage::Slot(slot) => match &mut self.slots[slot] {
                Slot::Repeated(values) => Some(values),
                Slot::Singular(_) => None,
            },
            Storage::Oneof(_) => None,
        }
    }

    pub(crate) fn has(&self, field: &FieldDescriptor) -> bool {
        if field.is_repeated() {
            !self.values(field).is_empty()
        } else {
            self.value(field).is_some()
        }
    }

    /// Store a singular value, displacing any other member of its oneof.
    ///
    /// Zero values clear implicit-presence fields.
    pub(crate) fn set(&mut self, field: &FieldDescriptor, value: Value) {
        if !field.has_explicit_presence() && value.is_default() {
            self.clear(field);
            return;
        }
        match field.storage() {
            Storage::Slot(slot) => self.slots[slot] = Slot::Singular(Some(value)),
            Storage::Oneof(group) => {
                self.oneofs[group] = Some(OneofCase {
                    field: field.index(),
                    value,
                })
            }
        }
    }

    pub(crate) fn clear(&mut self, field: &FieldDescriptor) {
        match field.storage() {
            Storage::Slot(slot) => match &mut self.slots[slot] {
                Slot::Singular(value) => *value = None,
                Slot::Repeated(values) => values.clear(),
            },
            Storage::Oneof(group) => {
                if self.active_oneof(group) == Some(field.index()) {
                    self.oneofs[group] = None;
                }
            }
        }
    }

    /// Declaration index of the active member of oneof `group`.
    pub(crate) fn active_oneof(&self, group: usize) -> Option<usize> {
        self.oneofs
            .get(group)
            .and_then(|case| case.as_ref())
            .map(|case| case.field)
    }

    pub(crate) fn unknown(&self) -> &UnknownFields {
        &self.unknown
    }

    pub(crate) fn unknown_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }
}

/// Read accessors shared by [`Message`] and [`MessageBuilder`].
///
/// Expects the type to provide `descriptor()` and `field_set()`.
macro_rules! impl_field_reads {
    ($ty:ty) => {
        impl $ty {
            /// Whether `key` is present.
            ///
            /// Repeated fields are present when non-empty, implicit-presence
            /// fields when non-zero.
            pub fn has(&self, key: impl FieldKey) -> Result<bool, FieldError> {
                let field = $crate::message::resolve(self.descriptor(), key)?;
                Ok(self.field_set().has(field))
            }

            pub fn get_bool(&self, key: impl FieldKey) -> Result<bool, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::Bool(v))) => Ok(*v),
                    (FieldKind::Bool, None) => Ok(false),
                    _ => Err(self.mismatch(field, "bool")),
                }
            }

            /// Value of an `int32`, `sint32` or `sfixed32` field.
            pub fn get_i32(&self, key: impl FieldKey) -> Result<i32, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::I32(v))) => Ok(*v),
                    (FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32, None) => Ok(0),
                    _ => Err(self.mismatch(field, "i32")),
                }
            }

            /// Value of an `int64`, `sint64` or `sfixed64` field.
            pub fn get_i64(&self, key: impl FieldKey) -> Result<i64, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::I64(v))) => Ok(*v),
                    (FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64, None) => Ok(0),
                    _ => Err(self.mismatch(field, "i64")),
                }
            }

            /// Value of a `uint32` or `fixed32` field.
            pub fn get_u32(&self, key: impl FieldKey) -> Result<u32, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::U32(v))) => Ok(*v),
                    (FieldKind::Uint32 | FieldKind::Fixed32, None) => Ok(0),
                    _ => Err(self.mismatch(field, "u32")),
                }
            }

            /// Value of a `uint64` or `fixed64` field.
            pub fn get_u64(&self, key: impl FieldKey) -> Result<u64, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::U64(v))) => Ok(*v),
                    (FieldKind::Uint64 | FieldKind::Fixed64, None) => Ok(0),
                    _ => Err(self.mismatch(field, "u64")),
                }
            }

            pub fn get_f32(&self, key: impl FieldKey) -> Result<f32, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::F32(v))) => Ok(*v),
                    (FieldKind::Float, None) => Ok(0.0),
                    _ => Err(self.mismatch(field, "f32")),
                }
            }

            pub fn get_f64(&self, key: impl FieldKey) -> Result<f64, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::F64(v))) => Ok(*v),
                    (FieldKind::Double, None) => Ok(0.0),
                    _ => Err(self.mismatch(field, "f64")),
                }
            }

            /// Value of a `string` field, `""` when absent.
            pub fn get_str(&self, key: impl FieldKey) -> Result<&str, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::String(v))) => Ok(v.as_str()),
                    (FieldKind::String, None) => Ok(""),
                    _ => Err(self.mismatch(field, "string")),
                }
            }

            /// Value of a `bytes` field, empty when absent.
            pub fn get_bytes(&self, key: impl FieldKey) -> Result<&[u8], FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::Bytes(v))) => Ok(&v[..]),
                    (FieldKind::Bytes, None) => Ok(&[]),
                    _ => Err(self.mismatch(field, "bytes")),
                }
            }

            /// Raw number of an enum field, recognized or not.
            pub fn get_enum_number(&self, key: impl FieldKey) -> Result<i32, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (_, Some(Value::Enum(v))) => Ok(*v),
                    (FieldKind::Enum(descriptor), None) => Ok(descriptor.default_number()),
                    _ => Err(self.mismatch(field, "enum")),
                }
            }

            /// Symbolic view of an enum field.
            pub fn get_enum(&self, key: impl FieldKey) -> Result<EnumSymbol<'_>, FieldError> {
                let (field, value) = self.singular(key)?;
                match (field.kind(), value) {
                    (FieldKind::Enum(descriptor), Some(Value::Enum(v))) => {
                        Ok(descriptor.symbol(*v))
                    }
                    (FieldKind::Enum(descriptor), None) => {
                        Ok(descriptor.symbol(descriptor.default_number()))
                    }
                    _ => Err(self.mismatch(field, "enum")),
                }
            }

            /// Elements of a repeated field, in order.
            pub fn get_repeated(&self, key: impl FieldKey) -> Result<&[Value], FieldError> {
                let field = $crate::message::resolve(self.descriptor(), key)?;
                if !field.is_repeated() {
                    return Err($crate::message::not_repeated_error(self.descriptor(), field));
                }
                Ok(self.field_set().values(field))
            }

            /// The member of oneof `name` that is currently set, if any.
            pub fn active_oneof(&self, name: &str) -> Result<Option<&FieldDescriptor>, FieldError> {
                let descriptor = self.descriptor();
                let oneof = descriptor.oneof_by_name(name).ok_or_else(|| {
                    FieldError::NoSuchOneof {
                        message: descriptor.name().to_string(),
                        oneof: name.to_string(),
                    }
                })?;
                Ok(self
                    .field_set()
                    .active_oneof(oneof.index())
                    .map(|idx| &descriptor.fields()[idx]))
            }

            /// Records this message's schema does not declare.
            pub fn unknown_fields(&self) -> &$crate::unknown::UnknownFields {
                self.field_set().unknown()
            }

            fn singular(
                &self,
                key: impl FieldKey,
            ) -> Result<(&FieldDescriptor, Option<&Value>), FieldError> {
                let field = $crate::message::resolve(self.descriptor(), key)?;
                if field.is_repeated() {
                    return Err($crate::message::repeated_error(self.descriptor(), field));
                }
                Ok((field, self.field_set().value(field)))
            }

            fn mismatch(&self, field: &FieldDescriptor, actual: &'static str) -> FieldError {
                $crate::message::kind_mismatch(self.descriptor(), field, actual)
            }
        }
    };
}

pub(crate) use impl_field_reads;

#[derive(Debug)]
struct MessageInner {
    descriptor: Arc<MessageDescriptor>,
    fields: FieldSet,
}

/// An immutable message value.
///
/// Produced by [`MessageBuilder::build`] or by decoding. Cloning is cheap,
/// the fields are shared behind an [`Arc`], which also makes messages safe
/// to share between threads.
#[derive(Clone)]
pub struct Message(Arc<MessageInner>);

impl Message {
    /// An empty message of type `descriptor`, every field absent.
    pub fn new(descriptor: &Arc<MessageDescriptor>) -> Self {
        Message::from_parts(Arc::clone(descriptor), FieldSet::new(descriptor))
    }

    /// A fresh builder for messages of type `descriptor`.
    pub fn builder(descriptor: &Arc<MessageDescriptor>) -> MessageBuilder {
        MessageBuilder::new(descriptor)
    }

    pub(crate) fn from_parts(descriptor: Arc<MessageDescriptor>, fields: FieldSet) -> Self {
        Message(Arc::new(MessageInner { descriptor, fields }))
    }

    /// The type of this message.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.0.descriptor
    }

    pub(crate) fn field_set(&self) -> &FieldSet {
        &self.0.fields
    }

    /// A builder starting from this message's contents.
    ///
    /// Nested messages and string or bytes payloads are shared, not copied.
    pub fn to_builder(&self) -> MessageBuilder {
        MessageBuilder::from_parts(Arc::clone(self.descriptor()), self.field_set().clone())
    }

    /// Value of a singular field, its zero value when absent.
    pub fn get(&self, key: impl FieldKey) -> Result<Value, FieldError> {
        let (field, value) = self.singular(key)?;
        Ok(value.cloned().unwrap_or_else(|| field.default_value()))
    }

    /// Value of a message field, an empty message when absent.
    pub fn get_message(&self, key: impl FieldKey) -> Result<Message, FieldError> {
        let (field, value) = self.singular(key)?;
        match (field.kind(), value) {
            (_, Some(Value::Message(message))) => Ok(message.clone()),
            (FieldKind::Message(descriptor), None) => Ok(Message::new(descriptor)),
            _ => Err(self.mismatch(field, "message")),
        }
    }

    /// Present fields in ascending field number order.
    pub fn present_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.descriptor()
            .fields_in_number_order()
            .filter(move |field| self.field_set().has(field))
    }

    /// The oneof descriptor for `name` paired with its active member.
    pub fn oneof_case(&self, name: &str) -> Option<(&OneofDescriptor, Option<&Value>)> {
        let oneof = self.descriptor().oneof_by_name(name)?;
        let value = self
            .field_set()
            .active_oneof(oneof.index())
            .and_then(|idx| self.field_set().value(&self.descriptor().fields()[idx]));
        Some((oneof, value))
    }

    /// Whether no field is present and no unknown records are held.
    pub fn is_empty(&self) -> bool {
        self.present_fields().next().is_none() && self.unknown_fields().is_empty()
    }
}

impl_field_reads!(Message);

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.descriptor().name() == other.descriptor().name()
                && self.field_set() == other.field_set())
    }
}

impl core::fmt::Debug for Message {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut s = f.debug_struct(self.descriptor().name());
        for field in self.present_fields() {
            if field.is_repeated() {
                s.field(field.name(), &self.field_set().values(field));
            } else if let Some(value) = self.field_set().value(field) {
                s.field(field.name(), value);
            }
        }
        if !self.unknown_fields().is_empty() {
            s.field("unknown_fields", &self.unknown_fields().len());
        }
        s.finish()
    }
}
