//! Mutable staging area for messages.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::FieldError;
use crate::message::{
    impl_field_reads, kind_mismatch, not_repeated_error, repeated_error, resolve, FieldKey,
    FieldSet,
};
use crate::schema::{EnumSymbol, FieldDescriptor, FieldKind, MessageDescriptor};
use crate::value::Value;
use crate::Message;

/// Accumulates field assignments and produces [`Message`] snapshots.
///
/// Setting a member of a oneof immediately clears the other members of the
/// group. [`MessageBuilder::build`] copies, so the builder stays usable and
/// later edits never reach messages that were already built.
///
/// ```
/// use protodrift::schema::{FieldKind, MessageDescriptor};
/// use protodrift::Message;
///
/// let user = MessageDescriptor::builder("User")
///     .field(1, "id", FieldKind::Int64)
///     .field(2, "name", FieldKind::String)
///     .build()
///     .unwrap();
///
/// let mut builder = Message::builder(&user);
/// builder.set("id", 42)?.set("name", "Test")?;
/// let message = builder.build();
///
/// assert_eq!(message.get_i64("id")?, 42);
/// # Ok::<(), protodrift::error::FieldError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    descriptor: Arc<MessageDescriptor>,
    fields: FieldSet,
    /// Pending edits to singular message fields, keyed by declaration index.
    ///
    /// An entry exists only while its field is set.
    nested: BTreeMap<usize, MessageBuilder>,
}

impl MessageBuilder {
    /// An empty builder for messages of type `descriptor`.
    pub fn new(descriptor: &Arc<MessageDescriptor>) -> Self {
        MessageBuilder::from_parts(Arc::clone(descriptor), FieldSet::new(descriptor))
    }

    pub(crate) fn from_parts(descriptor: Arc<MessageDescriptor>, fields: FieldSet) -> Self {
        MessageBuilder {
            descriptor,
            fields,
            nested: BTreeMap::new(),
        }
    }

    /// The type of message being built.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn field_set(&self) -> &FieldSet {
        &self.fields
    }

    /// Set a singular field.
    ///
    /// Setting an implicit-presence field to its zero value clears it.
    pub fn set(
        &mut self,
        key: impl FieldKey,
        value: impl Into<Value>,
    ) -> Result<&mut Self, FieldError> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = resolve(&descriptor, key)?;
        if field.is_repeated() {
            return Err(repeated_error(&descriptor, field));
        }
        let value = coerce(&descriptor, field, value.into())?;

        self.drop_nested(&descriptor, field);
        self.fields.set(field, value);
        Ok(self)
    }

    /// Set an enum field by symbol.
    ///
    /// Unrecognized numbers can still be stored with `set(key, Value::Enum(n))`.
    pub fn set_enum(&mut self, key: impl FieldKey, symbol: &str) -> Result<&mut Self, FieldError> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = resolve(&descriptor, key)?;
        let FieldKind::Enum(enumeration) = field.kind() else {
            return Err(kind_mismatch(&descriptor, field, "enum"));
        };
        let number =
            enumeration
                .name_to_number(symbol)
                .ok_or_else(|| FieldError::UnknownEnumSymbol {
                    enumeration: enumeration.name().to_string(),
                    symbol: symbol.to_string(),
                })?;

        if field.is_repeated() {
            self.add(field, Value::Enum(number))
        } else {
            self.set(field, Value::Enum(number))
        }
    }

    /// Append to a repeated field.
    pub fn add(
        &mut self,
        key: impl FieldKey,
        value: impl Into<Value>,
    ) -> Result<&mut Self, FieldError> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = resolve(&descriptor, key)?;
        let value = coerce(&descriptor, field, value.into())?;

        self.fields
            .values_mut(field)
            .ok_or_else(|| not_repeated_error(&descriptor, field))?
            .push(value);
        Ok(self)
    }

    /// Append every element of `values` to a repeated field, in order.
    ///
    /// Nothing is appended if any element does not fit the field.
    pub fn add_all<I, V>(&mut self, key: impl FieldKey, values: I) -> Result<&mut Self, FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let descriptor = Arc::clone(&self.descriptor);
        let field = resolve(&descriptor, key)?;
        if !field.is_repeated() {
            return Err(not_repeated_error(&descriptor, field));
        }
        let values = values
            .into_iter()
            .map(|value| coerce(&descriptor, field, value.into()))
            .collect::<Result<Vec<_>, _>>()?;

        self.fields
            .values_mut(field)
            .ok_or_else(|| not_repeated_error(&descriptor, field))?
            .extend(values);
        Ok(self)
    }

    /// Reset one field to absent, or empty for repeated fields.
    pub fn clear_field(&mut self, key: impl FieldKey) -> Result<&mut Self, FieldError> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = resolve(&descriptor, key)?;
        if self.fields.has(field) {
            self.drop_nested(&descriptor, field);
        }
        self.fields.clear(field);
        Ok(self)
    }

    /// Reset every field, unknown records included.
    pub fn clear(&mut self) -> &mut Self {
        self.fields = FieldSet::new(&self.descriptor);
        self.nested.clear();
        self
    }

    /// Drop the preserved unknown records.
    pub fn clear_unknown_fields(&mut self) -> &mut Self {
        self.fields.unknown_mut().clear();
        self
    }

    /// A builder for a singular message field, edited in place.
    ///
    /// The field becomes present (and the active member of its oneof) if it
    /// was not already. Edits are picked up by [`MessageBuilder::build`].
    pub fn message_mut(&mut self, key: impl FieldKey) -> Result<&mut MessageBuilder, FieldError> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = resolve(&descriptor, key)?;
        if field.is_repeated() {
            return Err(repeated_error(&descriptor, field));
        }
        let FieldKind::Message(nested_type) = field.kind() else {
            return Err(kind_mismatch(&descriptor, field, "message"));
        };

        if !self.nested.contains_key(&field.index()) {
            let current = match self.fields.value(field) {
                Some(Value::Message(message)) => message.clone(),
                _ => Message::new(nested_type),
            };
            // Mark the field present, displacing other oneof members and
            // their pending edits.
            self.drop_nested(&descriptor, field);
            self.nested.insert(field.index(), current.to_builder());
            self.fields.set(field, Value::Message(current));
        }
        Ok(self
            .nested
            .entry(field.index())
            .or_insert_with(|| MessageBuilder::new(nested_type)))
    }

    /// Snapshot the current state as an immutable [`Message`].
    pub fn build(&self) -> Message {
        let mut fields = self.fields.clone();
        for (idx, nested) in &self.nested {
            fields.set(&self.descriptor.fields()[*idx], Value::Message(nested.build()));
        }
        Message::from_parts(Arc::clone(&self.descriptor), fields)
    }

    /// Value of a singular field, its zero value when absent.
    pub fn get(&self, key: impl FieldKey) -> Result<Value, FieldError> {
        let (field, value) = self.singular(key)?;
        if let Some(nested) = self.nested.get(&field.index()) {
            return Ok(Value::Message(nested.build()));
        }
        Ok(value.cloned().unwrap_or_else(|| field.default_value()))
    }

    /// Current value of a message field, an empty message when absent.
    pub fn get_message(&self, key: impl FieldKey) -> Result<Message, FieldError> {
        let (field, value) = self.singular(key)?;
        if let Some(nested) = self.nested.get(&field.index()) {
            return Ok(nested.build());
        }
        match (field.kind(), value) {
            (_, Some(Value::Message(message))) => Ok(message.clone()),
            (FieldKind::Message(descriptor), None) => Ok(Message::new(descriptor)),
            _ => Err(self.mismatch(field, "message")),
        }
    }

    /// Forget pending nested edits that `field` is about to replace.
    fn drop_nested(&mut self, descriptor: &MessageDescriptor, field: &FieldDescriptor) {
        match field.oneof_index() {
            Some(group) => {
                for member in descriptor.oneof_members(group) {
                    self.nested.remove(&member.index());
                }
            }
            None => {
                self.nested.remove(&field.index());
            }
        }
    }
}

impl_field_reads!(MessageBuilder);

impl From<&Message> for MessageBuilder {
    fn from(message: &Message) -> Self {
        message.to_builder()
    }
}

fn coerce(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
    value: Value,
) -> Result<Value, FieldError> {
    let actual = value.type_name();
    field
        .kind()
        .coerce(value)
        .ok_or_else(|| kind_mismatch(descriptor, field, actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumDescriptor;

    fn user() -> Arc<MessageDescriptor> {
        let gender = EnumDescriptor::builder("Gender")
            .value("GENDER_UNSPECIFIED", 0)
            .value("MALE", 1)
            .value("FEMALE", 2)
            .build()
            .unwrap();
        let contact = MessageDescriptor::builder("ContactInfo")
            .field(1, "address", FieldKind::String)
            .field(2, "zip", FieldKind::String)
            .build()
            .unwrap();
        let phone = MessageDescriptor::builder("PhoneNumber")
            .field(1, "country", FieldKind::String)
            .field(2, "number", FieldKind::String)
            .build()
            .unwrap();
        MessageDescriptor::builder("User")
            .field(1, "id", FieldKind::Int64)
            .field(2, "name", FieldKind::String)
            .optional(3, "nickname", FieldKind::String)
            .repeated(4, "tags", FieldKind::String)
            .field(5, "gender", FieldKind::Enum(gender))
            .field(6, "contact", FieldKind::Message(contact))
            .oneof("login_method", |oneof| {
                oneof
                    .field(7, "email_login", FieldKind::String)
                    .field(8, "phone_login", FieldKind::Message(phone));
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_and_read_back() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        builder
            .set("id", 42)
            .unwrap()
            .set("name", "Test")
            .unwrap()
            .set_enum("gender", "FEMALE")
            .unwrap();

        assert_eq!(builder.get_i64("id").unwrap(), 42);
        assert_eq!(builder.get_str(2).unwrap(), "Test");
        assert_eq!(builder.get_enum("gender").unwrap().name(), Some("FEMALE"));

        let message = builder.build();
        assert_eq!(message.get_i64(1).unwrap(), 42);
        assert_eq!(message.get_enum_number("gender").unwrap(), 2);
    }

    #[test]
    fn test_build_is_a_snapshot() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        builder.set("name", "before").unwrap();
        builder.add("tags", "a").unwrap();
        let first = builder.build();

        builder.set("name", "after").unwrap();
        builder.add("tags", "b").unwrap();
        builder.message_mut("contact").unwrap().set("zip", "12345").unwrap();
        let second = builder.build();

        assert_eq!(first.get_str("name").unwrap(), "before");
        assert_eq!(first.get_repeated("tags").unwrap().len(), 1);
        assert!(!first.has("contact").unwrap());
        assert_eq!(second.get_str("name").unwrap(), "after");
        assert_eq!(second.get_message("contact").unwrap().get_str("zip").unwrap(), "12345");
    }

    #[test]
    fn test_oneof_last_set_wins() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        assert!(builder.active_oneof("login_method").unwrap().is_none());

        builder.set("email_login", "a@b.c").unwrap();
        assert_eq!(
            builder.active_oneof("login_method").unwrap().map(|f| f.name()),
            Some("email_login")
        );

        builder
            .message_mut("phone_login")
            .unwrap()
            .set("number", "555")
            .unwrap();
        assert_eq!(
            builder.active_oneof("login_method").unwrap().map(|f| f.name()),
            Some("phone_login")
        );
        assert!(!builder.has("email_login").unwrap());
        assert_eq!(builder.get_str("email_login").unwrap(), "");

        // Switching back discards the pending phone edits.
        builder.set("email_login", "x@y.z").unwrap();
        let message = builder.build();
        assert!(!message.has("phone_login").unwrap());
        assert_eq!(message.get_str("email_login").unwrap(), "x@y.z");
    }

    #[test]
    fn test_oneof_switch_between_message_members() {
        let card = MessageDescriptor::builder("Card")
            .field(1, "pan", FieldKind::String)
            .build()
            .unwrap();
        let wallet = MessageDescriptor::builder("Wallet")
            .field(1, "provider", FieldKind::String)
            .build()
            .unwrap();
        let payment = MessageDescriptor::builder("Payment")
            .oneof("method", |oneof| {
                oneof
                    .field(1, "card", FieldKind::Message(card))
                    .field(2, "wallet", FieldKind::Message(wallet));
            })
            .build()
            .unwrap();

        let mut builder = MessageBuilder::new(&payment);
        builder
            .message_mut("wallet")
            .unwrap()
            .set("provider", "first")
            .unwrap();
        builder.message_mut("card").unwrap().set("pan", "second").unwrap();

        assert_eq!(builder.active_oneof("method").unwrap().map(|f| f.name()), Some("card"));
        assert!(!builder.has("wallet").unwrap());
        assert_eq!(builder.get_message("wallet").unwrap().get_str("provider").unwrap(), "");

        let message = builder.build();
        assert_eq!(message.active_oneof("method").unwrap().map(|f| f.name()), Some("card"));
        assert_eq!(message.get_message("card").unwrap().get_str("pan").unwrap(), "second");

        // Coming back to a displaced member starts from an empty message.
        builder
            .message_mut("wallet")
            .unwrap()
            .set("provider", "third")
            .unwrap();
        let message = builder.build();
        assert!(!message.has("card").unwrap());
        let wallet = message.get_message("wallet").unwrap();
        assert_eq!(wallet.get_str("provider").unwrap(), "third");
        let decoded = Message::decode(&payment, message.encode_to_bytes()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_oneof_member_keeps_zero_value() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        builder.set("email_login", "").unwrap();
        assert!(builder.has("email_login").unwrap());
    }

    #[test]
    fn test_presence() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);

        builder.set("name", "").unwrap();
        assert!(!builder.has("name").unwrap());

        builder.set("nickname", "").unwrap();
        assert!(builder.has("nickname").unwrap());
        assert_eq!(builder.get_str("nickname").unwrap(), "");

        builder.clear_field("nickname").unwrap();
        assert!(!builder.has("nickname").unwrap());
    }

    #[test]
    fn test_add_all_is_atomic() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        builder.add("tags", "first").unwrap();

        let err = builder
            .add_all("tags", vec![Value::from("ok"), Value::I64(3)])
            .unwrap_err();
        assert!(matches!(err, FieldError::KindMismatch { .. }));
        assert_eq!(builder.get_repeated("tags").unwrap().len(), 1);

        builder.add_all("tags", ["a", "b", "a"]).unwrap();
        let tags: Vec<_> = builder
            .get_repeated("tags")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(tags, vec!["first", "a", "b", "a"]);
    }

    #[test]
    fn test_misuse() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);

        assert!(matches!(
            builder.set("tags", "x"),
            Err(FieldError::Repeated { .. })
        ));
        assert!(matches!(
            builder.add("name", "x"),
            Err(FieldError::NotRepeated { .. })
        ));
        assert!(matches!(
            builder.set("id", "x"),
            Err(FieldError::KindMismatch { .. })
        ));
        assert!(matches!(
            builder.set_enum("gender", "UNKNOWN_SYMBOL"),
            Err(FieldError::UnknownEnumSymbol { .. })
        ));
        assert!(matches!(
            builder.message_mut("name"),
            Err(FieldError::KindMismatch { .. })
        ));
        assert!(matches!(
            builder.set(42, 1),
            Err(FieldError::NoSuchField { .. })
        ));
    }

    #[test]
    fn test_unrecognized_enum_number() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        builder.set("gender", Value::Enum(99)).unwrap();
        let symbol = builder.get_enum("gender").unwrap();
        assert_eq!(symbol, EnumSymbol::Unrecognized(99));
        assert_eq!(builder.get_enum_number("gender").unwrap(), 99);
    }

    #[test]
    fn test_clear_and_to_builder() {
        let user = user();
        let mut builder = MessageBuilder::new(&user);
        builder.set("id", 7).unwrap();
        builder.message_mut("contact").unwrap().set("address", "Main St").unwrap();
        let message = builder.build();

        builder.clear();
        assert!(builder.build().is_empty());

        let mut copy = message.to_builder();
        copy.message_mut("contact").unwrap().set("zip", "999").unwrap();
        let edited = copy.build();
        assert_eq!(edited.get_message("contact").unwrap().get_str("address").unwrap(), "Main St");
        assert_eq!(edited.get_message("contact").unwrap().get_str("zip").unwrap(), "999");
        assert_eq!(message.get_message("contact").unwrap().get_str("zip").unwrap(), "");
    }
}
