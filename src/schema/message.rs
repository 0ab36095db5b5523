//! Message type descriptors.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use super::field::{json_name, FieldDescriptor, Storage};
use super::{Cardinality, FieldKind};
use crate::error::SchemaError;
use crate::wire::Key;

/// A named group of fields of which at most one is set at a time.
#[derive(Debug, Clone)]
pub struct OneofDescriptor {
    name: String,
    index: usize,
    members: SmallVec<[usize; 4]>,
}

impl OneofDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this group among the message's oneofs.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declaration indices of the member fields.
    pub fn member_indices(&self) -> &[usize] {
        &self.members
    }
}

/// Immutable description of a message type.
///
/// Fields are kept in declaration order and indexed by number and by name
/// (both the declared name and the JSON name).
#[derive(Debug)]
pub struct MessageDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_number: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    number_order: Vec<usize>,
    oneofs: Vec<OneofDescriptor>,
    slot_count: usize,
}

impl MessageDescriptor {
    /// Start describing a message type named `name`.
    pub fn builder(name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
        }
    }

    /// Name of this message type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by its number.
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|idx| &self.fields[*idx])
    }

    /// Look up a field by its declared or JSON name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|idx| &self.fields[*idx])
    }

    /// All fields in ascending field number order, the order they encode in.
    pub fn fields_in_number_order(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.number_order.iter().map(|idx| &self.fields[*idx])
    }

    pub fn oneofs(&self) -> &[OneofDescriptor] {
        &self.oneofs
    }

    pub fn oneof_by_name(&self, name: &str) -> Option<&OneofDescriptor> {
        self.oneofs.iter().find(|oneof| oneof.name == name)
    }

    /// The fields belonging to the oneof group at `group`.
    pub fn oneof_members(&self, group: usize) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.oneofs
            .get(group)
            .map(|oneof| oneof.members.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|idx| &self.fields[*idx])
    }

    /// Number of independent (non-oneof) field slots.
    pub(crate) fn slot_count(&self) -> usize {
        self.slot_count
    }
}

struct PendingField {
    number: u32,
    name: String,
    kind: FieldKind,
    cardinality: Cardinality,
    oneof: Option<usize>,
}

/// Builder for a [`MessageDescriptor`].
///
/// ```
/// use protodrift::schema::{FieldKind, MessageDescriptor};
///
/// let contact = MessageDescriptor::builder("ContactInfo")
///     .field(1, "address", FieldKind::String)
///     .field(2, "zip", FieldKind::String)
///     .build()
///     .unwrap();
///
/// let user = MessageDescriptor::builder("User")
///     .field(1, "id", FieldKind::Int64)
///     .optional(2, "nickname", FieldKind::String)
///     .repeated(3, "tags", FieldKind::String)
///     .oneof("login_method", |oneof| {
///         oneof
///             .field(4, "email_login", FieldKind::String)
///             .field(5, "contact_login", FieldKind::Message(contact));
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(user.field_by_name("emailLogin").unwrap().number(), 4);
/// ```
pub struct MessageDescriptorBuilder {
    name: String,
    fields: Vec<PendingField>,
    oneofs: Vec<String>,
}

impl MessageDescriptorBuilder {
    fn push(&mut self, number: u32, name: String, kind: FieldKind, cardinality: Cardinality) {
        self.fields.push(PendingField {
            number,
            name,
            kind,
            cardinality,
            oneof: None,
        });
    }

    /// Declare a singular field with implicit presence.
    pub fn field(&mut self, number: u32, name: impl Into<String>, kind: FieldKind) -> &mut Self {
        self.push(number, name.into(), kind, Cardinality::Singular);
        self
    }

    /// Declare a singular field with explicit presence.
    pub fn optional(
        &mut self,
        number: u32,
        name: impl Into<String>,
        kind: FieldKind,
    ) -> &mut Self {
        self.push(number, name.into(), kind, Cardinality::Optional);
        self
    }

    /// Declare a repeated field.
    pub fn repeated(
        &mut self,
        number: u32,
        name: impl Into<String>,
        kind: FieldKind,
    ) -> &mut Self {
        self.push(number, name.into(), kind, Cardinality::Repeated);
        self
    }

    /// Declare a oneof group, its members are declared through `members`.
    pub fn oneof(
        &mut self,
        name: impl Into<String>,
        members: impl FnOnce(&mut OneofBuilder),
    ) -> &mut Self {
        let group = self.oneofs.len();
        self.oneofs.push(name.into());

        let mut oneof = OneofBuilder { fields: Vec::new() };
        members(&mut oneof);
        self.fields
            .extend(oneof.fields.into_iter().map(|(number, name, kind)| PendingField {
                number,
                name,
                kind,
                cardinality: Cardinality::Singular,
                oneof: Some(group),
            }));
        self
    }

    /// Validate and freeze the descriptor.
    pub fn build(&self) -> Result<Arc<MessageDescriptor>, SchemaError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut by_number = HashMap::with_capacity(self.fields.len());
        let mut by_name = HashMap::with_capacity(self.fields.len() * 2);
        let mut oneofs: Vec<OneofDescriptor> = Vec::with_capacity(self.oneofs.len());
        let mut slot_count = 0;

        for (index, name) in self.oneofs.iter().enumerate() {
            if oneofs.iter().any(|oneof| &oneof.name == name) {
                return Err(SchemaError::DuplicateOneof {
                    message: self.name.clone(),
                    oneof: name.clone(),
                });
            }
            oneofs.push(OneofDescriptor {
                name: name.clone(),
                index,
                members: SmallVec::new(),
            });
        }

        for (index, pending) in self.fields.iter().enumerate() {
            let key = Key::new(pending.number, pending.kind.wire_type()).map_err(|_| {
                SchemaError::InvalidFieldNumber {
                    message: self.name.clone(),
                    field: pending.name.clone(),
                    number: pending.number,
                }
            })?;
            if by_number.insert(pending.number, index).is_some() {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: self.name.clone(),
                    number: pending.number,
                });
            }

            let json = json_name(&pending.name);
            for alias in [&pending.name, &json] {
                match by_name.insert(alias.clone(), index) {
                    Some(existing) if existing != index => {
                        return Err(SchemaError::DuplicateFieldName {
                            message: self.name.clone(),
                            name: alias.clone(),
                        });
                    }
                    _ => (),
                }
            }

            let storage = match pending.oneof {
                Some(group) => {
                    oneofs[group].members.push(index);
                    Storage::Oneof(group)
                }
                None => {
                    slot_count += 1;
                    Storage::Slot(slot_count - 1)
                }
            };

            fields.push(FieldDescriptor {
                number: pending.number,
                name: pending.name.clone(),
                json_name: json,
                kind: pending.kind.clone(),
                cardinality: pending.cardinality,
                index,
                storage,
                key,
            });
        }

        if let Some(empty) = oneofs.iter().find(|oneof| oneof.members.is_empty()) {
            return Err(SchemaError::EmptyOneof {
                message: self.name.clone(),
                oneof: empty.name.clone(),
            });
        }

        let mut number_order: Vec<usize> = (0..fields.len()).collect();
        number_order.sort_by_key(|idx| fields[*idx].number);

        tracing::debug!(
            message = %self.name,
            fields = fields.len(),
            oneofs = oneofs.len(),
            "built message descriptor"
        );

        Ok(Arc::new(MessageDescriptor {
            name: self.name.clone(),
            fields,
            by_number,
            by_name,
            number_order,
            oneofs,
            slot_count,
        }))
    }
}

/// Collects the members of a oneof group.
pub struct OneofBuilder {
    fields: Vec<(u32, String, FieldKind)>,
}

impl OneofBuilder {
    /// Declare a member of the group. Members are always singular.
    pub fn field(&mut self, number: u32, name: impl Into<String>, kind: FieldKind) -> &mut Self {
        self.fields.push((number, name.into(), kind));
        self
    }
}
