use crate::schema::{Cardinality, FieldKind};
use crate::value::Value;
use crate::wire::{Key, WireType};

/// Where a field's value lives inside a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Storage {
    /// An independent slot, indexed into the message's slot list.
    Slot(usize),
    /// A member of the oneof group with this index.
    Oneof(usize),
}

/// Description of a single field of a message type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(super) number: u32,
    pub(super) name: String,
    pub(super) json_name: String,
    pub(super) kind: FieldKind,
    pub(super) cardinality: Cardinality,
    pub(super) index: usize,
    pub(super) storage: Storage,
    pub(super) key: Key,
}

impl FieldDescriptor {
    /// The field number, unique within the message type.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The declared field name, e.g. `email_login`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lowerCamelCase name used by the JSON projection, e.g. `emailLogin`.
    pub fn json_name(&self) -> &str {
        &self.json_name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Position of this field in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the oneof group this field belongs to, if any.
    pub fn oneof_index(&self) -> Option<usize> {
        match self.storage {
            Storage::Oneof(group) => Some(group),
            Storage::Slot(_) => None,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality.is_repeated()
    }

    /// Whether absence is distinguishable from holding the zero value.
    ///
    /// True for `optional` fields, embedded messages and oneof members.
    pub fn has_explicit_presence(&self) -> bool {
        match self.cardinality {
            Cardinality::Optional => true,
            Cardinality::Repeated => false,
            Cardinality::Singular => {
                matches!(self.kind, FieldKind::Message(_)) || self.oneof_index().is_some()
            }
        }
    }

    /// The [`WireType`] a single value of this field is encoded with.
    pub fn wire_type(&self) -> WireType {
        self.kind.wire_type()
    }

    /// The value this field reads as when absent.
    pub fn default_value(&self) -> Value {
        self.kind.default_value()
    }

    pub(crate) fn storage(&self) -> Storage {
        self.storage
    }

    /// The key every record of this field is written with.
    pub(crate) fn key(&self) -> Key {
        self.key
    }
}

/// Converts a declared field name to its JSON name.
///
/// Underscores are dropped and the letter following one is upper-cased.
pub(super) fn json_name(name: &str) -> String {
    let mut json = String::with_capacity(name.len());
    let mut capitalize_next = false;
    for c in name.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            json.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            json.push(c);
        }
    }
    json
}

#[cfg(test)]
mod tests {
    use super::json_name;

    #[test]
    fn test_json_name() {
        assert_eq!(json_name("id"), "id");
        assert_eq!(json_name("email_login"), "emailLogin");
        assert_eq!(json_name("phone_login_v2"), "phoneLoginV2");
        assert_eq!(json_name("already_Camel"), "alreadyCamel");
    }
}
