//! Process-wide index of message and enum types.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{EnumDescriptor, FieldKind, MessageDescriptor};
use crate::error::SchemaError;

/// An immutable name to descriptor index.
///
/// Registering a message type also registers every message and enum type
/// its fields refer to. Registries are meant to be built once and kept for
/// the lifetime of the process:
///
/// ```
/// use std::sync::LazyLock;
///
/// use protodrift::schema::{FieldKind, MessageDescriptor, Registry};
///
/// static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
///     let ping = MessageDescriptor::builder("Ping")
///         .field(1, "sequence", FieldKind::Uint64)
///         .build()
///         .unwrap();
///     Registry::builder().message(ping).build().unwrap()
/// });
///
/// assert!(REGISTRY.message("Ping").is_some());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    messages: BTreeMap<String, Arc<MessageDescriptor>>,
    enums: BTreeMap<String, Arc<EnumDescriptor>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a message type by name.
    pub fn message(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(name)
    }

    /// Look up an enum type by name.
    pub fn enumeration(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.enums.get(name)
    }

    /// All registered message types, ordered by name.
    pub fn messages(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> + '_ {
        self.messages.values()
    }

    /// All registered enum types, ordered by name.
    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumDescriptor>> + '_ {
        self.enums.values()
    }
}

/// Builder for a [`Registry`].
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    messages: Vec<Arc<MessageDescriptor>>,
    enums: Vec<Arc<EnumDescriptor>>,
}

impl RegistryBuilder {
    /// Register a message type and everything it refers to.
    pub fn message(&mut self, descriptor: Arc<MessageDescriptor>) -> &mut Self {
        self.messages.push(descriptor);
        self
    }

    /// Register an enum type.
    pub fn enumeration(&mut self, descriptor: Arc<EnumDescriptor>) -> &mut Self {
        self.enums.push(descriptor);
        self
    }

    /// Index all registered types.
    ///
    /// Registering the same descriptor more than once is fine, two distinct
    /// descriptors sharing a name are rejected.
    pub fn build(&self) -> Result<Registry, SchemaError> {
        let mut registry = Registry::default();
        for descriptor in &self.enums {
            insert_enum(&mut registry, descriptor)?;
        }
        for descriptor in &self.messages {
            insert_message(&mut registry, descriptor)?;
        }
        Ok(registry)
    }
}

fn insert_enum(
    registry: &mut Registry,
    descriptor: &Arc<EnumDescriptor>,
) -> Result<(), SchemaError> {
    if let Some(existing) = registry.enums.get(descriptor.name()) {
        return if Arc::ptr_eq(existing, descriptor) {
            Ok(())
        } else {
            Err(SchemaError::DuplicateRegistration {
                name: descriptor.name().to_string(),
            })
        };
    }

    tracing::debug!(enumeration = %descriptor.name(), "registered enum type");
    registry
        .enums
        .insert(descriptor.name().to_string(), Arc::clone(descriptor));
    Ok(())
}

fn insert_message(
    registry: &mut Registry,
    descriptor: &Arc<MessageDescriptor>,
) -> Result<(), SchemaError> {
    if let Some(existing) = registry.messages.get(descriptor.name()) {
        return if Arc::ptr_eq(existing, descriptor) {
            Ok(())
        } else {
            Err(SchemaError::DuplicateRegistration {
                name: descriptor.name().to_string(),
            })
        };
    }

    tracing::debug!(message = %descriptor.name(), "registered message type");
    registry
        .messages
        .insert(descriptor.name().to_string(), Arc::clone(descriptor));

    for field in descriptor.fields() {
        match field.kind() {
            FieldKind::Message(nested) => insert_message(registry, nested)?,
            FieldKind::Enum(nested) => insert_enum(registry, nested)?,
            _ => (),
        }
    }
    Ok(())
}
