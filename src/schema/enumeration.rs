//! Open enum descriptors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;

/// A single named value of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    name: String,
    number: i32,
}

impl EnumValueDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i32 {
        self.number
    }
}

/// Bidirectional mapping between enum symbols and their numbers.
///
/// Enums are open: every `i32` is a valid value of the enum. Numbers without a
/// symbol surface as [`EnumSymbol::Unrecognized`] while keeping the raw
/// number, which is also what gets re-encoded.
#[derive(Debug)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<EnumValueDescriptor>,
    by_number: HashMap<i32, usize>,
    by_name: HashMap<String, usize>,
}

impl EnumDescriptor {
    /// Start describing an enum named `name`.
    pub fn builder(name: impl Into<String>) -> EnumDescriptorBuilder {
        EnumDescriptorBuilder {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Name of this enum type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in declaration order.
    pub fn values(&self) -> &[EnumValueDescriptor] {
        &self.values
    }

    /// The symbol for `number`, the first declared one if aliased.
    pub fn number_to_name(&self, number: i32) -> Option<&str> {
        self.by_number
            .get(&number)
            .map(|idx| self.values[*idx].name.as_str())
    }

    /// The number for the symbol `name`.
    pub fn name_to_number(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).map(|idx| self.values[*idx].number)
    }

    /// Whether `number` has a declared symbol.
    pub fn is_known(&self, number: i32) -> bool {
        self.by_number.contains_key(&number)
    }

    /// The number an absent enum field reads as, always the first value.
    pub fn default_number(&self) -> i32 {
        self.values.first().map_or(0, |value| value.number)
    }

    /// Classify a raw number against this enum.
    pub fn symbol(&self, number: i32) -> EnumSymbol<'_> {
        match self.number_to_name(number) {
            Some(name) => EnumSymbol::Known { name, number },
            None => EnumSymbol::Unrecognized(number),
        }
    }
}

/// Symbolic view of a raw enum number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSymbol<'a> {
    /// The number has a declared symbol.
    Known { name: &'a str, number: i32 },
    /// The number is not declared by this version of the enum.
    Unrecognized(i32),
}

impl<'a> EnumSymbol<'a> {
    /// The raw number, available whether or not it is recognized.
    pub fn number(&self) -> i32 {
        match self {
            EnumSymbol::Known { number, .. } => *number,
            EnumSymbol::Unrecognized(number) => *number,
        }
    }

    /// The declared symbol, if any.
    pub fn name(&self) -> Option<&'a str> {
        match self {
            EnumSymbol::Known { name, .. } => Some(name),
            EnumSymbol::Unrecognized(_) => None,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, EnumSymbol::Unrecognized(_))
    }
}

/// Builder for an [`EnumDescriptor`].
#[derive(Debug, Clone)]
pub struct EnumDescriptorBuilder {
    name: String,
    values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptorBuilder {
    /// Declare a value. Several names may share a number (aliases).
    pub fn value(&mut self, name: impl Into<String>, number: i32) -> &mut Self {
        self.values.push(EnumValueDescriptor {
            name: name.into(),
            number,
        });
        self
    }

    /// Validate and freeze the descriptor.
    ///
    /// Open enums must declare at least one value and the first one must be
    /// zero, it is the value absent fields read as.
    pub fn build(&self) -> Result<Arc<EnumDescriptor>, SchemaError> {
        let first = self.values.first().ok_or_else(|| SchemaError::EmptyEnum {
            name: self.name.clone(),
        })?;
        if first.number != 0 {
            return Err(SchemaError::EnumMissingZero {
                name: self.name.clone(),
                number: first.number,
            });
        }

        let mut by_number = HashMap::with_capacity(self.values.len());
        let mut by_name = HashMap::with_capacity(self.values.len());
        for (idx, value) in self.values.iter().enumerate() {
            if by_name.insert(value.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateEnumValue {
                    name: self.name.clone(),
                    value: value.name.clone(),
                });
            }
            by_number.entry(value.number).or_insert(idx);
        }

        tracing::debug!(
            enumeration = %self.name,
            values = self.values.len(),
            "built enum descriptor"
        );

        Ok(Arc::new(EnumDescriptor {
            name: self.name.clone(),
            values: self.values.clone(),
            by_number,
            by_name,
        }))
    }
}
