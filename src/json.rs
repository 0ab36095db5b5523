//! JSON projection of messages.
//!
//! Field names are rendered in lowerCamelCase unless
//! [`JsonOptions::preserve_field_names`] is set, parsing accepts both
//! spellings. 64-bit integers are rendered as strings, `bytes` as standard
//! base64 and enums by symbol (or number when unrecognized). Unknown fields
//! never render.

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::JsonError;
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};
use crate::value::Value;
use crate::{Message, MessageBuilder};

/// Options for printing and parsing JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonOptions {
    include_defaults: bool,
    ignore_unknown_fields: bool,
    preserve_field_names: bool,
}

impl JsonOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also print absent implicit-presence fields with their zero values and
    /// empty repeated fields as `[]`.
    ///
    /// Absent explicit-presence fields are never printed.
    pub fn include_defaults(&mut self, include: bool) -> &mut Self {
        self.include_defaults = include;
        self
    }

    /// Skip object keys that name no field instead of failing.
    pub fn ignore_unknown_fields(&mut self, ignore: bool) -> &mut Self {
        self.ignore_unknown_fields = ignore;
        self
    }

    /// Print declared field names (`email_login`) instead of JSON names
    /// (`emailLogin`).
    pub fn preserve_field_names(&mut self, preserve: bool) -> &mut Self {
        self.preserve_field_names = preserve;
        self
    }
}

impl Message {
    /// Render this message as a JSON object.
    pub fn to_json(&self, options: &JsonOptions) -> JsonValue {
        let fields = self.field_set();
        let mut object = Map::new();

        for field in self.descriptor().fields_in_number_order() {
            let name = if options.preserve_field_names {
                field.name()
            } else {
                field.json_name()
            };

            if field.is_repeated() {
                let values = fields.values(field);
                if !values.is_empty() || options.include_defaults {
                    let array = values
                        .iter()
                        .map(|value| value_to_json(field.kind(), value, options))
                        .collect();
                    object.insert(name.to_string(), JsonValue::Array(array));
                }
            } else if let Some(value) = fields.value(field) {
                object.insert(name.to_string(), value_to_json(field.kind(), value, options));
            } else if options.include_defaults && !field.has_explicit_presence() {
                let default = field.default_value();
                object.insert(name.to_string(), value_to_json(field.kind(), &default, options));
            }
        }

        JsonValue::Object(object)
    }

    /// Render this message as a compact JSON string.
    pub fn to_json_string(&self, options: &JsonOptions) -> String {
        self.to_json(options).to_string()
    }

    /// Parse a message of type `descriptor` from JSON text.
    pub fn from_json(
        descriptor: &Arc<MessageDescriptor>,
        json: &str,
        options: &JsonOptions,
    ) -> Result<Message, JsonError> {
        let mut builder = MessageBuilder::new(descriptor);
        builder.merge_json(json, options)?;
        Ok(builder.build())
    }
}

impl MessageBuilder {
    /// Merge JSON text into this builder.
    ///
    /// Singular fields present in the JSON overwrite, repeated fields append
    /// and nested messages merge recursively. `null` leaves a field as is.
    /// On error the builder is left unchanged.
    pub fn merge_json(
        &mut self,
        json: &str,
        options: &JsonOptions,
    ) -> Result<&mut Self, JsonError> {
        let value: JsonValue = serde_json::from_str(json)?;
        self.merge_json_value(&value, options)
    }

    /// Merge an already parsed JSON value into this builder.
    ///
    /// On error the builder is left unchanged.
    pub fn merge_json_value(
        &mut self,
        json: &JsonValue,
        options: &JsonOptions,
    ) -> Result<&mut Self, JsonError> {
        let mut scratch = self.clone();
        scratch.merge_object(json, options)?;
        *self = scratch;
        Ok(self)
    }

    fn merge_object(&mut self, json: &JsonValue, options: &JsonOptions) -> Result<(), JsonError> {
        let descriptor = Arc::clone(self.descriptor());
        let object = json.as_object().ok_or_else(|| JsonError::ExpectedObject {
            message: descriptor.name().to_string(),
        })?;

        for (key, value) in object {
            let Some(field) = descriptor.field_by_name(key) else {
                if options.ignore_unknown_fields {
                    continue;
                }
                return Err(JsonError::UnknownField {
                    message: descriptor.name().to_string(),
                    field: key.clone(),
                });
            };
            if value.is_null() {
                continue;
            }

            if field.is_repeated() {
                let elements = value.as_array().ok_or_else(|| invalid(field, "expected an array"))?;
                let parsed = elements
                    .iter()
                    .map(|element| json_to_value(field, element, options))
                    .collect::<Result<Vec<_>, _>>()?;
                self.add_all(field, parsed)?;
            } else if let FieldKind::Message(_) = field.kind() {
                self.message_mut(field)?.merge_object(value, options)?;
            } else {
                self.set(field, json_to_value(field, value, options)?)?;
            }
        }
        Ok(())
    }
}

fn value_to_json(kind: &FieldKind, value: &Value, options: &JsonOptions) -> JsonValue {
    match (kind, value) {
        (FieldKind::Enum(enumeration), Value::Enum(number)) => {
            match enumeration.number_to_name(*number) {
                Some(symbol) => JsonValue::String(symbol.to_string()),
                None => JsonValue::from(*number),
            }
        }
        (_, Value::Bool(v)) => JsonValue::Bool(*v),
        (_, Value::I32(v) | Value::Enum(v)) => JsonValue::from(*v),
        (_, Value::U32(v)) => JsonValue::from(*v),
        (_, Value::I64(v)) => JsonValue::String(v.to_string()),
        (_, Value::U64(v)) => JsonValue::String(v.to_string()),
        (_, Value::F32(v)) => float_to_json(f64::from(*v)),
        (_, Value::F64(v)) => float_to_json(*v),
        (_, Value::String(v)) => JsonValue::String(v.to_string()),
        (_, Value::Bytes(v)) => JsonValue::String(STANDARD.encode(v)),
        (_, Value::Message(v)) => v.to_json(options),
    }
}

fn float_to_json(v: f64) -> JsonValue {
    match Number::from_f64(v) {
        Some(number) => JsonValue::Number(number),
        None if v.is_nan() => JsonValue::String("NaN".to_string()),
        None if v > 0.0 => JsonValue::String("Infinity".to_string()),
        None => JsonValue::String("-Infinity".to_string()),
    }
}

fn invalid(field: &FieldDescriptor, reason: impl Into<String>) -> JsonError {
    JsonError::InvalidValue {
        field: field.name().to_string(),
        reason: reason.into(),
    }
}

/// Parse a single (non-repeated) JSON value for `field`.
fn json_to_value(
    field: &FieldDescriptor,
    json: &JsonValue,
    options: &JsonOptions,
) -> Result<Value, JsonError> {
    let value = match field.kind() {
        FieldKind::Bool => Value::Bool(
            json.as_bool()
                .ok_or_else(|| invalid(field, "expected a boolean"))?,
        ),
        FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => {
            let v = json_integer(field, json)?;
            Value::I32(i32::try_from(v).map_err(|_| invalid(field, "out of range for int32"))?)
        }
        FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => {
            let v = json_integer(field, json)?;
            Value::I64(i64::try_from(v).map_err(|_| invalid(field, "out of range for int64"))?)
        }
        FieldKind::Uint32 | FieldKind::Fixed32 => {
            let v = json_integer(field, json)?;
            Value::U32(u32::try_from(v).map_err(|_| invalid(field, "out of range for uint32"))?)
        }
        FieldKind::Uint64 | FieldKind::Fixed64 => {
            let v = json_integer(field, json)?;
            Value::U64(u64::try_from(v).map_err(|_| invalid(field, "out of range for uint64"))?)
        }
        FieldKind::Float => Value::F32(json_float(field, json)? as f32),
        FieldKind::Double => Value::F64(json_float(field, json)?),
        FieldKind::String => Value::from(
            json.as_str()
                .ok_or_else(|| invalid(field, "expected a string"))?,
        ),
        FieldKind::Bytes => {
            let encoded = json
                .as_str()
                .ok_or_else(|| invalid(field, "expected a base64 string"))?;
            let data = STANDARD
                .decode(encoded)
                .or_else(|_| URL_SAFE.decode(encoded))
                .map_err(|err| invalid(field, err.to_string()))?;
            Value::from(data)
        }
        FieldKind::Enum(enumeration) => match json {
            JsonValue::String(symbol) => {
                Value::Enum(enumeration.name_to_number(symbol).ok_or_else(|| {
                    invalid(
                        field,
                        format!("'{symbol}' is not a value of {}", enumeration.name()),
                    )
                })?)
            }
            _ => {
                let v = json_integer(field, json)?;
                Value::Enum(i32::try_from(v).map_err(|_| invalid(field, "out of range for enum"))?)
            }
        },
        FieldKind::Message(nested) => {
            let mut builder = MessageBuilder::new(nested);
            builder.merge_json_value(json, options)?;
            Value::Message(builder.build())
        }
    };
    Ok(value)
}

/// Integers may be JSON numbers or decimal strings.
fn json_integer(field: &FieldDescriptor, json: &JsonValue) -> Result<i128, JsonError> {
    match json {
        JsonValue::Number(number) => {
            if let Some(v) = number.as_i64() {
                Ok(i128::from(v))
            } else if let Some(v) = number.as_u64() {
                Ok(i128::from(v))
            } else {
                match number.as_f64() {
                    Some(v) if v.fract() == 0.0 && v.abs() < 2f64.powi(64) => Ok(v as i128),
                    _ => Err(invalid(field, format!("{number} is not an integer"))),
                }
            }
        }
        JsonValue::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| invalid(field, format!("'{s}' is not an integer"))),
        _ => Err(invalid(field, "expected an integer")),
    }
}

fn json_float(field: &FieldDescriptor, json: &JsonValue) -> Result<f64, JsonError> {
    match json {
        JsonValue::Number(number) => number
            .as_f64()
            .ok_or_else(|| invalid(field, "expected a number")),
        JsonValue::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse::<f64>()
                .map_err(|_| invalid(field, format!("'{other}' is not a number"))),
        },
        _ => Err(invalid(field, "expected a number")),
    }
}
