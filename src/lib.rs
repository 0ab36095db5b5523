//! A schema-driven codec for the protobuf wire format that tolerates schema
//! drift between producer and consumer.
//!
//! Message types are described at runtime with [`schema::MessageDescriptor`]s.
//! Messages are immutable values built through a [`MessageBuilder`] or decoded
//! from bytes. Records for fields a schema does not know are kept verbatim and
//! re-emitted when encoding, and enum numbers without a symbol survive as raw
//! numbers, so data passes losslessly through older and newer schemas alike.
//!
//! ```
//! use protodrift::schema::{FieldKind, MessageDescriptor};
//! use protodrift::Message;
//!
//! let user = MessageDescriptor::builder("User")
//!     .field(1, "id", FieldKind::Int64)
//!     .field(2, "name", FieldKind::String)
//!     .repeated(3, "tags", FieldKind::String)
//!     .build()
//!     .unwrap();
//!
//! let mut builder = Message::builder(&user);
//! builder.set("id", 42)?.set("name", "Test")?.add("tags", "vip")?;
//! let message = builder.build();
//!
//! let bytes = message.encode_to_vec();
//! let decoded = Message::decode(&user, &bytes[..])?;
//! assert_eq!(decoded, message);
//! # Ok::<(), protodrift::error::Error>(())
//! ```

pub mod codec;
pub mod error;
pub mod json;
pub mod leb128;
pub mod schema;
pub mod wire;

mod builder;
mod message;
mod text;
mod unknown;
mod value;

pub use builder::MessageBuilder;
pub use message::{FieldKey, Message};
pub use unknown::{UnknownField, UnknownFields};
pub use value::{ProtoString, Value};
