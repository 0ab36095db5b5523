//! Walks through building, persisting and printing a `User` message.
//!
//! Run with `RUST_LOG=protodrift=trace` to see the decoder's events.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use protodrift::error::{Error, SchemaError};
use protodrift::json::JsonOptions;
use protodrift::schema::{EnumDescriptor, FieldKind, MessageDescriptor};
use protodrift::Message;

fn user_schema() -> Result<Arc<MessageDescriptor>, SchemaError> {
    let gender = EnumDescriptor::builder("Gender")
        .value("GENDER_UNSPECIFIED", 0)
        .value("MALE", 1)
        .value("FEMALE", 2)
        .value("OTHER", 3)
        .build()?;
    let phone = MessageDescriptor::builder("PhoneNumber")
        .field(1, "country", FieldKind::String)
        .field(2, "number", FieldKind::String)
        .build()?;
    let contact = MessageDescriptor::builder("ContactInfo")
        .field(1, "address", FieldKind::String)
        .field(2, "zip", FieldKind::String)
        .build()?;

    MessageDescriptor::builder("User")
        .field(1, "id", FieldKind::Int64)
        .field(2, "name", FieldKind::String)
        .optional(3, "nickname", FieldKind::String)
        .repeated(4, "tags", FieldKind::String)
        .optional(5, "gender", FieldKind::Enum(gender))
        .oneof("login_method", |oneof| {
            oneof
                .field(6, "email_login", FieldKind::String)
                .field(7, "phone_login", FieldKind::Message(phone));
        })
        .field(8, "contact", FieldKind::Message(contact))
        .build()
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let user = user_schema()?;

    let mut builder = Message::builder(&user);
    builder
        .set("id", 42)?
        .set("name", "Test")?
        .add_all("tags", ["vip", "beta"])?
        .set_enum("gender", "FEMALE")?
        .set("email_login", "test@example.com")?;
    builder
        .message_mut("contact")?
        .set("address", "Main St 1")?
        .set("zip", "12345")?;
    let first = builder.build();

    // The builder stays usable, `first` is unaffected.
    builder
        .message_mut("phone_login")?
        .set("country", "US")?
        .set("number", "+1 555 0100")?;
    let second = builder.build();
    println!("first:\n{first}");
    println!(
        "second login: {:?}",
        second.active_oneof("login_method")?.map(|field| field.name())
    );

    let dir = std::env::temp_dir().join("protodrift-demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("user.bin");
    first.write_to(File::create(&path)?)?;
    let read_back = Message::read_from(&user, BufReader::new(File::open(&path)?))?;
    println!(
        "wrote {} bytes to {}, read back equal: {}",
        first.encoded_len(),
        path.display(),
        read_back == first
    );

    let empty = Message::new(&user);
    println!(
        "defaults: name={:?} nickname present={} gender={:?}",
        empty.get_str("name")?,
        empty.has("nickname")?,
        empty.get_enum("gender")?.name()
    );

    builder.clear();
    println!("after clear: {:?}", builder.build().is_empty());

    let mut options = JsonOptions::new();
    options.include_defaults(true);
    println!("json: {}", first.to_json_string(&options));

    Ok(())
}
