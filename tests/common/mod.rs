//! Schemas shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use protodrift::schema::{EnumDescriptor, FieldKind, MessageDescriptor};

pub fn gender() -> Arc<EnumDescriptor> {
    EnumDescriptor::builder("Gender")
        .value("GENDER_UNSPECIFIED", 0)
        .value("MALE", 1)
        .value("FEMALE", 2)
        .value("OTHER", 3)
        .build()
        .unwrap()
}

pub fn phone_number() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("PhoneNumber")
        .field(1, "country", FieldKind::String)
        .field(2, "number", FieldKind::String)
        .build()
        .unwrap()
}

pub fn contact_info() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("ContactInfo")
        .field(1, "address", FieldKind::String)
        .field(2, "zip", FieldKind::String)
        .build()
        .unwrap()
}

/// The full `User` type: explicit presence, repeated, enum, oneof and
/// nested messages.
pub fn user() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("User")
        .field(1, "id", FieldKind::Int64)
        .field(2, "name", FieldKind::String)
        .optional(3, "nickname", FieldKind::String)
        .repeated(4, "tags", FieldKind::String)
        .optional(5, "gender", FieldKind::Enum(gender()))
        .oneof("login_method", |oneof| {
            oneof
                .field(6, "email_login", FieldKind::String)
                .field(7, "phone_login", FieldKind::Message(phone_number()));
        })
        .field(8, "contact", FieldKind::Message(contact_info()))
        .build()
        .unwrap()
}

/// A oneof with two message members and one string member.
pub fn recipient() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("Recipient")
        .oneof("reach", |oneof| {
            oneof
                .field(1, "email", FieldKind::String)
                .field(2, "phone", FieldKind::Message(phone_number()))
                .field(3, "post", FieldKind::Message(contact_info()));
        })
        .build()
        .unwrap()
}

pub fn gender_v1() -> Arc<EnumDescriptor> {
    EnumDescriptor::builder("GenderV1")
        .value("GENDER_UNSPECIFIED_V1", 0)
        .value("MALE_V1", 1)
        .value("FEMALE_V1", 2)
        .build()
        .unwrap()
}

pub fn gender_v2() -> Arc<EnumDescriptor> {
    EnumDescriptor::builder("GenderV2")
        .value("GENDER_UNSPECIFIED_V2", 0)
        .value("MALE_V2", 1)
        .value("FEMALE_V2", 2)
        .value("OTHER_V2", 3)
        .build()
        .unwrap()
}

pub fn user_v1() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("UserV1")
        .field(1, "id", FieldKind::Int64)
        .field(2, "name", FieldKind::String)
        .field(3, "gender", FieldKind::Enum(gender_v1()))
        .build()
        .unwrap()
}

/// `UserV1` plus a `nickname` and a wider enum.
pub fn user_v2() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("UserV2")
        .field(1, "id", FieldKind::Int64)
        .field(2, "name", FieldKind::String)
        .field(3, "gender", FieldKind::Enum(gender_v2()))
        .field(4, "nickname", FieldKind::String)
        .build()
        .unwrap()
}
