//! Property tests for the codec.

mod common;

use proptest::prelude::*;
use proptest::property_test;
use protodrift::error::DecodeError;
use protodrift::{Message, MessageBuilder, Value};

fn build_user(
    id: i64,
    name: &str,
    nickname: &Option<String>,
    tags: &[String],
    gender: Option<i32>,
) -> MessageBuilder {
    let user = common::user();
    let mut builder = Message::builder(&user);
    builder.set("id", id).unwrap().set("name", name).unwrap();
    if let Some(nickname) = nickname {
        builder.set("nickname", nickname.as_str()).unwrap();
    }
    builder.add_all("tags", tags.iter().map(String::as_str)).unwrap();
    if let Some(gender) = gender {
        builder.set("gender", Value::Enum(gender)).unwrap();
    }
    builder
}

#[property_test]
fn proptest_round_trip(
    id: i64,
    name: String,
    nickname: Option<String>,
    tags: Vec<String>,
    gender: Option<i32>,
    email: Option<String>,
) {
    let mut builder = build_user(id, &name, &nickname, &tags, gender);
    if let Some(email) = &email {
        builder.set("email_login", email.as_str()).unwrap();
    }
    builder.message_mut("contact").unwrap().set("zip", name.as_str()).unwrap();
    let message = builder.build();

    let bytes = message.encode_to_vec();
    prop_assert_eq!(bytes.len(), message.encoded_len());

    let decoded = Message::decode(message.descriptor(), &bytes[..]).unwrap();
    prop_assert_eq!(&decoded, &message);
    prop_assert_eq!(decoded.has("nickname").unwrap(), nickname.is_some());
    prop_assert_eq!(decoded.encode_to_vec(), bytes);
}

#[property_test]
fn proptest_repeated_order(head: Vec<String>, bulk: Vec<String>, tail: String) {
    let user = common::user();
    let mut builder = Message::builder(&user);
    for tag in &head {
        builder.add("tags", tag.as_str()).unwrap();
    }
    builder.add_all("tags", bulk.iter().map(String::as_str)).unwrap();
    builder.add("tags", tail.as_str()).unwrap();
    let message = builder.build();

    let decoded = Message::decode(&user, message.encode_to_bytes()).unwrap();
    let tags: Vec<&str> = decoded
        .get_repeated("tags")
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    let expected: Vec<&str> = head
        .iter()
        .chain(&bulk)
        .map(String::as_str)
        .chain(std::iter::once(tail.as_str()))
        .collect();
    prop_assert_eq!(tags, expected);
}

#[property_test]
fn proptest_oneof_exclusive(sets: Vec<(bool, String)>) {
    let user = common::user();
    let mut builder = Message::builder(&user);
    for (email, text) in &sets {
        let expected = if *email {
            builder.set("email_login", text.as_str()).unwrap();
            "email_login"
        } else {
            builder
                .message_mut("phone_login")
                .unwrap()
                .set("number", text.as_str())
                .unwrap();
            "phone_login"
        };

        let present = ["email_login", "phone_login"]
            .into_iter()
            .filter(|name| builder.has(*name).unwrap())
            .count();
        prop_assert_eq!(present, 1);
        prop_assert_eq!(
            builder.active_oneof("login_method").unwrap().map(|f| f.name()),
            Some(expected)
        );
    }

    let message = builder.build();
    let decoded = Message::decode(&user, message.encode_to_bytes()).unwrap();
    prop_assert_eq!(
        decoded.active_oneof("login_method").unwrap().map(|f| f.name()),
        message.active_oneof("login_method").unwrap().map(|f| f.name())
    );
}

#[property_test]
fn proptest_oneof_exclusive_message_members(sets: Vec<(u8, String)>) {
    let recipient = common::recipient();
    let mut builder = Message::builder(&recipient);
    let mut last = None;
    for (choice, text) in &sets {
        let member = match choice % 3 {
            0 => {
                builder.set("email", text.as_str()).unwrap();
                "email"
            }
            1 => {
                builder.message_mut("phone").unwrap().set("number", text.as_str()).unwrap();
                "phone"
            }
            _ => {
                builder.message_mut("post").unwrap().set("zip", text.as_str()).unwrap();
                "post"
            }
        };
        last = Some((member, text.as_str()));
    }

    let message = builder.build();
    prop_assert_eq!(
        message.active_oneof("reach").unwrap().map(|f| f.name()),
        last.map(|(member, _)| member)
    );
    let present = ["email", "phone", "post"]
        .into_iter()
        .filter(|name| message.has(*name).unwrap())
        .count();
    prop_assert_eq!(present, usize::from(last.is_some()));

    let phone = message.get_message("phone").unwrap();
    let post = message.get_message("post").unwrap();
    match last {
        Some(("email", text)) => prop_assert_eq!(message.get_str("email").unwrap(), text),
        Some(("phone", text)) => prop_assert_eq!(phone.get_str("number").unwrap(), text),
        Some((_, text)) => prop_assert_eq!(post.get_str("zip").unwrap(), text),
        None => {}
    }

    let decoded = Message::decode(&recipient, message.encode_to_bytes()).unwrap();
    prop_assert_eq!(decoded, message);
}

#[property_test]
fn proptest_truncated_input_fails(
    id: i64,
    name: String,
    nickname: Option<String>,
    tags: Vec<String>,
    gender: Option<i32>,
) {
    let builder = build_user(id, &name, &nickname, &tags, gender);
    let bytes = builder.build().encode_to_vec();
    prop_assume!(!bytes.is_empty());

    let truncated = &bytes[..bytes.len() - 1];
    prop_assert_eq!(
        Message::decode(builder.descriptor(), truncated).unwrap_err(),
        DecodeError::TruncatedInput
    );
}
