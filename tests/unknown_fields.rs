//! Integration tests for unknown field preservation.

mod common;

use std::sync::Arc;

use protodrift::codec::DecodeOptions;
use protodrift::schema::{FieldKind, MessageDescriptor};
use protodrift::wire::WireType;
use protodrift::Message;

/// Narrow view of `common::user_v2`, knowing only the `id`.
fn id_only() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("IdOnly")
        .field(1, "id", FieldKind::Int64)
        .build()
        .unwrap()
}

#[test]
fn test_unknown_fields_preserved() {
    let v2 = common::user_v2();
    let mut builder = Message::builder(&v2);
    builder
        .set("id", 7)
        .unwrap()
        .set("name", "Alice")
        .unwrap()
        .set("nickname", "Al")
        .unwrap();
    let bytes = builder.build().encode_to_vec();

    let narrow = Message::decode(&id_only(), &bytes[..]).unwrap();
    assert_eq!(narrow.get_i64("id").unwrap(), 7);

    let unknown = narrow.unknown_fields();
    assert_eq!(unknown.len(), 2);
    let name = unknown.get(2).next().unwrap();
    assert_eq!(name.wire_type(), WireType::Len);
    assert_eq!(name.raw_value(), b"\x05Alice");
    assert_eq!(name.record().as_ref(), b"\x12\x05Alice");

    assert_eq!(narrow.encode_to_vec(), bytes);
    assert_eq!(narrow.encoded_len(), bytes.len());
}

#[test]
fn test_duplicates_and_odd_encodings_kept_verbatim() {
    // Field 9 twice (one with a padded varint), field 10 as fixed64,
    // field 11 as fixed32, interleaved with a known field.
    let data = [
        0x48, 0x81, 0x80, 0x00, // 9: 1, padded
        0x08, 0x05, // id: 5
        0x51, 1, 2, 3, 4, 5, 6, 7, 8, // 10: fixed64
        0x48, 0x02, // 9: 2
        0x5d, 9, 9, 9, 9, // 11: fixed32
    ];
    let message = Message::decode(&id_only(), &data[..]).unwrap();

    let numbers: Vec<_> = message.unknown_fields().iter().map(|f| f.number()).collect();
    assert_eq!(numbers, vec![9, 10, 9, 11]);
    assert_eq!(message.unknown_fields().get(9).count(), 2);

    // Known fields first, then unknown records in arrival order.
    let mut expected = vec![0x08, 0x05];
    expected.extend_from_slice(&data[..4]);
    expected.extend_from_slice(&data[6..]);
    assert_eq!(message.encode_to_vec(), expected);
}

#[test]
fn test_unknown_fields_inside_nested_messages() {
    let inner_v2 = common::user_v2();
    let outer = |inner: Arc<MessageDescriptor>| {
        MessageDescriptor::builder("Envelope")
            .field(1, "user", FieldKind::Message(inner))
            .build()
            .unwrap()
    };
    let (outer_v1, outer_v2) = (outer(id_only()), outer(inner_v2));

    let mut builder = Message::builder(&outer_v2);
    builder
        .message_mut("user")
        .unwrap()
        .set("id", 1)
        .unwrap()
        .set("nickname", "deep")
        .unwrap();
    let bytes = builder.build().encode_to_vec();

    let narrow = Message::decode(&outer_v1, &bytes[..]).unwrap();
    let user = narrow.get_message("user").unwrap();
    assert_eq!(user.unknown_fields().len(), 1);
    assert_eq!(narrow.encode_to_vec(), bytes);

    let back = Message::decode(&outer_v2, narrow.encode_to_bytes()).unwrap();
    assert_eq!(
        back.get_message("user").unwrap().get_str("nickname").unwrap(),
        "deep"
    );
}

#[test]
fn test_discarding_unknown_fields() {
    let data = [0x08, 0x05, 0x48, 0x02];

    let mut options = DecodeOptions::new();
    options.discard_unknown_fields(true);
    let message = options.decode(&id_only(), &data[..]).unwrap();
    assert!(message.unknown_fields().is_empty());
    assert_eq!(message.encode_to_vec(), vec![0x08, 0x05]);

    let kept = Message::decode(&id_only(), &data[..]).unwrap();
    let mut builder = kept.to_builder();
    builder.clear_unknown_fields();
    assert_eq!(builder.build(), message);
    assert_eq!(kept.unknown_fields().len(), 1);
}

#[test]
fn test_invalid_unknown_records_fail() {
    // Wire type 3 (start group) is not supported.
    assert!(Message::decode(&id_only(), &[0x4b][..]).is_err());
    // Unknown length-delimited record that runs past the end.
    assert!(Message::decode(&id_only(), &[0x4a, 0x05, 1, 2][..]).is_err());
}
