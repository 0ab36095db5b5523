use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use prost::Message as _;
use protodrift::schema::{FieldKind, MessageDescriptor};
use protodrift::Message;

#[derive(Clone, PartialEq, prost::Message)]
struct Contact {
    #[prost(string, tag = "1")]
    address: String,
    #[prost(string, tag = "2")]
    zip: String,
}

#[derive(Clone, PartialEq, prost::Message)]
struct User {
    #[prost(int64, tag = "1")]
    id: i64,
    #[prost(string, tag = "2")]
    name: String,
    #[prost(string, optional, tag = "3")]
    nickname: Option<String>,
    #[prost(string, repeated, tag = "4")]
    tags: Vec<String>,
    #[prost(int32, tag = "5")]
    gender: i32,
    #[prost(message, optional, tag = "8")]
    contact: Option<Contact>,
}

fn user_descriptor() -> Arc<MessageDescriptor> {
    let contact = MessageDescriptor::builder("Contact")
        .field(1, "address", FieldKind::String)
        .field(2, "zip", FieldKind::String)
        .build()
        .unwrap();
    MessageDescriptor::builder("User")
        .field(1, "id", FieldKind::Int64)
        .field(2, "name", FieldKind::String)
        .optional(3, "nickname", FieldKind::String)
        .repeated(4, "tags", FieldKind::String)
        .field(5, "gender", FieldKind::Int32)
        .field(8, "contact", FieldKind::Message(contact))
        .build()
        .unwrap()
}

fn reference_user() -> User {
    User {
        id: 1_234_567,
        name: "Benchmark User".to_string(),
        nickname: Some("bench".to_string()),
        tags: (0..16).map(|i| format!("tag-{i}")).collect(),
        gender: 2,
        contact: Some(Contact {
            address: "1 Infinite Loop".to_string(),
            zip: "95014".to_string(),
        }),
    }
}

fn codec_encode(c: &mut Criterion) {
    let descriptor = user_descriptor();
    let reference = reference_user();
    let message = Message::decode(&descriptor, &reference.encode_to_vec()[..]).unwrap();

    let mut group = c.benchmark_group("encode");
    group.bench_function("protodrift", |b| {
        let mut buf = Vec::with_capacity(message.encoded_len());
        b.iter(|| {
            buf.clear();
            message.encode(&mut buf);
            std::hint::black_box(buf.len())
        })
    });
    group.bench_function("prost", |b| {
        let mut buf = Vec::with_capacity(reference.encoded_len());
        b.iter(|| {
            buf.clear();
            reference.encode(&mut buf).unwrap();
            std::hint::black_box(buf.len())
        })
    });
}

fn codec_decode(c: &mut Criterion) {
    let descriptor = user_descriptor();
    let bytes = bytes::Bytes::from(reference_user().encode_to_vec());

    let mut group = c.benchmark_group("decode");
    group.bench_function("protodrift", |b| {
        b.iter(|| std::hint::black_box(Message::decode(&descriptor, bytes.clone()).unwrap()))
    });
    group.bench_function("prost", |b| {
        b.iter(|| std::hint::black_box(User::decode(bytes.clone()).unwrap()))
    });
}

criterion_group!(benches, codec_encode, codec_decode);
criterion_main!(benches);
