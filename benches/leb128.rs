use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use protodrift::leb128::LebCodec;
use protodrift::wire::decode_varint;

static LEB128_VALUES: [u64; 6] = [
    1,
    0x0000_0000_0000_0080,
    0x0000_0000_0000_8000,
    0x0000_0000_0080_0000,
    0x0000_0000_8000_0000,
    u64::MAX,
];

fn encoded_values() -> Vec<(Vec<u8>, usize)> {
    LEB128_VALUES
        .into_iter()
        .map(|value| {
            let mut buffer = Vec::with_capacity(16);
            let len = value.encode_leb128(&mut buffer);
            (buffer, len)
        })
        .collect()
}

fn leb128_decoding_single(c: &mut Criterion) {
    let values = encoded_values();

    let mut group = c.benchmark_group("decoding_single");
    for (data, len) in &values {
        group.bench_with_input(BenchmarkId::new("protodrift", len), data, |b, data| {
            b.iter(|| {
                let value = u64::decode_leb128(&data[..]);
                std::hint::black_box(value)
            })
        });
        group.bench_with_input(BenchmarkId::new("leb128 crate", len), data, |b, data| {
            b.iter(|| {
                let mut read = &data[..];
                let value = leb128::read::unsigned(&mut read);
                std::hint::black_box(value)
            })
        });
    }
}

fn leb128_decoding_many(c: &mut Criterion) {
    let stream: Vec<u8> = encoded_values()
        .into_iter()
        .cycle()
        .take(1024)
        .flat_map(|(data, _)| data)
        .collect();

    let mut group = c.benchmark_group("decoding_many");
    group.bench_function("protodrift", |b| {
        b.iter(|| {
            let mut offset = 0;
            while offset < stream.len() {
                let (value, next) = decode_varint(&stream, offset).unwrap();
                std::hint::black_box(value);
                offset = next;
            }
        })
    });
    group.bench_function("leb128 crate", |b| {
        b.iter(|| {
            let mut read = &stream[..];
            while !read.is_empty() {
                let value = leb128::read::unsigned(&mut read).unwrap();
                std::hint::black_box(value);
            }
        })
    });
}

fn leb128_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    for value in LEB128_VALUES {
        let len = value.encoded_leb128_len();
        group.bench_with_input(BenchmarkId::new("protodrift", len), &value, |b, value| {
            let mut buffer = Vec::with_capacity(16);
            b.iter(|| {
                buffer.clear();
                std::hint::black_box(value.encode_leb128(&mut buffer))
            })
        });
        group.bench_with_input(BenchmarkId::new("leb128 crate", len), &value, |b, value| {
            let mut buffer = Vec::with_capacity(16);
            b.iter(|| {
                buffer.clear();
                std::hint::black_box(leb128::write::unsigned(&mut buffer, *value))
            })
        });
    }
}

criterion_group!(
    benches,
    leb128_decoding_single,
    leb128_decoding_many,
    leb128_encoding
);
criterion_main!(benches);
