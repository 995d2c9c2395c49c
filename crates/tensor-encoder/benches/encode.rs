use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_encoder::{ByteOrder, TensorEncoder};

fn bench_encode(c: &mut Criterion) {
    // 224x224 grayscale frame
    let samples: Vec<u8> = (0..224 * 224).map(|i| (i % 256) as u8).collect();
    let encoder = TensorEncoder::new(samples.len());

    c.bench_function("encode_224x224", |b| {
        b.iter(|| encoder.encode(black_box(&samples)))
    });

    let tensor = encoder.encode(&samples).unwrap();
    c.bench_function("to_bytes_native", |b| {
        b.iter(|| black_box(&tensor).to_bytes(ByteOrder::Native))
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
