use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hsqlib::unpack_bytes;
use std::hint::black_box;
use std::time::Duration;

const HEADER_SIZE: usize = 6;

fn finish_file(payload_len: usize, body: Vec<u8>) -> Vec<u8> {
    let total = HEADER_SIZE + body.len();
    let mut header = [
        (payload_len & 0xFF) as u8,
        ((payload_len >> 8) & 0xFF) as u8,
        0x00,
        (total & 0xFF) as u8,
        ((total >> 8) & 0xFF) as u8,
        0x00,
    ];
    let sum = header.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    header[5] = 0xABu8.wrapping_sub(sum);

    let mut file = header.to_vec();
    file.extend_from_slice(&body);
    file
}

/// All-literal stream: every 16 payload bytes behind a 0xFFFF word.
fn generate_literal_stream(size: usize) -> Vec<u8> {
    let payload: Vec<u8> = (0..size)
        .map(|i| {
            let x = i as u32;
            ((x.wrapping_mul(1664525).wrapping_add(1013904223)) >> 8) as u8
        })
        .collect();

    let mut body = Vec::new();
    for chunk in payload.chunks(16) {
        body.extend_from_slice(&[0xFF, 0xFF]);
        body.extend_from_slice(chunk);
    }
    finish_file(size, body)
}

/// Back-reference-heavy stream: 16 literal seed bytes, then rounds of eight
/// Method1 copies per 0xAAAA instruction word, 9 bytes each at distance -16.
fn generate_backref_stream(size: usize) -> Vec<u8> {
    let mut body = vec![0xFF, 0xFF];
    body.extend((0..16).map(|i| (i * 17 + 11) as u8));
    let mut produced = 16usize;

    while produced < size {
        body.extend_from_slice(&[0xAA, 0xAA]);
        for _ in 0..8 {
            // raw = ((8192 - 16) << 3) | 7: length 7 + 2, distance -16.
            body.extend_from_slice(&[0x87, 0xFF]);
            produced += 9;
        }
    }
    finish_file(produced, body)
}

fn decompression_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompression_throughput");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(100);

    for size in [1024, 10240, 102400].iter() {
        let size_label = match *size {
            1024 => "1KB",
            10240 => "10KB",
            102400 => "100KB",
            _ => "unknown",
        };

        for pattern in ["literal", "backref"].iter() {
            let file = match *pattern {
                "literal" => generate_literal_stream(*size),
                "backref" => generate_backref_stream(*size),
                _ => unreachable!(),
            };
            let uncompressed = unpack_bytes(&file, true).expect("benchmark stream must decode");

            group.throughput(Throughput::Bytes(uncompressed.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{pattern}_{size_label}"), size),
                &file,
                |b, file| {
                    b.iter(|| {
                        let output = unpack_bytes(black_box(file), true).unwrap();
                        black_box(output)
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, decompression_throughput);
criterion_main!(benches);
