use std::io::{Cursor, SeekFrom};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use seekstream::{Level, SeekStream, StreamConfig};

const STREAM_LEN: usize = 4 * 1024 * 1024;
const SEEKS_PER_ITER: usize = 64;

fn build_stream(flush_threshold: usize) -> SeekStream<Cursor<Vec<u8>>> {
    let mut stream = SeekStream::with_config(
        Cursor::new(Vec::new()),
        StreamConfig {
            level: Level::Fastest,
            flush_threshold,
        },
    )
    .expect("stream");
    let data: Vec<u8> = (0..STREAM_LEN).map(|i| (i % 251) as u8).collect();
    stream.write(&data).expect("write");
    stream.flush().expect("flush");
    // Populate the checkpoint index once; seeks then resolve through it.
    stream.seek(SeekFrom::Start(0)).expect("rewind");
    stream
}

fn bench_seek(c: &mut Criterion) {
    let mut group = c.benchmark_group("seek");
    for &chunk_size in &[16 * 1024usize, 64 * 1024, 256 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                let mut stream = build_stream(chunk_size);
                stream.seek(SeekFrom::End(0)).expect("index scan");
                let mut byte = [0u8; 1];
                let mut target = 0u64;
                b.iter(|| {
                    for _ in 0..SEEKS_PER_ITER {
                        target = (target.wrapping_mul(6364136223846793005).wrapping_add(1))
                            % STREAM_LEN as u64;
                        stream.seek(SeekFrom::Start(black_box(target))).expect("seek");
                        stream.read(&mut byte).expect("read");
                    }
                    black_box(byte[0])
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_seek);
criterion_main!(benches);
