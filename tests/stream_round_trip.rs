use std::io::{Cursor, Read, SeekFrom};

use seekstream::{Level, SeekStream, StreamConfig};
use tempfile::tempfile;

#[test]
fn write_flush_reopen_read_back() {
    let file = tempfile().expect("tempfile");
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    let mut stream = SeekStream::new(file).expect("open");
    assert_eq!(stream.write(&data).expect("write"), data.len());
    stream.flush().expect("flush");
    let file = stream.into_inner();

    let mut reopened = SeekStream::new(file).expect("reopen");
    let mut out = Vec::new();
    // Through the std adapter; read_exact/read_to_end must loop across
    // chunk-boundary partial reads transparently.
    reopened.read_to_end(&mut out).expect("read_to_end");
    assert_eq!(out, data);
}

#[test]
fn auto_flush_threshold_four_writes_two_chunks() {
    let mut stream = SeekStream::with_config(
        Cursor::new(Vec::new()),
        StreamConfig {
            level: Level::Default,
            flush_threshold: 4,
        },
    )
    .expect("open");

    assert_eq!(stream.write(b"ABCDEFGHIJ").expect("write"), 10);

    // Chunks 1 and 2 (four bytes each) are committed; "IJ" stays pending.
    let committed = stream.into_inner().into_inner();
    let chunks = parse_chunk_layout(&committed);
    assert_eq!(chunks.len(), 2);

    // An explicit flush commits the tail and the reopened stream reads the
    // full ten bytes back.
    let mut stream = SeekStream::with_config(
        Cursor::new(Vec::new()),
        StreamConfig {
            level: Level::Default,
            flush_threshold: 4,
        },
    )
    .expect("open");
    stream.write(b"ABCDEFGHIJ").expect("write");
    stream.flush().expect("flush");
    let committed = stream.into_inner().into_inner();
    assert_eq!(parse_chunk_layout(&committed).len(), 3);

    let mut reopened = SeekStream::new(Cursor::new(committed)).expect("reopen");
    let mut out = Vec::new();
    reopened.read_to_end(&mut out).expect("read_to_end");
    assert_eq!(out, b"ABCDEFGHIJ");
}

#[test]
fn single_read_never_spans_chunks() {
    let mut stream = SeekStream::new(Cursor::new(Vec::new())).expect("open");
    stream.write(b"first").expect("write");
    stream.flush().expect("flush");
    stream.write(b"second!").expect("write");
    stream.flush().expect("flush");

    let mut reopened = SeekStream::new(stream.into_inner()).expect("reopen");
    let mut buf = [0u8; 64];

    // More than the first chunk's decompressed size is requested, but the
    // read stops at the chunk boundary.
    let n = reopened.read(&mut buf).expect("read");
    assert_eq!(&buf[..n], b"first");

    let n = reopened.read(&mut buf).expect("read");
    assert_eq!(&buf[..n], b"second!");

    assert_eq!(reopened.read(&mut buf).expect("read"), 0);
}

#[test]
fn level_none_still_round_trips() {
    let data = vec![7u8; 10_000];
    let mut stream =
        SeekStream::with_level(Cursor::new(Vec::new()), Level::None).expect("open");
    stream.write(&data).expect("write");
    stream.close().expect("close");

    let mut reopened = SeekStream::new(stream.into_inner()).expect("reopen");
    let mut out = Vec::new();
    reopened.read_to_end(&mut out).expect("read_to_end");
    assert_eq!(out, data);
}

#[test]
fn reopen_discovers_logical_length_lazily() {
    let mut stream = SeekStream::with_config(
        Cursor::new(Vec::new()),
        StreamConfig {
            level: Level::Fastest,
            flush_threshold: 256,
        },
    )
    .expect("open");
    let data = vec![3u8; 10_000];
    stream.write(&data).expect("write");
    stream.flush().expect("flush");

    let mut reopened = SeekStream::new(stream.into_inner()).expect("reopen");
    assert_eq!(
        reopened.seek(SeekFrom::End(0)).expect("seek end"),
        data.len() as u64
    );
}

// Walk the committed bytes as (prefix, body) pairs, returning each chunk's
// compressed length.
fn parse_chunk_layout(bytes: &[u8]) -> Vec<u64> {
    let mut chunks = Vec::new();
    let mut at = 0usize;
    while at < bytes.len() {
        assert!(at + 8 <= bytes.len(), "truncated length prefix at {at}");
        let len = u64::from_le_bytes(bytes[at..at + 8].try_into().expect("slice length"));
        at += 8 + len as usize;
        assert!(at <= bytes.len(), "chunk body extends past end");
        chunks.push(len);
    }
    chunks
}
