#![no_main]

use deflate_stream::{
    CompressionLevel, Compressor, DeflateConfig, MemoryLevel, SingleStreamCompressor, Termination,
};
use libfuzzer_sys::fuzz_target;
use std::io::{Cursor, Read};

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the configuration, the rest is the payload
    if data.len() < 2 {
        return;
    }
    let level = CompressionLevel::try_from(data[0] % 10).unwrap();
    let memory_level = MemoryLevel::try_from(data[1] % 9 + 1).unwrap();
    let termination = if data[0] & 0x80 != 0 { Termination::Finish } else { Termination::Appendable };
    let payload = &data[2..];

    let config = DeflateConfig {
        compression_level: level,
        memory_level,
        termination,
        block_size: 1 + (data[1] as usize) * 512,
        ..Default::default()
    };
    let mut compressor = SingleStreamCompressor::new(config);
    let mut output = Vec::new();
    compressor.compress(Cursor::new(payload), &mut output).unwrap();

    let decoded = match termination {
        Termination::Finish => {
            let mut decoded = Vec::new();
            flate2::read::DeflateDecoder::new(&output[..]).read_to_end(&mut decoded).unwrap();
            decoded
        }
        Termination::Appendable => inflate_sync_flushed(&output),
    };
    assert_eq!(decoded, payload);
});

/// A sync-flushed stream has no final block, so decode it with an explicit sync flush
fn inflate_sync_flushed(data: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::Decompress::new(false);
    let mut out = Vec::with_capacity(data.len() * 4 + 1024);
    loop {
        if out.len() == out.capacity() {
            out.reserve(64 * 1024);
        }
        let consumed = decoder.total_in() as usize;
        decoder
            .decompress_vec(&data[consumed..], &mut out, flate2::FlushDecompress::Sync)
            .unwrap();
        if out.len() < out.capacity() {
            break;
        }
    }
    assert_eq!(decoder.total_in() as usize, data.len());
    out
}
