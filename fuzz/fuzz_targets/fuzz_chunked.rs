#![no_main]

use deflate_stream::{CompressionLevel, DeflateConfig, DeflateEncoder, Termination};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte seeds the write sizes; output must not depend on them
    let Some((&seed, payload)) = data.split_first() else {
        return;
    };
    let config = DeflateConfig {
        compression_level: CompressionLevel::try_from(seed % 10).unwrap(),
        termination: Termination::Finish,
        ..Default::default()
    };

    let mut whole = DeflateEncoder::new(Vec::new(), &config).unwrap();
    whole.write_data(payload).unwrap();
    whole.finish().unwrap();

    let mut split = DeflateEncoder::new(Vec::new(), &config).unwrap();
    let mut state = u32::from(seed) | 1;
    let mut rest = payload;
    while !rest.is_empty() {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let n = ((state >> 16) as usize % 700 + 1).min(rest.len());
        split.write_data(&rest[..n]).unwrap();
        rest = &rest[n..];
    }
    split.finish().unwrap();

    assert_eq!(whole.into_inner(), split.into_inner());
});
