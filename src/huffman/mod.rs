pub mod encoder;
pub mod tables;

pub use encoder::{compute_code_lengths, ensure_two_codes, FrequencyCounter, HuffmanTable};
