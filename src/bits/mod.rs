pub mod writer;

pub use writer::{reverse_bits, BitWriter};
