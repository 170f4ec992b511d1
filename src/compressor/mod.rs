pub mod parallel;
pub mod single;
pub mod stream;

pub use parallel::ParallelCompressor;
pub use single::SingleStreamCompressor;
pub use stream::{DeflateEncoder, StreamState};

/// Decode a raw DEFLATE stream that ends on a sync flush rather than a final
/// block. A reader-based decoder reports such a stream as truncated.
#[cfg(test)]
pub(crate) fn inflate_appendable(data: &[u8]) -> Vec<u8> {
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
        // Spare room left means the decoder stopped for lack of input
        if out.len() < out.capacity() {
            break;
        }
    }
    assert_eq!(decoder.total_in() as usize, data.len(), "trailing undecoded bytes");
    out
}
