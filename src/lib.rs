pub mod bits;
pub mod compressor;
pub mod deflate;
pub mod error;
pub mod huffman;
pub mod lz77;

pub use compressor::{DeflateEncoder, ParallelCompressor, SingleStreamCompressor};
pub use deflate::BlockType;
pub use error::{Error, Result};

use std::io::{Read, Write};

/// Compression level (0-9)
///
/// - Level 0: store only, no matching
/// - Levels 1-3: greedy matching with short hash chains
/// - Levels 4-9: lazy matching, chain depth growing with the level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    #[default]
    Level9 = 9,
}

impl CompressionLevel {
    pub const FASTEST: Self = Self::Level1;
    pub const BEST: Self = Self::Level9;

    /// Get numeric level (0-9)
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Whether this level writes stored blocks only
    pub fn is_store_only(&self) -> bool {
        *self == Self::Level0
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        Ok(match level {
            0 => Self::Level0,
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            5 => Self::Level5,
            6 => Self::Level6,
            7 => Self::Level7,
            8 => Self::Level8,
            9 => Self::Level9,
            _ => return Err(Error::InvalidCompressionLevel(level)),
        })
    }
}

/// Memory level (1-9) controlling the hash table size: `2^(level + 7)` chain heads
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryLevel(u8);

impl MemoryLevel {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(9);

    pub fn level(&self) -> u8 {
        self.0
    }

    /// Number of bits in a hash value
    pub fn hash_bits(&self) -> u32 {
        u32::from(self.0) + 7
    }
}

impl Default for MemoryLevel {
    fn default() -> Self {
        Self(8)
    }
}

impl TryFrom<u8> for MemoryLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::InvalidMemoryLevel(level))
        }
    }
}

/// How a compressed stream ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Termination {
    /// End on a byte-aligned sync-flush boundary so another stream can follow
    #[default]
    Appendable,
    /// Set the final-block flag; nothing may follow
    Finish,
}

/// Configuration for compression
#[derive(Clone, Debug)]
pub struct DeflateConfig {
    pub compression_level: CompressionLevel,
    pub memory_level: MemoryLevel,
    /// Uncompressed bytes per DEFLATE block (default: 128 KiB)
    pub block_size: usize,
    pub termination: Termination,
    /// Size of each input read (default: 16 KiB)
    pub buffer_size: usize,
    /// Number of threads for multiple inputs (0 = auto, 1 = single-threaded)
    pub num_threads: usize,
}

impl DeflateConfig {
    pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;
    pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

    /// Reject settings no stream can be created with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::default(),
            memory_level: MemoryLevel::default(),
            block_size: Self::DEFAULT_BLOCK_SIZE,
            termination: Termination::default(),
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            num_threads: 1,
        }
    }
}

/// Statistics from a compression run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompressStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Independent DEFLATE streams written
    pub streams: u64,
    /// Blocks carrying input data (sync-flush markers are not counted)
    pub blocks_written: u64,
    pub stored_blocks: u64,
    pub fixed_blocks: u64,
    pub dynamic_blocks: u64,
}

impl CompressStats {
    pub(crate) fn record_block(&mut self, block_type: BlockType) {
        self.blocks_written += 1;
        match block_type {
            BlockType::Stored => self.stored_blocks += 1,
            BlockType::FixedHuffman => self.fixed_blocks += 1,
            BlockType::DynamicHuffman => self.dynamic_blocks += 1,
        }
    }

    /// Add another run's counters to this one
    pub fn merge(&mut self, other: &CompressStats) {
        self.input_bytes += other.input_bytes;
        self.output_bytes += other.output_bytes;
        self.streams += other.streams;
        self.blocks_written += other.blocks_written;
        self.stored_blocks += other.stored_blocks;
        self.fixed_blocks += other.fixed_blocks;
        self.dynamic_blocks += other.dynamic_blocks;
    }

    /// Output size as a fraction of input size (1.0 for empty input)
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            1.0
        } else {
            self.output_bytes as f64 / self.input_bytes as f64
        }
    }
}

/// Trait for driving whole inputs through the compressor
pub trait Compressor {
    /// Compress one input into one raw DEFLATE stream ended per the configured termination
    fn compress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressStats>;

    /// Compress each input as an independent stream, concatenated in order.
    ///
    /// Every stream but the last ends on a sync-flush boundary; the last one
    /// uses the configured termination.
    fn compress_all<R: Read + Send, W: Write>(
        &mut self,
        inputs: Vec<R>,
        output: W,
    ) -> Result<CompressStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level_range() {
        for n in 0..=9u8 {
            assert_eq!(CompressionLevel::try_from(n).unwrap().level(), n);
        }
        assert!(matches!(CompressionLevel::try_from(10), Err(Error::InvalidCompressionLevel(10))));
        assert!(CompressionLevel::Level0.is_store_only());
        assert_eq!(CompressionLevel::default(), CompressionLevel::Level9);
    }

    #[test]
    fn test_memory_level_range() {
        assert!(matches!(MemoryLevel::try_from(0), Err(Error::InvalidMemoryLevel(0))));
        assert!(matches!(MemoryLevel::try_from(10), Err(Error::InvalidMemoryLevel(10))));
        assert_eq!(MemoryLevel::default().hash_bits(), 15);
        assert_eq!(MemoryLevel::MIN.hash_bits(), 8);
        assert_eq!(MemoryLevel::MAX.hash_bits(), 16);
    }

    #[test]
    fn test_config_validate() {
        assert!(DeflateConfig::default().validate().is_ok());
        let config = DeflateConfig { block_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidBlockSize(0))));
    }

    #[test]
    fn test_stats_merge() {
        let mut total = CompressStats::default();
        let mut one = CompressStats { input_bytes: 10, output_bytes: 4, streams: 1, ..Default::default() };
        one.record_block(BlockType::DynamicHuffman);
        total.merge(&one);
        total.merge(&one);
        assert_eq!(total.input_bytes, 20);
        assert_eq!(total.streams, 2);
        assert_eq!(total.dynamic_blocks, 2);
        assert_eq!(total.blocks_written, 2);
        assert!((total.ratio() - 0.4).abs() < 1e-9);
    }
}
