//! DEFLATE block emission.
//!
//! Each pending block is priced three ways (stored, fixed Huffman, dynamic
//! Huffman) and written with whichever costs the fewest bits.

use super::tables::{
    encode_distance, encode_length, BlockType, CODE_LENGTH_ORDER, DISTANCE_TABLE, END_OF_BLOCK,
    LENGTH_TABLE, MAX_STORED_BLOCK, NUM_CODE_LENGTH_CODES,
};
use super::tokens::{Symbol, SymbolBlock};
use crate::bits::BitWriter;
use crate::huffman::tables::{
    fixed_distance_table, fixed_literal_table, MAX_CL_CODE_LENGTH, MAX_CODE_LENGTH,
};
use crate::huffman::{compute_code_lengths, ensure_two_codes, FrequencyCounter, HuffmanTable};

/// Code tables and header data for a dynamic Huffman block
#[derive(Clone, Debug)]
pub struct DynamicCodes {
    /// Literal/length code lengths (HLIT + 257 entries)
    pub literal_lengths: Vec<u8>,
    /// Distance code lengths (HDIST + 1 entries)
    pub distance_lengths: Vec<u8>,
    literal: HuffmanTable,
    distance: HuffmanTable,
    /// Code length alphabet lengths, indexed by symbol (0-18)
    cl_lengths: Vec<u8>,
    cl_table: HuffmanTable,
    /// Run-length encoded code lengths: (symbol, extra bits value)
    rle: Vec<(u8, u8)>,
    /// Number of code length code lengths sent (HCLEN + 4)
    hclen: usize,
}

impl DynamicCodes {
    /// Derive the block's codes from its symbol frequencies
    pub fn build(freq: &FrequencyCounter) -> Self {
        let num_lit = freq.num_literal_codes();
        let num_dist = freq.num_distance_codes();

        let mut literal_lengths =
            compute_code_lengths(&freq.literal_freq[..num_lit], MAX_CODE_LENGTH);
        ensure_two_codes(&mut literal_lengths);
        let mut distance_lengths =
            compute_code_lengths(&freq.distance_freq[..num_dist], MAX_CODE_LENGTH);
        ensure_two_codes(&mut distance_lengths);

        let combined: Vec<u8> =
            literal_lengths.iter().chain(distance_lengths.iter()).copied().collect();
        let rle = rle_encode_lengths(&combined);

        let mut cl_freq = [0u32; NUM_CODE_LENGTH_CODES];
        for &(sym, _) in &rle {
            cl_freq[sym as usize] += 1;
        }
        let mut cl_lengths = compute_code_lengths(&cl_freq, MAX_CL_CODE_LENGTH);
        ensure_two_codes(&mut cl_lengths);

        // Trailing zero lengths in transmission order are implied
        let hclen = CODE_LENGTH_ORDER
            .iter()
            .rposition(|&sym| cl_lengths[sym] > 0)
            .map_or(4, |i| (i + 1).max(4));

        Self {
            literal: HuffmanTable::from_lengths(&literal_lengths),
            distance: HuffmanTable::from_lengths(&distance_lengths),
            cl_table: HuffmanTable::from_lengths(&cl_lengths),
            literal_lengths,
            distance_lengths,
            cl_lengths,
            rle,
            hclen,
        }
    }

    /// Size of the dynamic header after the 3-bit block header
    pub fn header_bits(&self) -> u64 {
        let table_bits: u64 = self
            .rle
            .iter()
            .map(|&(sym, _)| (self.cl_lengths[sym as usize] + rle_extra_bits(sym)) as u64)
            .sum();
        5 + 5 + 4 + 3 * self.hclen as u64 + table_bits
    }

    pub fn literal_table(&self) -> &HuffmanTable {
        &self.literal
    }

    pub fn distance_table(&self) -> &HuffmanTable {
        &self.distance
    }

    /// Write the dynamic Huffman block header (RFC 1951 section 3.2.7)
    fn write_header(&self, writer: &mut BitWriter) {
        let hlit = self.literal_lengths.len() - 257;
        let hdist = self.distance_lengths.len() - 1;

        writer.write_bits(hlit as u32, 5);
        writer.write_bits(hdist as u32, 5);
        writer.write_bits((self.hclen - 4) as u32, 4);

        for &sym in CODE_LENGTH_ORDER.iter().take(self.hclen) {
            writer.write_bits(self.cl_lengths[sym] as u32, 3);
        }

        for &(sym, extra) in &self.rle {
            self.cl_table.write_symbol(writer, sym as usize);
            let extra_bits = rle_extra_bits(sym);
            if extra_bits > 0 {
                writer.write_bits(extra as u32, extra_bits);
            }
        }
    }
}

/// Encoding strategy for one block
#[derive(Clone, Debug)]
pub enum BlockPlan {
    /// Raw bytes, split into stored blocks of at most 65535 bytes
    Stored,
    /// Fixed Huffman tables from RFC 1951 section 3.2.6
    Fixed,
    /// Per-block Huffman tables sent in the block header
    Dynamic(Box<DynamicCodes>),
}

impl BlockPlan {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockPlan::Stored => BlockType::Stored,
            BlockPlan::Fixed => BlockType::FixedHuffman,
            BlockPlan::Dynamic(_) => BlockType::DynamicHuffman,
        }
    }

    /// Exact size in bits of the block when written at a stream offset with
    /// `pending_bits` bits already in the current byte
    pub fn cost_bits(&self, freq: &FrequencyCounter, input_len: usize, pending_bits: u8) -> u64 {
        match self {
            BlockPlan::Stored => stored_block_bits(input_len, pending_bits),
            BlockPlan::Fixed => {
                3 + payload_bits(freq, fixed_literal_table(), fixed_distance_table())
            }
            BlockPlan::Dynamic(codes) => {
                3 + codes.header_bits() + payload_bits(freq, &codes.literal, &codes.distance)
            }
        }
    }
}

/// Chooses and writes DEFLATE blocks
#[derive(Clone, Debug)]
pub struct BlockEncoder {
    /// Level 0: every block is stored
    store_only: bool,
}

impl BlockEncoder {
    pub fn new(store_only: bool) -> Self {
        Self { store_only }
    }

    /// Pick the cheapest encoding for `block`. Stored wins ties, then fixed.
    pub fn plan(&self, block: &SymbolBlock, pending_bits: u8) -> BlockPlan {
        if self.store_only {
            return BlockPlan::Stored;
        }

        let freq = FrequencyCounter::from_symbols(block.symbols());
        let dynamic = BlockPlan::Dynamic(Box::new(DynamicCodes::build(&freq)));

        let stored_cost = BlockPlan::Stored.cost_bits(&freq, block.input_len(), pending_bits);
        let fixed_cost = BlockPlan::Fixed.cost_bits(&freq, block.input_len(), pending_bits);
        let dynamic_cost = dynamic.cost_bits(&freq, block.input_len(), pending_bits);

        if stored_cost <= fixed_cost.min(dynamic_cost) {
            BlockPlan::Stored
        } else if fixed_cost <= dynamic_cost {
            BlockPlan::Fixed
        } else {
            dynamic
        }
    }

    /// Encode `block` with the cheapest strategy and report which one was used
    pub fn encode(&self, writer: &mut BitWriter, block: &SymbolBlock, is_final: bool) -> BlockType {
        let plan = self.plan(block, writer.pending_bits());
        self.write_block(writer, &plan, block, is_final);
        plan.block_type()
    }

    /// Write `block` using a specific plan
    pub fn write_block(
        &self,
        writer: &mut BitWriter,
        plan: &BlockPlan,
        block: &SymbolBlock,
        is_final: bool,
    ) {
        match plan {
            BlockPlan::Stored => write_stored(writer, block.raw(), is_final),
            BlockPlan::Fixed => {
                writer.write_bit(is_final);
                writer.write_bits(BlockType::FixedHuffman as u32, 2);
                write_symbols(writer, block.symbols(), fixed_literal_table(), fixed_distance_table());
            }
            BlockPlan::Dynamic(codes) => {
                writer.write_bit(is_final);
                writer.write_bits(BlockType::DynamicHuffman as u32, 2);
                codes.write_header(writer);
                write_symbols(writer, block.symbols(), &codes.literal, &codes.distance);
            }
        }
    }

    /// Empty stored block that leaves the stream byte-aligned (sync flush marker)
    pub fn write_sync_marker(&self, writer: &mut BitWriter) {
        write_stored(writer, &[], false);
    }
}

/// Write `data` as one or more stored blocks; only the last may carry BFINAL
fn write_stored(writer: &mut BitWriter, data: &[u8], is_final: bool) {
    let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
    if chunks.peek().is_none() {
        write_stored_chunk(writer, &[], is_final);
        return;
    }
    while let Some(chunk) = chunks.next() {
        write_stored_chunk(writer, chunk, is_final && chunks.peek().is_none());
    }
}

fn write_stored_chunk(writer: &mut BitWriter, chunk: &[u8], is_final: bool) {
    let len = chunk.len() as u16;
    writer.write_bit(is_final);
    writer.write_bits(BlockType::Stored as u32, 2);
    writer.align_to_byte();
    writer.write_u16_le(len);
    writer.write_u16_le(!len);
    writer.write_bytes(chunk);
}

/// Encode symbols using the given tables, then the end-of-block symbol
fn write_symbols(
    writer: &mut BitWriter,
    symbols: &[Symbol],
    lit_codes: &HuffmanTable,
    dist_codes: &HuffmanTable,
) {
    for symbol in symbols {
        match *symbol {
            Symbol::Literal(byte) => lit_codes.write_symbol(writer, byte as usize),
            Symbol::Match { length, distance } => {
                if let Some((len_code, extra_val, extra_bits)) = encode_length(length) {
                    lit_codes.write_symbol(writer, len_code as usize);
                    if extra_bits > 0 {
                        writer.write_bits(extra_val as u32, extra_bits);
                    }
                }
                if let Some((dist_code, extra_val, extra_bits)) = encode_distance(distance) {
                    dist_codes.write_symbol(writer, dist_code as usize);
                    if extra_bits > 0 {
                        writer.write_bits(extra_val as u32, extra_bits);
                    }
                }
            }
        }
    }
    lit_codes.write_symbol(writer, END_OF_BLOCK as usize);
}

/// Bits needed for the symbols of a Huffman block, end-of-block included
fn payload_bits(freq: &FrequencyCounter, lit: &HuffmanTable, dist: &HuffmanTable) -> u64 {
    let literal: u64 = freq
        .literal_freq
        .iter()
        .enumerate()
        .filter(|(_, &f)| f > 0)
        .map(|(sym, &f)| {
            let extra = if sym > END_OF_BLOCK as usize { LENGTH_TABLE[sym - 257].1 } else { 0 };
            f as u64 * (lit.length(sym) + extra) as u64
        })
        .sum();
    let distance: u64 = freq
        .distance_freq
        .iter()
        .enumerate()
        .filter(|(_, &f)| f > 0)
        .map(|(sym, &f)| f as u64 * (dist.length(sym) + DISTANCE_TABLE[sym].1) as u64)
        .sum();
    literal + distance
}

/// Bits needed to store `len` bytes starting `pending_bits` into a byte
fn stored_block_bits(len: usize, pending_bits: u8) -> u64 {
    let chunks = ((len + MAX_STORED_BLOCK - 1) / MAX_STORED_BLOCK).max(1) as u64;
    let first_pad = (8 - (pending_bits as u64 + 3) % 8) % 8;
    // Later chunks start aligned: 3 header bits + 5 padding bits
    3 + first_pad + (chunks - 1) * 8 + chunks * 32 + len as u64 * 8
}

fn rle_extra_bits(sym: u8) -> u8 {
    match sym {
        16 => 2, // 3-6 repeats
        17 => 3, // 3-10 zeros
        18 => 7, // 11-138 zeros
        _ => 0,
    }
}

/// RLE encode code lengths using symbols 16, 17, 18
fn rle_encode_lengths(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let run_len = lengths[i..].iter().take_while(|&&l| l == len).count();
        let mut run = run_len;

        if len == 0 {
            while run > 0 {
                if run >= 11 {
                    let count = run.min(138);
                    result.push((18, (count - 11) as u8));
                    run -= count;
                } else if run >= 3 {
                    let count = run.min(10);
                    result.push((17, (count - 3) as u8));
                    run -= count;
                } else {
                    result.push((0, 0));
                    run -= 1;
                }
            }
        } else {
            result.push((len, 0));
            run -= 1;

            while run > 0 {
                if run >= 3 {
                    let count = run.min(6);
                    result.push((16, (count - 3) as u8));
                    run -= count;
                } else {
                    result.push((len, 0));
                    run -= 1;
                }
            }
        }

        i += run_len;
    }

    result
}
