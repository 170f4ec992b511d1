use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::bits::BitWriter;
use crate::deflate::tables::{
    encode_distance, encode_length, END_OF_BLOCK, NUM_DISTANCE_CODES, NUM_LITERAL_CODES,
};
use crate::deflate::tokens::Symbol;

/// Frequency counter for dynamic Huffman code generation
#[derive(Clone, Debug)]
pub struct FrequencyCounter {
    /// Frequencies for literal (0-255), EOB (256), and length codes (257-285)
    pub literal_freq: [u32; NUM_LITERAL_CODES],
    /// Frequencies for distance codes (0-29)
    pub distance_freq: [u32; NUM_DISTANCE_CODES],
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self { literal_freq: [0; NUM_LITERAL_CODES], distance_freq: [0; NUM_DISTANCE_CODES] }
    }

    /// Count one block's symbols, including its end-of-block marker
    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        let mut freq = Self::new();
        freq.count_symbols(symbols);
        freq.literal_freq[END_OF_BLOCK as usize] += 1;
        freq
    }

    /// Count frequencies from symbols
    pub fn count_symbols(&mut self, symbols: &[Symbol]) {
        for symbol in symbols {
            match *symbol {
                Symbol::Literal(byte) => {
                    self.literal_freq[byte as usize] += 1;
                }
                Symbol::Match { length, distance } => {
                    if let Some((len_code, _, _)) = encode_length(length) {
                        self.literal_freq[len_code as usize] += 1;
                    }
                    if let Some((dist_code, _, _)) = encode_distance(distance) {
                        self.distance_freq[dist_code as usize] += 1;
                    }
                }
            }
        }
    }

    /// Get the number of literal/length codes needed (HLIT + 257)
    pub fn num_literal_codes(&self) -> usize {
        let last = (257..NUM_LITERAL_CODES).rev().find(|&i| self.literal_freq[i] > 0);
        last.unwrap_or(END_OF_BLOCK as usize) + 1
    }

    /// Get the number of distance codes needed (HDIST + 1)
    pub fn num_distance_codes(&self) -> usize {
        let last = (0..NUM_DISTANCE_CODES).rev().find(|&i| self.distance_freq[i] > 0);
        last.map_or(1, |i| i + 1)
    }
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute Huffman code lengths for `frequencies`, limited to `max_bits`.
///
/// The tree merges the two lightest nodes first; equal weights resolve towards the
/// lower symbol, and leaves always beat internal nodes created later, so the result
/// is fully deterministic. Depths beyond `max_bits` are clamped and the Kraft sum
/// is then repaired by splitting shorter codes.
///
/// Returns a vector of code lengths (0 for unused symbols). A lone used symbol
/// gets a one-bit code.
pub fn compute_code_lengths(frequencies: &[u32], max_bits: u8) -> Vec<u8> {
    let n = frequencies.len();
    let mut lengths = vec![0u8; n];

    let used: Vec<usize> = (0..n).filter(|&sym| frequencies[sym] > 0).collect();
    match used.len() {
        0 => return lengths,
        1 => {
            lengths[used[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    let depths = leaf_depths(&used, frequencies);
    let bl_count = limited_length_counts(&depths, max_bits as usize);

    // Hand the shortest lengths to the shallowest leaves, heavier first
    let mut order: Vec<usize> = (0..used.len()).collect();
    order.sort_by(|&a, &b| {
        depths[a]
            .cmp(&depths[b])
            .then(frequencies[used[b]].cmp(&frequencies[used[a]]))
            .then(used[a].cmp(&used[b]))
    });

    let mut next = order.into_iter();
    for (bits, &count) in bl_count.iter().enumerate().skip(1) {
        for _ in 0..count {
            if let Some(leaf) = next.next() {
                lengths[used[leaf]] = bits as u8;
            }
        }
    }

    lengths
}

/// Unbounded Huffman depth of each used symbol, in `used` order.
///
/// Nodes live in flat arrays: leaves first, then each merged node, so a parent
/// always has a larger index than its children.
fn leaf_depths(used: &[usize], frequencies: &[u32]) -> Vec<u32> {
    let num_leaves = used.len();
    let mut parent = vec![usize::MAX; num_leaves];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = used
        .iter()
        .enumerate()
        .map(|(node, &sym)| Reverse((frequencies[sym] as u64, node)))
        .collect();

    while heap.len() > 1 {
        let (Some(Reverse((w1, a))), Some(Reverse((w2, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let merged = parent.len();
        parent.push(usize::MAX);
        parent[a] = merged;
        parent[b] = merged;
        heap.push(Reverse((w1 + w2, merged)));
    }

    let root = parent.len() - 1;
    let mut depth = vec![0u32; parent.len()];
    for node in (0..root).rev() {
        depth[node] = depth[parent[node]] + 1;
    }
    depth.truncate(num_leaves);
    depth
}

/// Number of codes at each length (index = length) after clamping to `max_bits`
fn limited_length_counts(depths: &[u32], max_bits: usize) -> Vec<u32> {
    let mut bl_count = vec![0u32; max_bits + 1];
    for &d in depths {
        bl_count[(d as usize).min(max_bits)] += 1;
    }

    // Kraft sum scaled by 2^max_bits; a complete code hits the target exactly
    let target = 1u64 << max_bits;
    let mut total: u64 =
        (1..=max_bits).map(|bits| (bl_count[bits] as u64) << (max_bits - bits)).sum();

    while total > target {
        bl_count[max_bits] -= 1;
        match (1..max_bits).rev().find(|&bits| bl_count[bits] > 0) {
            Some(bits) => {
                bl_count[bits] -= 1;
                bl_count[bits + 1] += 2;
            }
            None => {
                bl_count[max_bits] += 1;
                break;
            }
        }
        total -= 1;
    }

    bl_count
}

/// Give an alphabet at least two codes so the code is complete.
///
/// Decoders reject incomplete code-length codes, and an all-zero distance
/// alphabet cannot be transmitted at all.
pub fn ensure_two_codes(lengths: &mut Vec<u8>) {
    if lengths.len() < 2 {
        lengths.resize(2, 0);
    }
    let mut used = lengths.iter().filter(|&&l| l > 0).count();
    for len in lengths.iter_mut() {
        if used >= 2 {
            break;
        }
        if *len == 0 {
            *len = 1;
            used += 1;
        }
    }
}

/// Canonical Huffman code table: symbol -> (code, length)
///
/// Codes are MSB-first values; the bit writer reverses them on output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanTable {
    codes: Vec<(u32, u8)>,
}

impl HuffmanTable {
    /// Build canonical Huffman codes from code lengths (RFC 1951 section 3.2.2)
    pub fn from_lengths(lengths: &[u8]) -> Self {
        let max_bits = lengths.iter().copied().max().unwrap_or(0) as usize;

        let mut bl_count = vec![0u32; max_bits + 1];
        for &len in lengths {
            if len > 0 {
                bl_count[len as usize] += 1;
            }
        }

        let mut next_code = vec![0u32; max_bits + 1];
        let mut code = 0u32;
        for bits in 1..=max_bits {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let mut codes = vec![(0u32, 0u8); lengths.len()];
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 {
                codes[sym] = (next_code[len as usize], len);
                next_code[len as usize] += 1;
            }
        }

        Self { codes }
    }

    /// (code, length) for `symbol`; length 0 means the symbol is absent
    #[inline]
    pub fn code(&self, symbol: usize) -> (u32, u8) {
        self.codes[symbol]
    }

    /// Code length in bits for `symbol`
    #[inline]
    pub fn length(&self, symbol: usize) -> u8 {
        self.codes[symbol].1
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Emit the code for `symbol`
    #[inline]
    pub fn write_symbol(&self, writer: &mut BitWriter, symbol: usize) {
        let (code, len) = self.codes[symbol];
        debug_assert!(len > 0, "symbol {} has no code", symbol);
        writer.write_bits_reversed(code, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_sum(lengths: &[u8]) -> f64 {
        lengths.iter().filter(|&&l| l > 0).map(|&l| 2f64.powi(-(l as i32))).sum()
    }

    fn assert_prefix_free(table: &HuffmanTable) {
        let codes: Vec<(u32, u8)> = (0..table.len()).map(|s| table.code(s)).filter(|c| c.1 > 0).collect();
        for (i, &(a, la)) in codes.iter().enumerate() {
            for &(b, lb) in &codes[i + 1..] {
                let (short, ls, long, ll) = if la <= lb { (a, la, b, lb) } else { (b, lb, a, la) };
                assert_ne!(long >> (ll - ls), short, "code {:b} prefixes {:b}", short, long);
            }
        }
    }

    #[test]
    fn test_frequency_counter() {
        let symbols = vec![
            Symbol::Literal(b'a'),
            Symbol::Literal(b'a'),
            Symbol::Literal(b'b'),
            Symbol::Match { length: 3, distance: 1 },
        ];
        let freq = FrequencyCounter::from_symbols(&symbols);

        assert_eq!(freq.literal_freq[b'a' as usize], 2);
        assert_eq!(freq.literal_freq[b'b' as usize], 1);
        assert_eq!(freq.literal_freq[256], 1); // EOB always counted
        assert_eq!(freq.literal_freq[257], 1); // length 3
        assert_eq!(freq.distance_freq[0], 1); // distance 1
        assert_eq!(freq.num_literal_codes(), 258);
        assert_eq!(freq.num_distance_codes(), 1);
    }

    #[test]
    fn test_frequency_counter_literals_only() {
        let freq = FrequencyCounter::from_symbols(&[Symbol::Literal(0)]);
        assert_eq!(freq.num_literal_codes(), 257);
        assert_eq!(freq.num_distance_codes(), 1);
    }

    #[test]
    fn test_compute_code_lengths() {
        let freqs = [1u32, 1, 1, 1];
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths, vec![2, 2, 2, 2]);
        assert_eq!(kraft_sum(&lengths), 1.0);
    }

    #[test]
    fn test_compute_code_lengths_skewed() {
        let freqs = [100u32, 1, 1, 1];
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths[0], 1);
        assert!(lengths[0] <= lengths[1]);
        assert!(lengths[0] <= lengths[2]);
        assert!(lengths[0] <= lengths[3]);
        assert_eq!(kraft_sum(&lengths), 1.0);
    }

    #[test]
    fn test_compute_code_lengths_single_symbol() {
        let lengths = compute_code_lengths(&[0, 0, 7, 0], 15);
        assert_eq!(lengths, vec![0, 0, 1, 0]);
        assert!(compute_code_lengths(&[0, 0], 15).iter().all(|&l| l == 0));
    }

    #[test]
    fn test_compute_code_lengths_is_deterministic_on_ties() {
        let freqs = [5u32, 5, 5, 5, 5, 5];
        let a = compute_code_lengths(&freqs, 15);
        let b = compute_code_lengths(&freqs, 15);
        assert_eq!(a, b);
        // Lower symbols merge first and end up deeper
        assert_eq!(a, vec![3, 3, 3, 3, 2, 2]);
    }

    #[test]
    fn test_compute_code_lengths_respects_limit() {
        // Fibonacci weights produce a maximally skewed tree (depth = n - 1)
        let mut freqs = vec![1u32, 1];
        while freqs.len() < 30 {
            let n = freqs.len();
            freqs.push(freqs[n - 1] + freqs[n - 2]);
        }
        let lengths = compute_code_lengths(&freqs, 15);
        assert!(lengths.iter().all(|&l| (1..=15).contains(&l)));
        assert_eq!(kraft_sum(&lengths), 1.0);

        let lengths = compute_code_lengths(&freqs[..19], 7);
        assert!(lengths.iter().all(|&l| (1..=7).contains(&l)));
        assert_eq!(kraft_sum(&lengths), 1.0);
    }

    #[test]
    fn test_ensure_two_codes() {
        let mut lengths = vec![0u8];
        ensure_two_codes(&mut lengths);
        assert_eq!(lengths, vec![1, 1]);

        let mut lengths = vec![0u8, 0, 1, 0];
        ensure_two_codes(&mut lengths);
        assert_eq!(lengths, vec![1, 0, 1, 0]);

        let mut lengths = vec![2u8, 2, 1];
        ensure_two_codes(&mut lengths);
        assert_eq!(lengths, vec![2, 2, 1]);
    }

    #[test]
    fn test_canonical_codes_rfc_example() {
        // RFC 1951 section 3.2.2: lengths (3, 3, 3, 3, 3, 2, 4, 4)
        let table = HuffmanTable::from_lengths(&[3, 3, 3, 3, 3, 2, 4, 4]);
        assert_eq!(table.code(0), (0b010, 3));
        assert_eq!(table.code(4), (0b110, 3));
        assert_eq!(table.code(5), (0b00, 2));
        assert_eq!(table.code(6), (0b1110, 4));
        assert_eq!(table.code(7), (0b1111, 4));
        assert_prefix_free(&table);
    }

    #[test]
    fn test_built_table_is_prefix_free() {
        let freqs: Vec<u32> = (0..286u32).map(|i| (i * 7919) % 101).collect();
        let lengths = compute_code_lengths(&freqs, 15);
        assert!(lengths.iter().all(|&l| l <= 15));
        assert_eq!(kraft_sum(&lengths), 1.0);
        assert_prefix_free(&HuffmanTable::from_lengths(&lengths));
    }

    #[test]
    fn test_write_symbol() {
        let table = HuffmanTable::from_lengths(&[1, 2, 2]);
        let mut writer = BitWriter::new();
        table.write_symbol(&mut writer, 2); // code 11
        table.write_symbol(&mut writer, 1); // code 10, MSB reaches the stream first
        table.write_symbol(&mut writer, 0); // code 0
        assert_eq!(writer.finish(), vec![0b0_01_11]);
    }
}
