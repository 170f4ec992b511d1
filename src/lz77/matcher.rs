//! Hash-chain LZ77 match finder.
//!
//! Every consumed position is linked into a chain of earlier positions that
//! share its 3-byte prefix hash. `head[hash]` holds the newest position for a
//! hash and `prev[pos % 32768]` the one before it, so the structure is two flat
//! arrays of absolute positions. Links that fall outside the window are left in
//! place and simply not followed.

use super::window::SlidingWindow;
use crate::deflate::tables::{MAX_DISTANCE, MAX_MATCH, MIN_MATCH};
use crate::deflate::tokens::Symbol;
use crate::{CompressionLevel, MemoryLevel};

/// Empty chain link
const NIL: usize = usize::MAX;

const WINDOW_MASK: usize = MAX_DISTANCE - 1;

/// Lookahead needed before a position is matched without a flush: the
/// longest match plus one extra position for lazy evaluation
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Minimum-length matches further back than this cost more than three literals
const TOO_FAR: usize = 4096;

/// Search effort for one compression level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchParams {
    /// Chain entries visited per search (0 = no matching at all)
    pub max_chain: usize,
    /// Stop searching once a match this long is found
    pub nice_length: usize,
    /// Try the next position before committing to a match
    pub lazy: bool,
    /// Only matches shorter than this are second-guessed by lazy evaluation
    pub max_lazy: usize,
}

impl MatchParams {
    pub fn for_level(level: CompressionLevel) -> Self {
        let (max_chain, nice_length, lazy, max_lazy) = match level.level() {
            0 => (0, 0, false, 0),
            1 => (4, 8, false, 0),
            2 => (8, 16, false, 0),
            3 => (32, 32, false, 0),
            4 => (16, 16, true, 4),
            5 => (32, 32, true, 16),
            6 => (128, 128, true, 16),
            7 => (256, 128, true, 32),
            8 => (1024, MAX_MATCH, true, 128),
            _ => (4096, MAX_MATCH, true, MAX_MATCH),
        };
        Self { max_chain, nice_length, lazy, max_lazy }
    }

    /// Whether matching is disabled (store-only)
    pub fn is_store_only(&self) -> bool {
        self.max_chain == 0
    }
}

/// LZ77 matcher over a sliding window with hash chains
pub struct Lz77Matcher {
    window: SlidingWindow,
    /// Hash table: maps hash -> most recent position
    head: Vec<usize>,
    /// Chain links: prev[pos % window] -> previous position with same hash
    prev: Vec<usize>,
    hash_bits: u32,
    params: MatchParams,
    /// Next position to turn into a symbol
    pos: usize,
    /// Next position to link into the hash chains
    inserted: usize,
}

impl Lz77Matcher {
    pub fn new(params: MatchParams, memory_level: MemoryLevel) -> Self {
        let hash_bits = memory_level.hash_bits();
        let (head, prev) = if params.is_store_only() {
            (Vec::new(), Vec::new())
        } else {
            (vec![NIL; 1 << hash_bits], vec![NIL; MAX_DISTANCE])
        };
        Self { window: SlidingWindow::new(), head, prev, hash_bits, params, pos: 0, inserted: 0 }
    }

    pub fn params(&self) -> MatchParams {
        self.params
    }

    /// Append input; history no longer reachable from the cursor is released first
    pub fn push_input(&mut self, data: &[u8]) {
        self.window.slide(self.pos.min(self.inserted));
        self.window.push_bytes(data);
    }

    /// Bytes pushed but not yet turned into symbols
    pub fn lookahead(&self) -> usize {
        self.window.end() - self.pos
    }

    /// Total input consumed into symbols
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Produce the next symbol and the input bytes it covers.
    ///
    /// Without `flush`, stops while fewer than [`MIN_LOOKAHEAD`] bytes are
    /// buffered, so the choice at each position never depends on where the
    /// input was split. With `flush`, drains everything.
    pub fn next_symbol(&mut self, flush: bool) -> Option<(Symbol, &[u8])> {
        let lookahead = self.lookahead();
        if lookahead == 0 || (!flush && lookahead < MIN_LOOKAHEAD) {
            return None;
        }

        let start = self.pos;
        let symbol = if self.params.is_store_only() {
            Symbol::Literal(self.window.byte(start))
        } else {
            self.choose_symbol(lookahead)
        };

        self.pos += symbol.uncompressed_size();
        if !self.params.is_store_only() {
            self.insert_up_to(self.pos);
        }
        Some((symbol, self.window.slice(start, self.pos)))
    }

    fn choose_symbol(&mut self, lookahead: usize) -> Symbol {
        let pos = self.pos;
        let literal = Symbol::Literal(self.window.byte(pos));
        self.insert_up_to(pos);

        let Some((length, distance)) = self.longest_match(pos, lookahead.min(MAX_MATCH)) else {
            return literal;
        };

        if self.params.lazy && length < self.params.max_lazy && lookahead > length {
            self.insert_up_to(pos + 1);
            let next_max = (lookahead - 1).min(MAX_MATCH);
            if let Some((next_length, _)) = self.longest_match(pos + 1, next_max) {
                if next_length > length {
                    return literal;
                }
            }
        }

        Symbol::new_match(length, distance)
    }

    /// Longest match for the string at `pos`, at most `max_len` bytes.
    ///
    /// Walks the hash chain newest-first, so among equal lengths the smallest
    /// distance wins. Returns `(length, distance)`.
    fn longest_match(&self, pos: usize, max_len: usize) -> Option<(usize, usize)> {
        if max_len < MIN_MATCH {
            return None;
        }

        let limit = pos.saturating_sub(MAX_DISTANCE);
        let mut candidate = self.head[self.hash_at(pos)];
        let mut chain_remaining = self.params.max_chain;
        let mut best_length = MIN_MATCH - 1;
        let mut best_distance = 0;

        while candidate != NIL && candidate < pos && candidate >= limit && chain_remaining > 0 {
            let length = self.window.match_length(candidate, pos, max_len);
            if length > best_length {
                best_length = length;
                best_distance = pos - candidate;
                if length >= self.params.nice_length || length == max_len {
                    break;
                }
            }

            // Links only ever point backwards; anything else is a recycled slot
            let next = self.prev[candidate & WINDOW_MASK];
            if next >= candidate {
                break;
            }
            candidate = next;
            chain_remaining -= 1;
        }

        if best_length < MIN_MATCH || (best_length == MIN_MATCH && best_distance > TOO_FAR) {
            return None;
        }
        Some((best_length, best_distance))
    }

    /// Link every position before `target` that has a full 3-byte prefix
    fn insert_up_to(&mut self, target: usize) {
        let end = self.window.end();
        while self.inserted < target && self.inserted + MIN_MATCH <= end {
            let pos = self.inserted;
            let hash = self.hash_at(pos);
            self.prev[pos & WINDOW_MASK] = self.head[hash];
            self.head[hash] = pos;
            self.inserted += 1;
        }
    }

    #[inline]
    fn hash_at(&self, pos: usize) -> usize {
        let value = u32::from(self.window.byte(pos))
            | u32::from(self.window.byte(pos + 1)) << 8
            | u32::from(self.window.byte(pos + 2)) << 16;
        (value.wrapping_mul(0x9E37_79B1) >> (32 - self.hash_bits)) as usize
    }
}
