use super::tables::{MAX_DISTANCE, MAX_MATCH, MIN_MATCH};

/// A single entry of the symbol stream produced by the matcher
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// A literal byte
    Literal(u8),
    /// A back-reference: copy `length` bytes from `distance` bytes back
    Match { length: u16, distance: u16 },
}

impl Symbol {
    /// Build a match, checking the DEFLATE length and distance bounds in debug builds
    #[inline]
    pub fn new_match(length: usize, distance: usize) -> Self {
        debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&length));
        debug_assert!((1..=MAX_DISTANCE).contains(&distance));
        Symbol::Match { length: length as u16, distance: distance as u16 }
    }

    /// Returns the uncompressed size this symbol represents
    #[inline]
    pub fn uncompressed_size(&self) -> usize {
        match self {
            Symbol::Literal(_) => 1,
            Symbol::Match { length, .. } => *length as usize,
        }
    }
}

/// Symbols for one pending block plus the raw bytes they cover
///
/// The raw bytes are kept so the block can fall back to stored encoding.
#[derive(Clone, Debug, Default)]
pub struct SymbolBlock {
    symbols: Vec<Symbol>,
    raw: Vec<u8>,
}

impl SymbolBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self { symbols: Vec::with_capacity(bytes / 2), raw: Vec::with_capacity(bytes) }
    }

    /// Append a symbol and the input bytes it stands for
    pub fn push(&mut self, symbol: Symbol, bytes: &[u8]) {
        debug_assert_eq!(symbol.uncompressed_size(), bytes.len());
        self.symbols.push(symbol);
        self.raw.extend_from_slice(bytes);
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Raw input covered by this block
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Number of input bytes covered by this block
    pub fn input_len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.raw.clear();
    }
}
