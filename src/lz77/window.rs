use crate::deflate::tables::MAX_DISTANCE;

/// Input buffer holding the last 32KB of history plus unconsumed lookahead
///
/// Positions are absolute stream offsets. Stale history is dropped in bulk
/// once a full window of it has built up, so between pushes the buffer holds
/// under two windows (64 KiB) of history plus the unconsumed lookahead. After a
/// push it also holds the pushed bytes; the encoder caps those at 64 KiB.
pub struct SlidingWindow {
    buffer: Vec<u8>,
    /// Absolute position of `buffer[0]`
    base: usize,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self { buffer: Vec::with_capacity(2 * MAX_DISTANCE), base: 0 }
    }

    /// Append input bytes at the end of the window
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Drop history that can no longer be referenced from `cursor`
    pub fn slide(&mut self, cursor: usize) {
        let keep_from = cursor.saturating_sub(MAX_DISTANCE);
        if keep_from >= self.base + MAX_DISTANCE {
            self.buffer.drain(..keep_from - self.base);
            self.base = keep_from;
        }
    }

    /// Absolute position one past the last byte pushed
    #[inline]
    pub fn end(&self) -> usize {
        self.base + self.buffer.len()
    }

    /// Oldest absolute position still held
    #[inline]
    pub fn start(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn byte(&self, pos: usize) -> u8 {
        self.buffer[pos - self.base]
    }

    /// Bytes in `[from, to)`
    #[inline]
    pub fn slice(&self, from: usize, to: usize) -> &[u8] {
        &self.buffer[from - self.base..to - self.base]
    }

    /// Length of the common prefix of the strings at `candidate` and `pos`, up to `max_len`.
    ///
    /// The strings may overlap (`candidate + len > pos`), which is how a match
    /// encodes a run.
    #[inline]
    pub fn match_length(&self, candidate: usize, pos: usize, max_len: usize) -> usize {
        debug_assert!(candidate < pos && pos + max_len <= self.end());
        let a = &self.buffer[candidate - self.base..];
        let b = &self.buffer[pos - self.base..pos - self.base + max_len];
        a.iter().zip(b).take_while(|(x, y)| x == y).count()
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_basic() {
        let mut window = SlidingWindow::new();
        window.push_bytes(b"ABC");

        assert_eq!(window.end(), 3);
        assert_eq!(window.byte(0), b'A');
        assert_eq!(window.byte(2), b'C');
        assert_eq!(window.slice(1, 3), b"BC");
    }

    #[test]
    fn test_match_length_overlapping_run() {
        let mut window = SlidingWindow::new();
        window.push_bytes(b"ABABABABX");

        // Distance 2 copy running into its own output
        assert_eq!(window.match_length(0, 2, 7), 6);
        assert_eq!(window.match_length(0, 2, 3), 3);
        assert_eq!(window.match_length(1, 2, 3), 0);
    }

    #[test]
    fn test_slide_keeps_full_window() {
        let mut window = SlidingWindow::new();
        let data: Vec<u8> = (0..100_000u32).map(|i| (i & 0xFF) as u8).collect();
        window.push_bytes(&data);

        window.slide(40_000); // not enough stale history to bother yet
        assert_eq!(window.start(), 0);

        window.slide(70_000);
        assert_eq!(window.start(), 70_000 - MAX_DISTANCE);
        assert_eq!(window.end(), 100_000);
        assert_eq!(window.byte(70_000 - MAX_DISTANCE), ((70_000 - MAX_DISTANCE) & 0xFF) as u8);
        assert_eq!(window.byte(99_999), (99_999 & 0xFF) as u8);
    }
}
