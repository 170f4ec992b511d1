use std::io::Write;

/// Bit-level writer for DEFLATE output
///
/// Writes bits LSB-first to match DEFLATE format. Completed bytes collect in an
/// internal sink that the owner drains to the real output between blocks.
pub struct BitWriter {
    /// Completed output bytes not yet drained
    output: Vec<u8>,
    /// Current byte being built
    current_byte: u8,
    /// Bits written to current byte (0-7)
    bits_in_byte: u8,
    /// Total bytes ever completed (drained or not)
    bytes_completed: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(65536)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            current_byte: 0,
            bits_in_byte: 0,
            bytes_completed: 0,
        }
    }

    /// Write the low `n` bits (0-32) of `value` in LSB-first order
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);

        let mut val = value;
        let mut remaining = n;

        while remaining > 0 {
            let space = 8 - self.bits_in_byte;
            let to_write = remaining.min(space);

            let mask = (1u32 << to_write) - 1;
            self.current_byte |= ((val & mask) as u8) << self.bits_in_byte;

            val >>= to_write;
            self.bits_in_byte += to_write;
            remaining -= to_write;

            if self.bits_in_byte == 8 {
                self.push_completed(self.current_byte);
                self.current_byte = 0;
                self.bits_in_byte = 0;
            }
        }
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Write a Huffman code of `length` bits whose MSB must reach the stream first
    pub fn write_bits_reversed(&mut self, code: u32, length: u8) {
        self.write_bits(reverse_bits(code, length), length);
    }

    /// Pad to byte boundary with zero bits
    pub fn align_to_byte(&mut self) {
        if self.bits_in_byte > 0 {
            self.push_completed(self.current_byte);
            self.current_byte = 0;
            self.bits_in_byte = 0;
        }
    }

    /// Write a 16-bit value in little-endian
    pub fn write_u16_le(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write raw bytes; copied straight through when byte-aligned
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_byte == 0 {
            self.output.extend_from_slice(bytes);
            self.bytes_completed += bytes.len() as u64;
        } else {
            for &b in bytes {
                self.write_bits(b as u32, 8);
            }
        }
    }

    /// Bits currently held in the partial byte (0-7)
    #[inline]
    pub fn pending_bits(&self) -> u8 {
        self.bits_in_byte
    }

    /// Whether the writer sits on a byte boundary
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.bits_in_byte == 0
    }

    /// Total bits emitted so far, including the partial byte
    pub fn bit_position(&self) -> u64 {
        self.bytes_completed * 8 + self.bits_in_byte as u64
    }

    /// Completed bytes not yet drained
    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Move completed bytes to `sink`, keeping the partial byte. Returns bytes written.
    pub fn drain_to<W: Write>(&mut self, sink: &mut W) -> std::io::Result<usize> {
        let n = self.output.len();
        if n > 0 {
            sink.write_all(&self.output)?;
            self.output.clear();
        }
        Ok(n)
    }

    /// Pad the final partial byte and return everything not yet drained
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }

    #[inline]
    fn push_completed(&mut self, byte: u8) {
        self.output.push(byte);
        self.bytes_completed += 1;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the bottom `n` bits of `value`
pub fn reverse_bits(value: u32, n: u8) -> u32 {
    if n == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - n as u32)
}
