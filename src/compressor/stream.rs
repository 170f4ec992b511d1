//! Stream controller: one raw DEFLATE stream over an output sink.
//!
//! Input is fed to the LZ77 matcher as it arrives and symbols accumulate into
//! a pending block. A block is closed when it covers `block_size` input bytes,
//! or when a sync flush or finish is requested. Completed bytes go to the sink
//! after every block.

use std::io::{self, Write};

use crate::bits::BitWriter;
use crate::deflate::{BlockEncoder, SymbolBlock};
use crate::error::{Error, Result};
use crate::lz77::{Lz77Matcher, MatchParams};
use crate::{CompressStats, DeflateConfig, Termination};

/// Largest slice handed to the matcher at once. The window buffer then peaks
/// at 64 KiB of history, one slice, and under `MIN_LOOKAHEAD` unconsumed bytes.
const INPUT_SLICE: usize = 64 * 1024;

/// Lifecycle of a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// Accepting input
    Open,
    /// Writing a sync-flush boundary; returns to `Open`
    Flushing,
    /// Final block written; no more input accepted
    Finished,
    /// Writing to the sink failed; output is incomplete and nothing more is accepted
    Aborted,
}

/// Raw DEFLATE encoder writing to `W`
pub struct DeflateEncoder<W: Write> {
    sink: W,
    matcher: Lz77Matcher,
    block_encoder: BlockEncoder,
    pending: SymbolBlock,
    bits: BitWriter,
    block_size: usize,
    state: StreamState,
    stats: CompressStats,
}

impl<W: Write> DeflateEncoder<W> {
    /// Create a stream; the configuration is validated before any state is built
    pub fn new(sink: W, config: &DeflateConfig) -> Result<Self> {
        config.validate()?;

        let params = MatchParams::for_level(config.compression_level);
        Ok(Self {
            sink,
            matcher: Lz77Matcher::new(params, config.memory_level),
            block_encoder: BlockEncoder::new(config.compression_level.is_store_only()),
            pending: SymbolBlock::with_capacity(config.block_size.min(1 << 20)),
            bits: BitWriter::with_capacity(64 * 1024),
            block_size: config.block_size,
            state: StreamState::Open,
            stats: CompressStats { streams: 1, ..Default::default() },
        })
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn stats(&self) -> &CompressStats {
        &self.stats
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Return the sink. Unfinished streams are abandoned as-is.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Compress `data`. Output is produced only as blocks fill up.
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.stats.input_bytes += data.len() as u64;

        for slice in data.chunks(INPUT_SLICE) {
            self.matcher.push_input(slice);
            self.process(false)?;
        }
        Ok(())
    }

    /// Close the pending block and write an empty stored block, leaving the
    /// output byte-aligned and decodable up to here
    pub fn sync_flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = StreamState::Flushing;

        self.process(true)?;
        if !self.pending.is_empty() {
            self.emit_block(false)?;
        }
        self.block_encoder.write_sync_marker(&mut self.bits);
        self.drain()?;
        self.flush_sink()?;

        self.state = StreamState::Open;
        Ok(())
    }

    /// Write the final block and pad the last byte
    pub fn finish(&mut self) -> Result<()> {
        self.ensure_open()?;

        self.process(true)?;
        self.emit_block(true)?;
        self.bits.align_to_byte();
        self.drain()?;
        self.flush_sink()?;

        self.state = StreamState::Finished;
        Ok(())
    }

    /// End the stream the way `termination` asks
    pub fn terminate(&mut self, termination: Termination) -> Result<()> {
        match termination {
            Termination::Appendable => self.sync_flush(),
            Termination::Finish => self.finish(),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            StreamState::Finished => Err(Error::StreamFinished),
            StreamState::Aborted => Err(Error::StreamAborted),
            StreamState::Open | StreamState::Flushing => Ok(()),
        }
    }

    /// Move matcher output into the pending block, closing blocks as they fill
    fn process(&mut self, flush: bool) -> Result<()> {
        while let Some((symbol, bytes)) = self.matcher.next_symbol(flush) {
            self.pending.push(symbol, bytes);
            if self.pending.input_len() >= self.block_size {
                self.emit_block(false)?;
            }
        }
        Ok(())
    }

    fn emit_block(&mut self, is_final: bool) -> Result<()> {
        let block_type = self.block_encoder.encode(&mut self.bits, &self.pending, is_final);
        self.stats.record_block(block_type);
        self.pending.clear();
        self.drain()
    }

    /// Write completed bytes to the sink; any failure aborts the stream
    fn drain(&mut self) -> Result<()> {
        match self.bits.drain_to(&mut self.sink) {
            Ok(written) => {
                self.stats.output_bytes += written as u64;
                Ok(())
            }
            Err(e) => self.abort(e),
        }
    }

    fn flush_sink(&mut self) -> Result<()> {
        match self.sink.flush() {
            Ok(()) => Ok(()),
            Err(e) => self.abort(e),
        }
    }

    fn abort(&mut self, err: io::Error) -> Result<()> {
        self.state = StreamState::Aborted;
        Err(Error::OutputWrite(err))
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf)?;
        Ok(buf.len())
    }

    /// Performs a sync flush
    fn flush(&mut self) -> io::Result<()> {
        self.sync_flush()?;
        Ok(())
    }
}
