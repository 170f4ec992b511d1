use std::io::{self, BufWriter, Read, Write};

use super::stream::DeflateEncoder;
use crate::error::{Error, Result};
use crate::{CompressStats, Compressor, DeflateConfig, Termination};

/// Compresses inputs one after another on the calling thread
pub struct SingleStreamCompressor {
    config: DeflateConfig,
}

impl SingleStreamCompressor {
    pub fn new(config: DeflateConfig) -> Self {
        Self { config }
    }
}

impl Compressor for SingleStreamCompressor {
    fn compress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressStats> {
        let mut writer = BufWriter::with_capacity(self.config.buffer_size.max(1), output);
        compress_stream(input, &mut writer, &self.config, self.config.termination)
    }

    fn compress_all<R: Read + Send, W: Write>(
        &mut self,
        inputs: Vec<R>,
        output: W,
    ) -> Result<CompressStats> {
        let mut writer = BufWriter::with_capacity(self.config.buffer_size.max(1), output);
        if inputs.is_empty() {
            return compress_stream(io::empty(), &mut writer, &self.config, self.config.termination);
        }

        let last = inputs.len() - 1;
        let mut stats = CompressStats::default();
        for (index, input) in inputs.into_iter().enumerate() {
            let termination = termination_for(index, last, self.config.termination);
            let stream_stats = compress_stream(input, &mut writer, &self.config, termination)?;
            stats.merge(&stream_stats);
        }
        Ok(stats)
    }
}

/// Termination for stream `index` of `0..=last`: only the last may finish
pub(crate) fn termination_for(index: usize, last: usize, requested: Termination) -> Termination {
    if index == last {
        requested
    } else {
        Termination::Appendable
    }
}

/// Pull `input` in `buffer_size` chunks through one stream and end it with `termination`
pub(crate) fn compress_stream<R: Read, W: Write>(
    mut input: R,
    sink: W,
    config: &DeflateConfig,
    termination: Termination,
) -> Result<CompressStats> {
    let mut encoder = DeflateEncoder::new(sink, config)?;
    let mut buffer = vec![0u8; config.buffer_size.max(1)];

    loop {
        let n = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::InputRead(e)),
        };
        encoder.write_data(&buffer[..n])?;
    }

    encoder.terminate(termination)?;
    Ok(encoder.stats().clone())
}
