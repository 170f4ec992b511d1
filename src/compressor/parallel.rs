//! Parallel compression of independent inputs.
//!
//! Architecture:
//! - Dispatcher thread: hands each input to the worker pool, tagged with its index
//! - Worker pool: compress whole inputs into memory, one stream each
//! - Calling thread: receives finished streams, writes them out in input order

use std::collections::BTreeMap;
use std::io::{BufWriter, Read, Write};

use crossbeam::channel::{bounded, Receiver, Sender};

use super::single::{compress_stream, termination_for, SingleStreamCompressor};
use crate::error::{Error, Result};
use crate::{CompressStats, Compressor, DeflateConfig, Termination};

/// One input to compress
struct StreamJob<R> {
    /// Position in the output
    stream_id: usize,
    input: R,
    termination: Termination,
}

/// One compressed stream
struct EncodedStream {
    stream_id: usize,
    data: Vec<u8>,
    stats: CompressStats,
}

/// Compresses multiple inputs on worker threads
pub struct ParallelCompressor {
    config: DeflateConfig,
}

impl ParallelCompressor {
    pub fn new(config: DeflateConfig) -> Self {
        Self { config }
    }

    fn effective_threads(&self) -> usize {
        match self.config.num_threads {
            0 => num_cpus::get().clamp(1, 32),
            n => n.clamp(1, 32),
        }
    }
}

impl Compressor for ParallelCompressor {
    /// A single stream has no parallelism to exploit
    fn compress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressStats> {
        SingleStreamCompressor::new(self.config.clone()).compress(input, output)
    }

    fn compress_all<R: Read + Send, W: Write>(
        &mut self,
        inputs: Vec<R>,
        output: W,
    ) -> Result<CompressStats> {
        let num_threads = self.effective_threads().min(inputs.len());
        if num_threads <= 1 {
            return SingleStreamCompressor::new(self.config.clone()).compress_all(inputs, output);
        }

        self.config.validate()?;
        self.compress_parallel(inputs, output, num_threads)
    }
}

impl ParallelCompressor {
    fn compress_parallel<R: Read + Send, W: Write>(
        &self,
        inputs: Vec<R>,
        output: W,
        num_threads: usize,
    ) -> Result<CompressStats> {
        let channel_capacity = num_threads * 2;
        let (job_tx, job_rx): (Sender<StreamJob<R>>, Receiver<StreamJob<R>>) =
            bounded(channel_capacity);
        let (result_tx, result_rx): (Sender<Result<EncodedStream>>, Receiver<Result<EncodedStream>>) =
            bounded(channel_capacity);

        let config = &self.config;
        let total = inputs.len();

        let result = crossbeam::scope(|scope| {
            for _ in 0..num_threads {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| worker_thread(job_rx, result_tx, config));
            }
            drop(job_rx);
            drop(result_tx);

            scope.spawn(move |_| {
                let last = total - 1;
                for (stream_id, input) in inputs.into_iter().enumerate() {
                    let termination = termination_for(stream_id, last, config.termination);
                    // Workers are gone once the receiver side bails out
                    if job_tx.send(StreamJob { stream_id, input, termination }).is_err() {
                        break;
                    }
                }
            });

            write_in_order(output, result_rx, total, config.buffer_size)
        });

        result.map_err(|_| Error::Internal("Thread panicked".to_string()))?
    }
}

/// Receive encoded streams and write them in `stream_id` order.
///
/// Dropping `result_rx` on error disconnects the workers so the scope can join.
fn write_in_order<W: Write>(
    output: W,
    result_rx: Receiver<Result<EncodedStream>>,
    total: usize,
    buffer_size: usize,
) -> Result<CompressStats> {
    let mut writer = BufWriter::with_capacity(buffer_size.max(1), output);
    let mut pending: BTreeMap<usize, EncodedStream> = BTreeMap::new();
    let mut next_write_id = 0;
    let mut stats = CompressStats::default();

    while next_write_id < total {
        let encoded = match result_rx.recv() {
            Ok(result) => result?,
            Err(_) => return Err(Error::Internal("Result channel disconnected".to_string())),
        };
        pending.insert(encoded.stream_id, encoded);

        while let Some(ready) = pending.remove(&next_write_id) {
            writer.write_all(&ready.data).map_err(Error::OutputWrite)?;
            stats.merge(&ready.stats);
            next_write_id += 1;
        }
    }

    writer.flush().map_err(Error::OutputWrite)?;
    Ok(stats)
}

/// Worker thread function: compresses whole inputs into memory
fn worker_thread<R: Read>(
    job_rx: Receiver<StreamJob<R>>,
    result_tx: Sender<Result<EncodedStream>>,
    config: &DeflateConfig,
) {
    for job in job_rx {
        let mut data = Vec::new();
        let result = compress_stream(job.input, &mut data, config, job.termination)
            .map(|stats| EncodedStream { stream_id: job.stream_id, data, stats });

        if result_tx.send(result).is_err() {
            break;
        }
    }
}
