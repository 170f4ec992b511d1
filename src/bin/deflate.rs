use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use deflate_stream::{
    CompressStats, CompressionLevel, Compressor, DeflateConfig, MemoryLevel, ParallelCompressor,
    SingleStreamCompressor, Termination,
};

#[derive(Parser, Debug)]
#[command(name = "deflate")]
#[command(about = "Compress files to a raw DEFLATE stream")]
#[command(version)]
struct Args {
    /// Input files, compressed as consecutive streams into one output (none or - for stdin)
    files: Vec<PathBuf>,

    /// Output file (use - for stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write to stdout
    #[arg(short = 'c', long = "stdout")]
    to_stdout: bool,

    /// Suffix for derived output names (also appended to -o)
    #[arg(short = 'S', long)]
    suffix: Option<String>,

    /// Overwrite an existing output file
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    level_flags: LevelFlags,

    /// Compression level (0 = store only, 9 = best)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9),
          conflicts_with_all = ["fast", "best", "level_flags"])]
    level: Option<u8>,

    /// Compress faster (level 1)
    #[arg(long, conflicts_with_all = ["best", "level_flags"])]
    fast: bool,

    /// Compress better (level 9)
    #[arg(long, conflicts_with = "level_flags")]
    best: bool,

    /// Use less memory (memory level 1)
    #[arg(short, long, conflicts_with = "mem_level")]
    small: bool,

    /// Memory level for the match finder hash table (1-9)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=9))]
    mem_level: Option<u8>,

    /// End on a sync-flush boundary so more streams can be appended (default)
    #[arg(short = 'A', long, conflicts_with = "ended")]
    appendable: bool,

    /// Mark the last block final
    #[arg(short = 'E', long)]
    ended: bool,

    /// Uncompressed block size in KiB
    #[arg(short = 'b', long = "blocksize", default_value = "128")]
    block_kib: usize,

    /// Number of threads for multiple inputs (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,

    /// Suppress all messages, including errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show options and statistics
    #[arg(short, long)]
    verbose: bool,
}

/// `-0` through `-9`; at most one may be given
#[derive(clap::Args, Debug)]
#[group(id = "level_flags", multiple = false)]
struct LevelFlags {
    /// Store only, no compression
    #[arg(short = '0')]
    store: bool,

    /// Compress faster; -2 to -8 pick the levels in between
    #[arg(short = '1')]
    level_1: bool,

    #[arg(short = '2', hide = true)]
    level_2: bool,

    #[arg(short = '3', hide = true)]
    level_3: bool,

    #[arg(short = '4', hide = true)]
    level_4: bool,

    #[arg(short = '5', hide = true)]
    level_5: bool,

    #[arg(short = '6', hide = true)]
    level_6: bool,

    #[arg(short = '7', hide = true)]
    level_7: bool,

    #[arg(short = '8', hide = true)]
    level_8: bool,

    /// Compress better (default)
    #[arg(short = '9')]
    level_9: bool,
}

impl LevelFlags {
    fn selected(&self) -> Option<u8> {
        [
            self.store,
            self.level_1,
            self.level_2,
            self.level_3,
            self.level_4,
            self.level_5,
            self.level_6,
            self.level_7,
            self.level_8,
            self.level_9,
        ]
        .iter()
        .position(|&set| set)
        .map(|level| level as u8)
    }
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

const DEFAULT_SUFFIX: &str = ".deflate";

/// Where compressed output goes
#[derive(Debug, PartialEq, Eq)]
enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl Args {
    fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else if self.verbose {
            2
        } else {
            1
        }
    }

    fn compression_level(&self) -> deflate_stream::Result<CompressionLevel> {
        match (self.level.or(self.level_flags.selected()), self.fast) {
            (Some(level), _) => CompressionLevel::try_from(level),
            (None, true) => Ok(CompressionLevel::FASTEST),
            (None, false) => Ok(CompressionLevel::BEST),
        }
    }

    fn memory_level(&self) -> deflate_stream::Result<MemoryLevel> {
        match (self.mem_level, self.small) {
            (Some(level), _) => MemoryLevel::try_from(level),
            (None, true) => Ok(MemoryLevel::MIN),
            (None, false) => Ok(MemoryLevel::default()),
        }
    }

    fn termination(&self) -> Termination {
        if self.ended {
            Termination::Finish
        } else {
            Termination::Appendable
        }
    }

    fn config(&self) -> deflate_stream::Result<DeflateConfig> {
        let config = DeflateConfig {
            compression_level: self.compression_level()?,
            memory_level: self.memory_level()?,
            block_size: self.block_kib.saturating_mul(1024),
            termination: self.termination(),
            num_threads: self.threads,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Named input files; empty when reading stdin
    fn named_inputs(&self) -> Vec<&Path> {
        self.files.iter().map(PathBuf::as_path).filter(|p| !is_dash(p)).collect()
    }

    fn output_target(&self, stdout_is_terminal: bool) -> OutputTarget {
        let suffix = self.suffix.as_deref();
        if let Some(path) = &self.output {
            return if is_dash(path) {
                OutputTarget::Stdout
            } else {
                OutputTarget::File(match suffix {
                    Some(suffix) => append_suffix(path, suffix),
                    None => path.clone(),
                })
            };
        }

        let first_named = self.named_inputs().first().copied();
        match first_named {
            Some(input) if !self.to_stdout && stdout_is_terminal => {
                OutputTarget::File(append_suffix(input, suffix.unwrap_or(DEFAULT_SUFFIX)))
            }
            _ => OutputTarget::Stdout,
        }
    }
}

fn is_dash(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            if args.verbosity() > 0 {
                eprintln!("deflate: {}", e);
            }
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(args: &Args) -> Result<u8, Box<dyn std::error::Error>> {
    if args.verbosity() > 0 {
        eprintln!("deflate {}", env!("CARGO_PKG_VERSION"));
    }

    let config = args.config()?;
    let target = args.output_target(io::stdout().is_terminal());

    if let OutputTarget::File(path) = &target {
        if path.exists() && !args.force {
            if args.verbosity() > 0 {
                eprintln!("deflate: {} already exists -- use -f to overwrite", path.display());
            }
            return Ok(EXIT_FAILURE);
        }
    }

    // Open every input before touching the output
    let mut inputs: Vec<Box<dyn Read + Send>> = Vec::new();
    if args.files.is_empty() {
        inputs.push(Box::new(io::stdin()));
    }
    for path in &args.files {
        if is_dash(path) {
            inputs.push(Box::new(io::stdin()));
        } else {
            let file = File::open(path)
                .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
            inputs.push(Box::new(BufReader::new(file)));
        }
    }

    if args.verbosity() > 1 {
        eprintln!("Options:");
        eprintln!("  Level:            {}", config.compression_level.level());
        eprintln!("  Memory level:     {}", config.memory_level.level());
        eprintln!("  Block size:       {} KiB", config.block_size / 1024);
        eprintln!("  Termination:      {:?}", config.termination);
        eprintln!("  Threads:          {}", config.num_threads);
        match &target {
            OutputTarget::Stdout => eprintln!("  Output:           <stdout>"),
            OutputTarget::File(path) => eprintln!("  Output:           {}", path.display()),
        }
    }

    let output: Box<dyn Write> = match &target {
        OutputTarget::Stdout => Box::new(io::stdout().lock()),
        OutputTarget::File(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?,
        )),
    };

    let start = std::time::Instant::now();

    let stats = if config.num_threads == 1 {
        let mut compressor = SingleStreamCompressor::new(config);
        compressor.compress_all(inputs, output)?
    } else {
        let mut compressor = ParallelCompressor::new(config);
        compressor.compress_all(inputs, output)?
    };

    let elapsed = start.elapsed();

    if args.verbosity() > 1 {
        report(&stats, elapsed);
    }

    Ok(EXIT_SUCCESS)
}

fn report(stats: &CompressStats, elapsed: std::time::Duration) {
    eprintln!("Compression complete:");
    eprintln!("  Streams:          {}", stats.streams);
    eprintln!("  Input bytes:      {}", stats.input_bytes);
    eprintln!("  Output bytes:     {}", stats.output_bytes);
    eprintln!("  Ratio:            {:.3}", stats.ratio());
    eprintln!(
        "  Blocks:           {} ({} stored, {} fixed, {} dynamic)",
        stats.blocks_written, stats.stored_blocks, stats.fixed_blocks, stats.dynamic_blocks
    );
    eprintln!("  Time:             {:.2?}", elapsed);
    eprintln!(
        "  Throughput:       {:.1} MB/s",
        stats.input_bytes as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("deflate").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_derived_output_name() {
        let args = parse(&["data.txt"]);
        assert_eq!(args.output_target(true), OutputTarget::File(PathBuf::from("data.txt.deflate")));

        let args = parse(&["-S", ".z", "data.txt", "more.txt"]);
        assert_eq!(args.output_target(true), OutputTarget::File(PathBuf::from("data.txt.z")));
    }

    #[test]
    fn test_stdout_targets() {
        assert_eq!(parse(&[]).output_target(true), OutputTarget::Stdout);
        assert_eq!(parse(&["-"]).output_target(true), OutputTarget::Stdout);
        assert_eq!(parse(&["-c", "data.txt"]).output_target(true), OutputTarget::Stdout);
        assert_eq!(parse(&["data.txt"]).output_target(false), OutputTarget::Stdout);
        assert_eq!(parse(&["-o", "-", "data.txt"]).output_target(true), OutputTarget::Stdout);
    }

    #[test]
    fn test_explicit_output_wins_over_pipe() {
        let args = parse(&["-o", "out.bin", "data.txt"]);
        assert_eq!(args.output_target(false), OutputTarget::File(PathBuf::from("out.bin")));

        let args = parse(&["-o", "out", "-S", ".raw", "data.txt"]);
        assert_eq!(args.output_target(false), OutputTarget::File(PathBuf::from("out.raw")));
    }

    #[test]
    fn test_level_options() {
        assert_eq!(parse(&[]).compression_level().unwrap(), CompressionLevel::Level9);
        assert_eq!(parse(&["--fast"]).compression_level().unwrap(), CompressionLevel::Level1);
        assert_eq!(parse(&["--best"]).compression_level().unwrap(), CompressionLevel::Level9);
        assert_eq!(parse(&["--level", "4"]).compression_level().unwrap(), CompressionLevel::Level4);
        assert!(Args::try_parse_from(["deflate", "--level", "10"]).is_err());
        assert!(Args::try_parse_from(["deflate", "--fast", "--best"]).is_err());
    }

    #[test]
    fn test_digit_level_flags() {
        assert_eq!(parse(&["-0"]).compression_level().unwrap(), CompressionLevel::Level0);
        assert_eq!(parse(&["-1"]).compression_level().unwrap(), CompressionLevel::Level1);
        assert_eq!(parse(&["-6"]).compression_level().unwrap(), CompressionLevel::Level6);
        assert_eq!(parse(&["-9"]).compression_level().unwrap(), CompressionLevel::Level9);

        // Digits combine with other short flags
        let args = parse(&["-c0", "data.txt"]);
        assert!(args.to_stdout);
        assert_eq!(args.compression_level().unwrap(), CompressionLevel::Level0);

        assert!(Args::try_parse_from(["deflate", "-1", "-9"]).is_err());
        assert!(Args::try_parse_from(["deflate", "-0", "--best"]).is_err());
        assert!(Args::try_parse_from(["deflate", "-3", "--level", "3"]).is_err());
    }

    #[test]
    fn test_memory_and_termination_options() {
        assert_eq!(parse(&[]).memory_level().unwrap(), MemoryLevel::default());
        assert_eq!(parse(&["-s"]).memory_level().unwrap(), MemoryLevel::MIN);
        assert_eq!(parse(&["--mem-level", "3"]).memory_level().unwrap().level(), 3);
        assert_eq!(parse(&[]).termination(), Termination::Appendable);
        assert_eq!(parse(&["-A"]).termination(), Termination::Appendable);
        assert_eq!(parse(&["-E"]).termination(), Termination::Finish);
        assert!(Args::try_parse_from(["deflate", "-A", "-E"]).is_err());
    }

    #[test]
    fn test_block_size_option() {
        assert_eq!(parse(&["-b", "64"]).config().unwrap().block_size, 64 * 1024);
        assert!(parse(&["-b", "0"]).config().is_err());
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&[]).verbosity(), 1);
        assert_eq!(parse(&["-q"]).verbosity(), 0);
        assert_eq!(parse(&["-v"]).verbosity(), 2);
    }
}
