//! CLI tool to stream records from a file or stdin through a pipeline.
//!
//! Usage:
//!   recpipe input.txt --format json --stages parse
//!   recpipe input.txt --format csv --stages trim,parse -o output.txt
//!   cat input.txt | recpipe --stages upper
//!
//! Transformed records go to the output file or stdout; failures are
//! reported on stderr (parse failures at warn, stage failures at error)
//! and never stop the run.

use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use recpipe::{
    Failure, Format, OutcomeSink, Pipeline, PipelineConfig, Record, RunSummary, from_reader, run,
    stage_for_name,
};

#[derive(Parser)]
#[command(name = "recpipe", version, about = "Streaming record-transformation pipeline")]
struct Args {
    /// Input file (default: stdin)
    input: Option<PathBuf>,

    /// Record format
    #[arg(short, long, default_value = "text")]
    format: Format,

    /// Comma-separated stage names: parse, trim, upper, lower, reject-empty
    #[arg(short, long, value_delimiter = ',', default_value = "parse")]
    stages: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Sink that writes transformed records one per line.
///
/// Failures are not written here; the driver already reports them through
/// tracing, which this binary routes to stderr.
struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> OutcomeSink for WriterSink<W> {
    fn on_success(&mut self, record: Record) {
        if let Err(e) = writeln!(self.out, "{record}") {
            eprintln!("Error writing output: {e}");
            process::exit(1);
        }
    }

    fn on_failure(&mut self, _failure: Failure) {}
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // Build the pipeline from the named stage catalog
    let mut pipeline = Pipeline::new(PipelineConfig::new(args.format));
    for name in &args.stages {
        let stage = match stage_for_name(name) {
            Ok(stage) => stage,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = pipeline.add_stage(stage) {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }

    // Open the output before reading anything
    let out: Box<dyn Write> = match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && fs::create_dir_all(parent).is_err()
            {
                eprintln!("Error creating output directory for '{}'", path.display());
                process::exit(1);
            }
            match fs::File::create(path) {
                Ok(file) => Box::new(BufWriter::new(file)),
                Err(e) => {
                    eprintln!("Error creating output file '{}': {}", path.display(), e);
                    process::exit(1);
                }
            }
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut sink = WriterSink { out };

    // Stream records through the driver
    let result = match &args.input {
        Some(path) => match fs::File::open(path) {
            Ok(file) => run(&pipeline, from_reader(BufReader::new(file)), &mut sink),
            Err(e) => {
                eprintln!("Error reading input file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => run(&pipeline, from_reader(io::stdin().lock()), &mut sink),
    };

    let summary: RunSummary = match result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = sink.out.flush() {
        eprintln!("Error writing output: {e}");
        process::exit(1);
    }

    eprintln!(
        "Processed {} -> {} records ({} parse failures, {} stage failures)",
        summary.records_in, summary.succeeded, summary.parse_failures, summary.stage_failures
    );
}
