use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use riscv_annotate::{inputs_from_args, Annotator};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Annotate RISC-V disassembly with resolved load-address targets"
)]
struct Opts {
    /// Input listings; reads standard input when none are given
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // One annotator across all inputs: line numbers and facts run through
    // the concatenated stream.
    let mut annotator = Annotator::new();
    for input in inputs_from_args(&opts.inputs) {
        let mut reader = input.open()?;
        annotator.annotate(&mut reader, &mut out)?;
    }
    out.flush()?;

    Ok(())
}
