use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use aq_cli::Interpreter;
use clap::Parser;

#[derive(Parser)]
#[command(name = "aq-cli")]
#[command(about = "Water-distribution network script interpreter", long_about = None)]
struct Cli {
    /// Path to the command script
    script: PathBuf,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let script = fs::read_to_string(&cli.script)?;

    let mut interpreter = Interpreter::new();
    match &cli.output {
        Some(path) => {
            let mut file = io::BufWriter::new(fs::File::create(path)?);
            interpreter.run(&script, &mut file)?;
            file.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            interpreter.run(&script, &mut lock)?;
        }
    }
    Ok(())
}
