//! Ci Resolver
//!
//! Resolves a parsed Ci program: binds names, orders classes, folds
//! constants and attaches types with integer ranges.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use ci_resolver::feedback::{ErrorReport, ResolutionSummary};
use ci_resolver::{resolve, Program};

/// Ci semantic resolver
#[derive(Parser, Debug)]
#[command(name = "ci-resolve")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Ci semantic resolver - typed, constant-folded ASTs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a program and report the first error
    Check {
        /// Parsed program (.json)
        input: PathBuf,

        /// Emit a machine-readable report
        #[arg(long)]
        json: bool,
    },
    /// Resolve a program and write it back with types attached
    Dump {
        /// Parsed program (.json)
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Check { input, json } => check_file(input, *json),
        Commands::Dump { input, output } => dump_file(input, output.as_deref()),
    }
}

fn load_program(input: &Path) -> Result<Program> {
    let source = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let program = serde_json::from_str(&source).with_context(|| format!("parsing {}", input.display()))?;
    info!("loaded {}", input.display());
    Ok(program)
}

/// Check a program for errors without writing it back
fn check_file(input: &Path, json: bool) -> Result<()> {
    let mut program = load_program(input)?;

    match resolve(&mut program) {
        Ok(()) if json => println!("{}", ResolutionSummary::new(&program).to_json()),
        Ok(()) => println!("✅ No errors found"),
        Err(e) if json => {
            println!("{}", ErrorReport::from(&e).to_json());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
    Ok(())
}

fn dump_file(input: &Path, output: Option<&Path>) -> Result<()> {
    let mut program = load_program(input)?;
    if let Err(e) = resolve(&mut program) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let text = serde_json::to_string_pretty(&program).context("serializing resolved program")?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("  [✓] Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
