//! OpenFXC IR Command Line
//!
//! Thin driver over the lowering and optimization pipelines. Reads JSON
//! from a file or stdin, writes the resulting IR module to stdout.
//!
//! ## Usage
//!
//! ```bash
//! # Lower a semantic-model document
//! openfxc-ir lower --input model.json --profile ps_2_0 --entry main
//!
//! # Optimize an IR module with the default pass sequence
//! openfxc-ir optimize --input module.json
//!
//! # Run selected passes only
//! openfxc-ir optimize --passes constfold,dce < module.json
//! ```
//!
//! Exit code 0 means the pipeline completed (diagnostics, including
//! Errors, are carried inside the module); 1 means the input could not
//! be read or parsed.

use anyhow::Context;
use clap::{Parser, Subcommand};
use openfxc_ir::{pipeline, LowerRequest, OptimizeOptions};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openfxc-ir", version, about = "Shader IR lowering and optimization")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lower a semantic-model document to an IR module
    Lower {
        /// Profile tag overriding the document's own
        #[arg(long)]
        profile: Option<String>,
        /// Entry point name, matched case-insensitively
        #[arg(long)]
        entry: Option<String>,
        /// Input path; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run optimization passes over an IR module
    Optimize {
        /// Comma-separated pass list (default: constfold, algebraic,
        /// copyprop, cse, dce, component-dce)
        #[arg(long)]
        passes: Option<String>,
        /// Profile tag replacing the module's own
        #[arg(long)]
        profile: Option<String>,
        /// Input path; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open input '{}'", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout().lock();
    match cli.command {
        Command::Lower {
            profile,
            entry,
            input,
        } => {
            let reader = open_input(input.as_ref())?;
            let semantic = pipeline::read_semantic(reader).context("reading semantic model")?;
            let module = pipeline::lower(&LowerRequest {
                semantic,
                profile,
                entry,
            });
            pipeline::write_module(&module, stdout)?;
        }
        Command::Optimize {
            passes,
            profile,
            input,
        } => {
            let reader = open_input(input.as_ref())?;
            let module = pipeline::read_module(reader).context("reading IR module")?;
            let module = pipeline::optimize(module, &OptimizeOptions { passes, profile });
            pipeline::write_module(&module, stdout)?;
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
