//! Morph command-line tool
//!
//! Synthesizes, compiles and checks generated classes from JSON type
//! descriptors. `morph compile` doubles as the external program of a
//! `CommandCompiler`, so it accepts the `-cp <path>` form that compiler
//! passes.

mod commands;

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "morph")]
#[command(about = "Runtime class synthesis toolchain", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Generator config file (morph.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the class source synthesized for a contract
    Synth {
        /// Contract descriptor (JSON)
        contract: PathBuf,
        /// Stub every method with a "not implemented" throw instead of delegating
        #[arg(long)]
        stub: bool,
    },

    /// Compile a class source file into a unit beside it
    Compile {
        /// Source file
        source: PathBuf,
        /// Directories of JSON type descriptors, path-separator delimited
        #[arg(short = 'c', long = "classpath")]
        classpath: Vec<OsString>,
    },

    /// Generate a proxy class for a contract and list its members
    Check {
        /// Contract descriptor (JSON)
        contract: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Synth { contract, stub } => {
            commands::synth::execute(&contract, stub, cli.config.as_deref())
        }
        Commands::Compile { source, classpath } => {
            commands::compile::execute(&source, &classpath, cli.config.as_deref())
        }
        Commands::Check { contract } => commands::check::execute(&contract, cli.config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Rewrite the single-dash `-cp` flag to `--classpath`.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-cp" { OsString::from("--classpath") } else { arg })
        .collect()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
