//! Simply language compiler CLI.
//!
//! Provides the `simplyc` binary with subcommands for listing and running
//! the bundled seed example programs (spec §8) through the full
//! type-check -> closure-convert -> codegen -> JIT pipeline.

mod demos;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Simply language compiler and JIT runner.
#[derive(Parser)]
#[command(name = "simplyc", about = "Simply language compiler and JIT runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the seed example programs bundled with this binary.
    List,
    /// Type-check, compile, and JIT-run one of the bundled seed programs.
    Run {
        /// Name of a seed program, e.g. fact_direct.
        name: String,

        /// Comma-separated Int arguments to main, e.g. "1,2,3".
        #[arg(short, long, default_value = "")]
        args: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List => {
            for (name, _) in demos::all() {
                println!("{name}");
            }
            ExitCode::from(0)
        }
        Commands::Run { name, args } => ExitCode::from(run(&name, &args)),
    }
}

fn parse_args(raw: &str) -> Result<Vec<i32>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|s| s.trim().parse::<i32>().map_err(|e| format!("invalid integer argument '{s}': {e}")))
        .collect()
}

/// Runs one seed program by name. Exit codes follow spec §7's error
/// domains: 0 success, 2 type-check failure, 3 verification failure, 1 any
/// other codegen/lookup error.
fn run(name: &str, raw_args: &str) -> u8 {
    let program = match demos::all().into_iter().find(|(n, _)| *n == name) {
        Some((_, p)) => p,
        None => {
            eprintln!("Error: unknown seed program '{name}'");
            return 1;
        }
    };

    let args = match parse_args(raw_args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    tracing::info!(program = name, ?args, "running seed program");

    match simply_codegen::run(&program, &args) {
        Ok(result) => {
            println!("{result}");
            0
        }
        Err(simply_codegen::RunError::TypeError(e)) => {
            eprintln!("Type check failed: {e}");
            2
        }
        Err(simply_codegen::RunError::VerifyError(e)) => {
            eprintln!("Verification failed: {e}");
            3
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}
