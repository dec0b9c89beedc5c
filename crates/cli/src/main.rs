// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # CVM CLI
//!
//! Bundle contracts, encode calls and run them locally.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cvm_cli::commands::{bundle, encode_call, run};

#[derive(Parser, Debug)]
#[clap(
    name = "cvm",
    version,
    about = "Contract VM bridge developer tool.",
    long_about = "Builds contract bundles, encodes call inputs from text and runs contracts on a local wasmtime engine."
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[clap(long, global = true)]
    json_logs: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode bytecode and ABI into a contract bundle.
    Bundle(bundle::BundleArgs),

    /// Encode a call input from `name(args)` text.
    EncodeCall(encode_call::EncodeCallArgs),

    /// Deploy or call a bundle locally.
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cvm_telemetry::init_tracing(cli.json_logs)?;

    match cli.command {
        Commands::Bundle(args) => bundle::run(args),
        Commands::EncodeCall(args) => encode_call::run(args),
        Commands::Run(args) => run::run(args).await,
    }
}
