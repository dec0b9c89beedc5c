// Path: crates/cli/src/commands/bundle.rs

use anyhow::{Context, Result};
use clap::Parser;
use cvm_types::abi::AbiRegistry;
use cvm_types::bundle::ContractBundle;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct BundleArgs {
    /// Contract bytecode, binary `.wasm` or `.wat` text.
    #[clap(long)]
    pub wasm: PathBuf,
    /// The ABI JSON describing the contract's methods.
    #[clap(long)]
    pub abi: PathBuf,
    /// Transaction type recorded in the bundle.
    #[clap(long, default_value = "1")]
    pub tx_type: u64,
    /// Write the raw bundle here instead of printing it as hex.
    #[clap(long)]
    pub out: Option<PathBuf>,
}

/// Reads the bytecode and ABI and encodes them into a bundle.
///
/// The ABI is parsed first so a malformed description is rejected at build time.
pub fn build_bundle(args: &BundleArgs) -> Result<Vec<u8>> {
    let bytecode = fs::read(&args.wasm)
        .with_context(|| format!("failed to read bytecode {}", args.wasm.display()))?;
    let abi_json = fs::read(&args.abi)
        .with_context(|| format!("failed to read abi {}", args.abi.display()))?;
    let registry = AbiRegistry::parse(&abi_json)?;
    tracing::info!(
        target: "cli",
        methods = registry.len(),
        bytecode_len = bytecode.len(),
        tx_type = args.tx_type,
        "Bundling contract"
    );
    Ok(ContractBundle {
        tx_type: args.tx_type,
        bytecode,
        abi_json,
    }
    .encode())
}

pub fn run(args: BundleArgs) -> Result<()> {
    let encoded = build_bundle(&args)?;
    match &args.out {
        Some(path) => {
            fs::write(path, &encoded)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} byte bundle to {}", encoded.len(), path.display());
        }
        None => println!("{}", hex::encode(encoded)),
    }
    Ok(())
}
