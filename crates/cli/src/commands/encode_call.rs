// Path: crates/cli/src/commands/encode_call.rs

use anyhow::{Context, Result};
use clap::Parser;
use cvm_types::abi::AbiRegistry;
use cvm_types::call::{parse_call_text, CallInput};
use cvm_types::error::DecodeError;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct EncodeCallArgs {
    /// The ABI JSON describing the contract's methods.
    #[clap(long)]
    pub abi: PathBuf,
    /// The call as text, e.g. `transfer("bob", 10)`.
    #[clap(long)]
    pub call: String,
    /// Transaction type recorded in the call input.
    #[clap(long, default_value = "1")]
    pub tx_type: u64,
}

/// Builds a call input from `name(arg, ...)` text, converting each argument per the ABI.
pub fn encode_call(abi_json: &[u8], call_text: &str, tx_type: u64) -> Result<Vec<u8>> {
    let abi = AbiRegistry::parse(abi_json)?;
    let (func_name, texts) = parse_call_text(call_text);
    let method = abi
        .find_method(&func_name)
        .ok_or_else(|| DecodeError::MethodNotFound(func_name.clone()))?;
    if method.args.len() != texts.len() {
        return Err(DecodeError::ArgumentCount {
            method: method.name.clone(),
            expected: method.args.len(),
            got: texts.len(),
        }
        .into());
    }
    let args = method
        .args
        .iter()
        .zip(&texts)
        .map(|(arg, text)| arg.real_type.encode_text_arg(text))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CallInput {
        tx_type,
        func_name,
        args,
    }
    .encode())
}

pub fn run(args: EncodeCallArgs) -> Result<()> {
    let abi_json = fs::read(&args.abi)
        .with_context(|| format!("failed to read abi {}", args.abi.display()))?;
    let encoded = encode_call(&abi_json, &args.call, args.tx_type)?;
    println!("{}", hex::encode(encoded));
    Ok(())
}
