// Path: crates/cli/src/commands/run.rs

use crate::util::{decode_hex, read_binary_or_hex};
use anyhow::{anyhow, Result};
use clap::Parser;
use cvm_execution::{run_with_deadline, Contract, ContractExecutor};
use cvm_telemetry::ScopeTimer;
use cvm_types::config::InterpreterConfig;
use cvm_types::error::ErrorCode;
use cvm_vm_wasm::WasmRuntime;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The bundle file, raw or hex as printed by `cvm bundle`.
    #[clap(long)]
    pub bundle: PathBuf,
    /// Hex call input. Without it the contract is deployed.
    #[clap(long)]
    pub input: Option<String>,
    /// Gas budget for the run.
    #[clap(long, default_value = "10000000")]
    pub gas: u64,
    /// Abandon the run after this many milliseconds.
    #[clap(long)]
    pub timeout_ms: Option<u64>,
    /// Hex contract address.
    #[clap(long, default_value = "0000000000000000000000000000000000000000")]
    pub address: String,
    /// Interpreter configuration (TOML).
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// The outcome of a local run, as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunReport {
    Ok {
        return_data: String,
        gas_used: u64,
        gas_left: u64,
    },
    Error {
        code: String,
        error: String,
        gas_left: u64,
    },
}

/// Runs the bundle once and reports the result with the settled gas.
pub async fn execute(args: &RunArgs) -> Result<RunReport> {
    let config = match &args.config {
        Some(path) => InterpreterConfig::load(path)?,
        None => InterpreterConfig::default(),
    };
    let code = read_binary_or_hex(&args.bundle)?;
    let input = args.input.as_deref().map(decode_hex).transpose()?;
    let address = decode_hex(&args.address)?;

    let runtime = WasmRuntime::new(config.clone())?;
    let executor = Arc::new(ContractExecutor::new(Arc::new(runtime), config));
    let mut contract = Contract::new(address, code, args.gas);

    let _timer = ScopeTimer::new("cvm.run");
    let result = match args.timeout_ms {
        Some(ms) => {
            run_with_deadline(executor, &mut contract, input, Duration::from_millis(ms)).await
        }
        None => executor.run(&mut contract, input.as_deref()),
    };

    Ok(match result {
        Ok(output) => RunReport::Ok {
            return_data: hex::encode(output.return_data),
            gas_used: output.gas_used,
            gas_left: contract.gas,
        },
        Err(err) => RunReport::Error {
            code: err.code().to_string(),
            error: err.to_string(),
            gas_left: contract.gas,
        },
    })
}

pub async fn run(args: RunArgs) -> Result<()> {
    let report = execute(&args).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    match report {
        RunReport::Ok { .. } => Ok(()),
        RunReport::Error { code, .. } => Err(anyhow!("contract run failed ({code})")),
    }
}
