// Path: crates/vm/wasm/src/resolver.rs

//! Host imports available to contract code.

use anyhow::anyhow;
use cvm_api::ExecutionContext;
use cvm_types::config::VmFuelCosts;
use cvm_types::error::VmError;
use std::fmt;
use wasmtime::{Caller, Extern, Linker, StoreLimits, Trap};

/// The data stored alongside every instance.
pub struct HostState {
    /// The execution context of the call that owns the instance.
    pub context: ExecutionContext,
    pub(crate) limits: StoreLimits,
    pub(crate) fuel_costs: VmFuelCosts,
    pub(crate) memory_export: String,
}

/// The distinguished signal for an intentional revert that keeps unused gas.
///
/// Raised by the `revert` host import; every other fault is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertSignal {
    /// The reason supplied by the contract.
    pub reason: String,
}

impl fmt::Display for RevertSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract reverted: {}", self.reason)
    }
}

impl std::error::Error for RevertSignal {}

/// Registers host functions that contract modules may import.
pub trait ImportResolver: Send + Sync {
    /// Defines the host functions under `module` in `linker`.
    fn register(&self, linker: &mut Linker<HostState>, module: &str) -> Result<(), VmError>;
}

/// The default host environment.
///
/// | import | signature | behaviour |
/// |---|---|---|
/// | `revert` | `(ptr: i32, len: i32)` | intentional revert with a UTF-8 reason |
/// | `abort` | `()` | fatal trap |
/// | `debug` | `(ptr: i32, len: i32)` | writes a message to the context's log sink |
/// | `gas_left` | `() -> i64` | remaining gas |
/// | `gas_limit` | `() -> i64` | the instance's gas ceiling |
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvResolver;

impl ImportResolver for EnvResolver {
    fn register(&self, linker: &mut Linker<HostState>, module: &str) -> Result<(), VmError> {
        let init_err = |e: anyhow::Error| VmError::Initialization(e.to_string());

        linker
            .func_wrap(
                module,
                "revert",
                |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> anyhow::Result<()> {
                    let reason = read_guest(&mut caller, ptr, len)?;
                    Err(RevertSignal {
                        reason: String::from_utf8_lossy(&reason).into_owned(),
                    }
                    .into())
                },
            )
            .map_err(init_err)?;

        linker
            .func_wrap(
                module,
                "abort",
                |_caller: Caller<'_, HostState>| -> anyhow::Result<()> {
                    Err(anyhow!("contract called abort"))
                },
            )
            .map_err(init_err)?;

        linker
            .func_wrap(
                module,
                "debug",
                |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> anyhow::Result<()> {
                    let message = read_guest(&mut caller, ptr, len)?;
                    let context = &caller.data().context;
                    context
                        .log
                        .log(&context.contract_address, &String::from_utf8_lossy(&message));
                    Ok(())
                },
            )
            .map_err(init_err)?;

        linker
            .func_wrap(
                module,
                "gas_left",
                |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
                    let base = caller.data().fuel_costs.base_cost;
                    charge(&mut caller, base)?;
                    Ok(i64::try_from(caller.get_fuel()?).unwrap_or(i64::MAX))
                },
            )
            .map_err(init_err)?;

        linker
            .func_wrap(
                module,
                "gas_limit",
                |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
                    let base = caller.data().fuel_costs.base_cost;
                    charge(&mut caller, base)?;
                    Ok(i64::try_from(caller.data().context.gas_limit).unwrap_or(i64::MAX))
                },
            )
            .map_err(init_err)?;

        Ok(())
    }
}

/// Deducts `cost` from the fuel left in the running call.
fn charge(caller: &mut Caller<'_, HostState>, cost: u64) -> anyhow::Result<()> {
    let fuel = caller.get_fuel()?;
    if fuel < cost {
        caller.set_fuel(0)?;
        return Err(Trap::OutOfFuel.into());
    }
    caller.set_fuel(fuel - cost)?;
    Ok(())
}

/// Copies `len` bytes at `ptr` out of the caller's memory, charging for them first.
fn read_guest(caller: &mut Caller<'_, HostState>, ptr: i32, len: i32) -> anyhow::Result<Vec<u8>> {
    let len = usize::try_from(len).map_err(|_| anyhow!("negative length {len}"))?;
    let costs = caller.data().fuel_costs.clone();
    let cost = costs
        .base_cost
        .saturating_add(costs.per_byte.saturating_mul(len as u64));
    charge(caller, cost)?;

    let name = caller.data().memory_export.clone();
    let memory = caller
        .get_export(&name)
        .and_then(Extern::into_memory)
        .ok_or_else(|| anyhow!("module does not export memory '{name}'"))?;
    let start = ptr as u32 as usize;
    let bytes = memory
        .data(&caller)
        .get(start..start.saturating_add(len))
        .ok_or_else(|| anyhow!("guest range {start}+{len} out of bounds"))?
        .to_vec();
    Ok(bytes)
}
