// Path: crates/vm/wasm/src/lib.rs
#![cfg_attr(
    not(test),
    deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)
)]

//! A wasmtime-backed implementation of the contract VM engine.
//!
//! Gas is wasmtime fuel. Every instance gets its own `Store`, so linear memory and
//! gas accounting are owned by the call that created the instance and released
//! with it.

use cvm_api::{EntryId, ExecutionContext, LinearMemory, VirtualMachine, VmInstance};
use cvm_types::config::InterpreterConfig;
use cvm_types::error::VmError;
use lru::LruCache;
use parking_lot::Mutex;
use sha3::{Digest, Keccak256};
use std::num::NonZeroUsize;
use wasmtime::{
    Config, Engine, Func, Instance, Linker, Memory, Module, Store, StoreLimitsBuilder, Trap, Val,
    ValType, WasmBacktrace,
};

pub mod resolver;

pub use resolver::{EnvResolver, HostState, ImportResolver, RevertSignal};

const WASM_PAGE_SIZE: usize = 64 * 1024;

/// Compiles modules and creates metered instances of them.
pub struct WasmRuntime {
    engine: Engine,
    linker: Linker<HostState>,
    config: InterpreterConfig,
    module_cache: Mutex<LruCache<[u8; 32], Module>>,
}

impl WasmRuntime {
    /// Creates a runtime with the default host environment.
    pub fn new(config: InterpreterConfig) -> Result<Self, VmError> {
        Self::with_resolver(config, &EnvResolver)
    }

    /// Creates a runtime whose host imports are provided by `resolver`.
    pub fn with_resolver(
        config: InterpreterConfig,
        resolver: &dyn ImportResolver,
    ) -> Result<Self, VmError> {
        let mut wasm_config = Config::new();
        wasm_config.consume_fuel(true);

        let engine =
            Engine::new(&wasm_config).map_err(|e| VmError::Initialization(e.to_string()))?;

        let mut linker = Linker::new(&engine);
        resolver.register(&mut linker, &config.host_module)?;

        let capacity = NonZeroUsize::new(config.module_cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            engine,
            linker,
            config,
            module_cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// The underlying wasmtime engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn module(&self, bytecode: &[u8]) -> Result<Module, VmError> {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&Keccak256::digest(bytecode));

        if let Some(module) = self.module_cache.lock().get(&hash) {
            return Ok(module.clone());
        }
        let module = Module::new(&self.engine, bytecode)
            .map_err(|e| VmError::InvalidBytecode(e.to_string()))?;
        self.module_cache.lock().put(hash, module.clone());
        Ok(module)
    }
}

impl VirtualMachine for WasmRuntime {
    fn instantiate(
        &self,
        bytecode: &[u8],
        context: ExecutionContext,
    ) -> Result<Box<dyn VmInstance>, VmError> {
        let module = self.module(bytecode)?;

        let max_memory = (self.config.max_memory_pages as usize).saturating_mul(WASM_PAGE_SIZE);
        let gas_limit = context.gas_limit;
        let host_state = HostState {
            context,
            limits: StoreLimitsBuilder::new().memory_size(max_memory).build(),
            fuel_costs: self.config.fuel_costs.clone(),
            memory_export: self.config.memory_export.clone(),
        };

        let mut store = Store::new(&self.engine, host_state);
        store.limiter(|state| &mut state.limits);

        let instance = metered(&mut store, gas_limit, |store| {
            self.linker.instantiate(store, &module)
        })
        .map_err(|e| match e {
            VmError::ExecutionTrap(message) => VmError::Initialization(message),
            other => other,
        })?;

        let memory = instance.get_memory(&mut store, &self.config.memory_export);
        tracing::debug!(
            target: "vm",
            gas_used = store.data().context.gas_used,
            has_memory = memory.is_some(),
            "Instantiated contract module."
        );

        Ok(Box::new(WasmInstance {
            store,
            instance,
            memory,
            exports: Vec::new(),
            allocator_export: self.config.allocator_export.clone(),
        }))
    }
}

/// One metered instance of a contract module.
pub struct WasmInstance {
    store: Store<HostState>,
    instance: Instance,
    memory: Option<Memory>,
    exports: Vec<Func>,
    allocator_export: String,
}

impl WasmInstance {
    fn memory(&self) -> Result<Memory, VmError> {
        self.memory
            .ok_or_else(|| VmError::MemoryError("module does not export linear memory".into()))
    }
}

impl LinearMemory for WasmInstance {
    fn allocate_string(&mut self, text: &str) -> Result<i64, VmError> {
        let memory = self.memory()?;
        let size = i32::try_from(text.len() + 1)
            .map_err(|_| VmError::MemoryError(format!("string of {} bytes", text.len())))?;
        let allocator = self
            .instance
            .get_typed_func::<i32, i32>(&mut self.store, &self.allocator_export)
            .map_err(|e| {
                VmError::MemoryError(format!(
                    "allocator '{}' unavailable: {}",
                    self.allocator_export, e
                ))
            })?;

        let budget = self.store.data().context.gas_left();
        let ptr = metered(&mut self.store, budget, |store| allocator.call(store, size))?;

        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        memory
            .write(&mut self.store, ptr as u32 as usize, &bytes)
            .map_err(|e| VmError::MemoryError(e.to_string()))?;
        Ok(i64::from(ptr as u32))
    }

    fn read_c_string(&self, offset: i64) -> Result<Vec<u8>, VmError> {
        let memory = self.memory()?;
        let start = u32::try_from(offset)
            .or_else(|_| i32::try_from(offset).map(|v| v as u32))
            .map_err(|_| VmError::MemoryError(format!("offset {offset} is not a 32-bit address")))?
            as usize;
        let data = memory.data(&self.store);
        let tail = data.get(start..).ok_or_else(|| {
            VmError::MemoryError(format!(
                "offset {start} outside linear memory of {} bytes",
                data.len()
            ))
        })?;
        Ok(tail.iter().take_while(|b| **b != 0).copied().collect())
    }
}

impl VmInstance for WasmInstance {
    fn export(&mut self, name: &str) -> Option<EntryId> {
        let func = self.instance.get_func(&mut self.store, name)?;
        let id = u32::try_from(self.exports.len()).ok()?;
        self.exports.push(func);
        Some(EntryId(id))
    }

    fn run_with_gas_limit(
        &mut self,
        entry: EntryId,
        gas_limit: u64,
        args: &[i64],
    ) -> Result<i64, VmError> {
        let func = *self
            .exports
            .get(entry.0 as usize)
            .ok_or_else(|| VmError::FunctionNotFound(format!("entry #{}", entry.0)))?;

        let ty = func.ty(&self.store);
        if ty.params().len() != args.len() {
            return Err(VmError::Signature(format!(
                "entry takes {} parameters, got {} arguments",
                ty.params().len(),
                args.len()
            )));
        }
        let params = ty
            .params()
            .zip(args)
            .map(|(param, arg)| match param {
                ValType::I32 => Ok(Val::I32(*arg as i32)),
                ValType::I64 => Ok(Val::I64(*arg)),
                other => Err(VmError::Signature(format!(
                    "unsupported parameter type {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut results = vec![Val::I64(0); ty.results().len()];

        let budget = gas_limit.saturating_sub(self.store.data().context.gas_used);
        metered(&mut self.store, budget, |store| {
            func.call(store, &params, &mut results)
        })?;

        match results.first() {
            None => Ok(0),
            Some(Val::I32(value)) => Ok(i64::from(*value)),
            Some(Val::I64(value)) => Ok(*value),
            Some(other) => Err(VmError::Signature(format!(
                "unsupported result value {other:?}"
            ))),
        }
    }

    fn context(&self) -> &ExecutionContext {
        &self.store.data().context
    }
}

/// Runs `f` with `budget` fuel and charges whatever it burned to the context.
fn metered<R>(
    store: &mut Store<HostState>,
    budget: u64,
    f: impl FnOnce(&mut Store<HostState>) -> anyhow::Result<R>,
) -> Result<R, VmError> {
    store
        .set_fuel(budget)
        .map_err(|e| VmError::Initialization(e.to_string()))?;
    let outcome = f(store);
    let remaining = store.get_fuel().unwrap_or(0);
    store.data_mut().context.charge(budget.saturating_sub(remaining));
    outcome.map_err(classify_error)
}

/// Maps a wasmtime failure onto the VM error taxonomy.
fn classify_error(err: anyhow::Error) -> VmError {
    if let Some(backtrace) = err.downcast_ref::<WasmBacktrace>() {
        tracing::debug!(target: "vm", %backtrace, "Contract trapped.");
    }
    if let Some(signal) = err.downcast_ref::<RevertSignal>() {
        return VmError::Reverted(signal.reason.clone());
    }
    match err.downcast_ref::<Trap>() {
        Some(Trap::OutOfFuel) => VmError::OutOfGas,
        Some(trap) => VmError::ExecutionTrap(trap.to_string()),
        None => VmError::ExecutionTrap(format!("{err:#}")),
    }
}
