// Path: crates/execution/src/mock.rs

//! A scripted VM used by the unit tests of this crate.

use cvm_api::{EntryId, ExecutionContext, LinearMemory, VirtualMachine, VmInstance};
use cvm_types::error::VmError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A byte vector with a bump allocator.
#[derive(Debug, Clone)]
pub struct MockMemory {
    bytes: Vec<u8>,
    allocations: usize,
}

impl Default for MockMemory {
    fn default() -> Self {
        // Keep offset 0 unused so a staged string never sits at null.
        Self {
            bytes: vec![0; 8],
            allocations: 0,
        }
    }
}

impl MockMemory {
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}

impl LinearMemory for MockMemory {
    fn allocate_string(&mut self, text: &str) -> Result<i64, VmError> {
        let offset = self.bytes.len() as i64;
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        self.allocations += 1;
        Ok(offset)
    }

    fn read_c_string(&self, offset: i64) -> Result<Vec<u8>, VmError> {
        let start = usize::try_from(offset)
            .map_err(|_| VmError::MemoryError(format!("negative offset {offset}")))?;
        let tail = self
            .bytes
            .get(start..)
            .ok_or_else(|| VmError::MemoryError(format!("offset {offset} out of bounds")))?;
        Ok(tail.iter().take_while(|b| **b != 0).copied().collect())
    }
}

/// What a scripted export does when run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Returns the word.
    Word(i64),
    /// Stages the text and returns its offset.
    Text(&'static str),
    /// Requests a revert.
    Revert(&'static str),
    /// Traps.
    Trap,
    /// Burns the whole limit and reports out of gas.
    OutOfGas,
    /// Blocks for the duration, then returns zero.
    Sleep(Duration),
}

#[derive(Debug, Clone)]
struct Export {
    outcome: Outcome,
    gas: u64,
}

/// A VM whose exports follow a fixed script.
#[derive(Debug, Default)]
pub struct MockVm {
    exports: HashMap<String, Export>,
    instantiation_gas: u64,
    reject_bytecode: bool,
    allocation_error: Option<VmError>,
    pub calls: Arc<Mutex<Vec<(String, Vec<i64>)>>>,
    pub instantiations: AtomicUsize,
}

impl MockVm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an export that charges `gas` and then behaves as `outcome`.
    pub fn with_export(mut self, name: &str, outcome: Outcome, gas: u64) -> Self {
        self.exports.insert(name.to_string(), Export { outcome, gas });
        self
    }

    pub fn with_instantiation_gas(mut self, gas: u64) -> Self {
        self.instantiation_gas = gas;
        self
    }

    pub fn rejecting_bytecode(mut self) -> Self {
        self.reject_bytecode = true;
        self
    }

    /// Makes every string allocation fail with `err`.
    pub fn failing_allocations(mut self, err: VmError) -> Self {
        self.allocation_error = Some(err);
        self
    }

    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }

    pub fn recorded_calls(&self) -> Vec<(String, Vec<i64>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl VirtualMachine for MockVm {
    fn instantiate(
        &self,
        bytecode: &[u8],
        mut context: ExecutionContext,
    ) -> Result<Box<dyn VmInstance>, VmError> {
        self.instantiations.fetch_add(1, Ordering::SeqCst);
        if self.reject_bytecode {
            return Err(VmError::InvalidBytecode(format!(
                "{} bytes rejected",
                bytecode.len()
            )));
        }
        context.charge(self.instantiation_gas);
        Ok(Box::new(MockInstance {
            exports: self.exports.clone(),
            resolved: Vec::new(),
            memory: MockMemory::default(),
            allocation_error: self.allocation_error.clone(),
            context,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct MockInstance {
    exports: HashMap<String, Export>,
    resolved: Vec<String>,
    memory: MockMemory,
    allocation_error: Option<VmError>,
    context: ExecutionContext,
    calls: Arc<Mutex<Vec<(String, Vec<i64>)>>>,
}

impl LinearMemory for MockInstance {
    fn allocate_string(&mut self, text: &str) -> Result<i64, VmError> {
        if let Some(err) = &self.allocation_error {
            self.context.gas_used = self.context.gas_limit;
            return Err(err.clone());
        }
        self.memory.allocate_string(text)
    }

    fn read_c_string(&self, offset: i64) -> Result<Vec<u8>, VmError> {
        self.memory.read_c_string(offset)
    }
}

impl VmInstance for MockInstance {
    fn export(&mut self, name: &str) -> Option<EntryId> {
        self.exports.get(name)?;
        self.resolved.push(name.to_string());
        Some(EntryId(self.resolved.len() as u32 - 1))
    }

    fn run_with_gas_limit(
        &mut self,
        entry: EntryId,
        gas_limit: u64,
        args: &[i64],
    ) -> Result<i64, VmError> {
        let name = self.resolved[entry.0 as usize].clone();
        let export = self.exports[&name].clone();
        self.calls.lock().unwrap().push((name, args.to_vec()));
        self.context.charge(export.gas);
        match export.outcome {
            Outcome::Word(word) => Ok(word),
            Outcome::Text(text) => self.memory.allocate_string(text),
            Outcome::Revert(reason) => Err(VmError::Reverted(reason.to_string())),
            Outcome::Trap => Err(VmError::ExecutionTrap("unreachable".into())),
            Outcome::OutOfGas => {
                self.context.gas_used = gas_limit;
                Err(VmError::OutOfGas)
            }
            Outcome::Sleep(duration) => {
                std::thread::sleep(duration);
                Ok(0)
            }
        }
    }

    fn context(&self) -> &ExecutionContext {
        &self.context
    }
}
