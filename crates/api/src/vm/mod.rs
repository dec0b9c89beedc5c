// Path: crates/api/src/vm/mod.rs
//! Defines the core traits and types for virtual machines.
use cvm_types::error::VmError;
use std::fmt::Debug;
use std::sync::Arc;

/// A factory for sandboxed VM instances.
///
/// Each call to [`VirtualMachine::instantiate`] yields a fresh instance that owns its
/// own linear memory. Instances are never reused or shared between calls.
pub trait VirtualMachine: Send + Sync {
    /// Creates an instance of `bytecode` bound to `context`.
    ///
    /// Any start routine of the module runs here and is charged against the
    /// context's gas limit.
    fn instantiate(
        &self,
        bytecode: &[u8],
        context: ExecutionContext,
    ) -> Result<Box<dyn VmInstance>, VmError>;
}

/// The linear memory of an instance, as seen by argument and return marshaling.
pub trait LinearMemory {
    /// Allocates `text` NUL-terminated inside linear memory and returns its offset.
    fn allocate_string(&mut self, text: &str) -> Result<i64, VmError>;

    /// Reads bytes starting at `offset` up to, not including, the first zero byte.
    ///
    /// If no zero byte follows `offset`, the bytes up to the end of memory are returned.
    fn read_c_string(&self, offset: i64) -> Result<Vec<u8>, VmError>;
}

/// An opaque handle to a resolved export of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub u32);

/// One instantiated module.
pub trait VmInstance: LinearMemory {
    /// Resolves an exported function by name.
    fn export(&mut self, name: &str) -> Option<EntryId>;

    /// Invokes `entry` with `args`, stopping once `gas_limit` is consumed.
    ///
    /// `gas_limit` is the ceiling for the whole instance: gas already consumed by
    /// instantiation or string allocation counts against it.
    fn run_with_gas_limit(
        &mut self,
        entry: EntryId,
        gas_limit: u64,
        args: &[i64],
    ) -> Result<i64, VmError>;

    /// The execution context, including the gas used so far.
    fn context(&self) -> &ExecutionContext;
}

/// Receives diagnostic output written by contract code.
pub trait LogSink: Send + Sync + Debug {
    /// Records one message emitted by the contract at `address`.
    fn log(&self, address: &[u8], message: &str);
}

/// The default sink: forwards contract output to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, address: &[u8], message: &str) {
        tracing::debug!(target: "contract", address = %hex::encode(address), "{}", message);
    }
}

/// Provides contextual information to the smart contract during execution.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The address of the contract being executed.
    pub contract_address: Vec<u8>,
    /// The gas ceiling for the instance.
    pub gas_limit: u64,
    /// The gas consumed so far. Never decreases.
    pub gas_used: u64,
    /// Where contract diagnostics go.
    pub log: Arc<dyn LogSink>,
}

impl ExecutionContext {
    /// Creates a context with zero gas used and the default log sink.
    pub fn new(contract_address: Vec<u8>, gas_limit: u64) -> Self {
        Self {
            contract_address,
            gas_limit,
            gas_used: 0,
            log: Arc::new(TracingLogSink),
        }
    }

    /// Replaces the log sink.
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// The gas still available under the ceiling.
    pub fn gas_left(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_used)
    }

    /// Adds `amount` to the gas used.
    pub fn charge(&mut self, amount: u64) {
        self.gas_used = self.gas_used.saturating_add(amount);
    }
}
