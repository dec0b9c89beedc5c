// Path: crates/execution/src/lib.rs
//! # CVM Execution Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
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
//! # CVM Execution
//!
//! Bridges the ledger's contract execution to a bytecode VM: decodes the stored
//! bundle and the call input, marshals arguments into VM words, runs the entry point
//! under a gas ceiling and encodes the result for the host.

pub mod abi_input;
pub mod abi_output;
pub mod deadline;
pub mod depth;
pub mod interpreter;

#[cfg(test)]
pub(crate) mod mock;

pub use abi_input::{decode_call, prepare_call, DecodedCall, PreparedCall};
pub use abi_output::encode_return;
pub use deadline::run_with_deadline;
pub use depth::{CallDepth, DepthGuard};
pub use interpreter::{Contract, ContractExecutor, ExecutionOutput, ExecutionResult};
