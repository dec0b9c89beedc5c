// Path: crates/api/src/lib.rs

//! # CVM API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure panic-free code.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # CVM API
//!
//! The stable contract between the execution driver and a bytecode virtual machine:
//! instantiate a module with an execution context, resolve exports by name, run an
//! export under a gas limit, and stage or read strings in linear memory.

/// Defines the core traits and types for virtual machines.
pub mod vm;

pub use vm::{
    EntryId, ExecutionContext, LinearMemory, LogSink, TracingLogSink, VirtualMachine, VmInstance,
};
