// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

//! # CVM Types
//!
//! The foundational library of the contract VM bridge: wire codecs, the contract
//! bundle, raw call inputs, the ABI registry, configuration and every error type.
//!
//! ## Architectural Role
//!
//! As the base crate, `cvm-types` does not know about any virtual machine. It is a
//! dependency of every other crate in the workspace, which keeps the VM contract
//! (`cvm-api`), the engine (`cvm-vm-wasm`) and the driver (`cvm-execution`) free of
//! circular dependencies.

/// The ABI description of a contract: method signatures and their types.
pub mod abi;
/// The on-chain contract bundle `[txType, bytecode, abiJson]`.
pub mod bundle;
/// The raw call input `[txType, funcName, arg0, arg1, ...]`.
pub mod call;
/// The nested byte-string/list (RLP) codec.
pub mod codec;
/// Shared configuration structures.
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;

pub use abi::{AbiRegistry, AbiType, MethodArg, MethodSignature};
pub use bundle::ContractBundle;
pub use call::CallInput;
pub use codec::RlpItem;
