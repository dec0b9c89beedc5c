// Path: crates/cli/src/lib.rs
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

//! # CVM CLI
//!
//! Command implementations behind the `cvm` binary: build contract bundles, encode
//! call inputs from `name(args)` text and run a bundle locally on the wasmtime engine.

pub mod commands;
pub mod util;
