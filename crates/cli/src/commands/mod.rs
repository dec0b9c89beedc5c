// Path: crates/cli/src/commands/mod.rs

pub mod bundle;
pub mod encode_call;
pub mod run;
