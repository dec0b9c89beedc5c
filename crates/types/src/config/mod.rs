// Path: crates/types/src/config/mod.rs

//! Configuration for the contract interpreter.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Defines the fuel (gas) costs charged by host function calls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VmFuelCosts {
    /// Base cost for any host function call.
    #[serde(default = "default_fuel_base")]
    pub base_cost: u64,
    /// Per-byte cost for data a host function reads out of linear memory.
    #[serde(default = "default_fuel_per_byte")]
    pub per_byte: u64,
}

fn default_fuel_base() -> u64 {
    1000
}
fn default_fuel_per_byte() -> u64 {
    5
}

impl Default for VmFuelCosts {
    fn default() -> Self {
        Self {
            base_cost: default_fuel_base(),
            per_byte: default_fuel_per_byte(),
        }
    }
}

/// Configuration shared by the interpreter and the VM engine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// The entry point invoked when a contract is deployed.
    #[serde(default = "default_init_entry")]
    pub init_entry: String,
    /// The maximum nesting of concurrent `run` invocations.
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Upper bound on the linear memory of one instance, in 64 KiB pages.
    #[serde(default = "default_max_memory_pages")]
    pub max_memory_pages: u32,
    /// The import module name host functions are registered under.
    #[serde(default = "default_host_module")]
    pub host_module: String,
    /// The name of the exported linear memory.
    #[serde(default = "default_memory_export")]
    pub memory_export: String,
    /// The exported function used to allocate guest memory for strings.
    #[serde(default = "default_allocator_export")]
    pub allocator_export: String,
    /// How many compiled modules are kept in the engine's cache.
    #[serde(default = "default_module_cache_size")]
    pub module_cache_size: usize,
    /// Defines the fuel costs for host function calls.
    #[serde(default)]
    pub fuel_costs: VmFuelCosts,
}

fn default_init_entry() -> String {
    "init".to_string()
}
fn default_max_call_depth() -> usize {
    1024
}
fn default_max_memory_pages() -> u32 {
    256
}
fn default_host_module() -> String {
    "env".to_string()
}
fn default_memory_export() -> String {
    "memory".to_string()
}
fn default_allocator_export() -> String {
    "malloc".to_string()
}
fn default_module_cache_size() -> usize {
    64
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            init_entry: default_init_entry(),
            max_call_depth: default_max_call_depth(),
            max_memory_pages: default_max_memory_pages(),
            host_module: default_host_module(),
            memory_export: default_memory_export(),
            allocator_export: default_allocator_export(),
            module_cache_size: default_module_cache_size(),
            fuel_costs: VmFuelCosts::default(),
        }
    }
}

impl InterpreterConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Rejects values the interpreter cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid("max_call_depth must be at least 1".into()));
        }
        if self.max_memory_pages == 0 || self.max_memory_pages > 65536 {
            return Err(ConfigError::Invalid(format!(
                "max_memory_pages must be in 1..=65536, got {}",
                self.max_memory_pages
            )));
        }
        if self.module_cache_size == 0 {
            return Err(ConfigError::Invalid("module_cache_size must be at least 1".into()));
        }
        if self.init_entry.is_empty() {
            return Err(ConfigError::Invalid("init_entry must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = InterpreterConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.init_entry, "init");
        assert_eq!(config.fuel_costs.base_cost, 1000);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = InterpreterConfig::from_toml_str(
            r#"
            max_call_depth = 8
            allocator_export = "allocate"

            [fuel_costs]
            per_byte = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.allocator_export, "allocate");
        assert_eq!(config.fuel_costs.per_byte, 1);
        assert_eq!(config.fuel_costs.base_cost, 1000);
        assert_eq!(config.host_module, "env");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            InterpreterConfig::from_toml_str("max_call_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            InterpreterConfig::from_toml_str("max_memory_pages = 70000"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            InterpreterConfig::from_toml_str("max_call_depth = \"deep\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
