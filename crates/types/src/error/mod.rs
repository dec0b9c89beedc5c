// Path: crates/types/src/error/mod.rs
//! Core error types for the contract VM bridge.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while decoding bundles, call inputs or ABI descriptions.
///
/// A `DecodeError` is always detected before any execution side effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input was empty or too short to hold a call.
    #[error("invalid input")]
    InvalidInput,
    /// The nested byte-string/list encoding was malformed.
    #[error("invalid rlp format: {0}")]
    Rlp(String),
    /// Bytes remained after the top-level item.
    #[error("invalid rlp format: {0} trailing bytes after top-level item")]
    TrailingBytes(usize),
    /// The top-level item had the wrong shape.
    #[error("invalid rlp format: expected {0}")]
    UnexpectedShape(&'static str),
    /// The top-level list had too few elements.
    #[error("invalid input: expected at least {expected} elements, got {got}")]
    TooFewElements {
        /// The minimum number of elements.
        expected: usize,
        /// The number of elements found.
        got: usize,
    },
    /// An integer field did not fit in 64 bits.
    #[error("integer field is {0} bytes long, at most 8 are allowed")]
    IntegerOverflow(usize),
    /// The function name was not valid UTF-8.
    #[error("function name is not valid utf-8")]
    InvalidUtf8,
    /// The ABI JSON could not be parsed.
    #[error("invalid abi: {0}")]
    InvalidAbi(String),
    /// The requested method does not exist in the ABI.
    #[error("invalid input or invalid abi: method '{0}' not found")]
    MethodNotFound(String),
    /// The number of supplied arguments does not match the method signature.
    #[error("invalid input or invalid abi: method '{method}' takes {expected} arguments, got {got}")]
    ArgumentCount {
        /// The resolved method name.
        method: String,
        /// The declared number of arguments.
        expected: usize,
        /// The supplied number of arguments.
        got: usize,
    },
    /// An argument byte string was shorter than its declared type requires.
    #[error("argument {index} of type {type_name} needs {expected} bytes, got {got}")]
    ArgumentWidth {
        /// Position of the argument.
        index: usize,
        /// Declared type name.
        type_name: String,
        /// Required byte width.
        expected: usize,
        /// Supplied byte width.
        got: usize,
    },
    /// An argument had a type that cannot be marshaled into a VM word.
    #[error("argument {index} has unsupported type '{type_name}'")]
    UnsupportedArgType {
        /// Position of the argument.
        index: usize,
        /// Declared type name.
        type_name: String,
    },
    /// A textual argument could not be converted to its declared type.
    #[error("argument '{text}' is not a valid {type_name}")]
    InvalidArgText {
        /// The offending text.
        text: String,
        /// Declared type name.
        type_name: String,
    },
    /// A string argument was not valid UTF-8 or held an embedded NUL.
    #[error("argument {index} is not a valid string: {reason}")]
    InvalidStringArg {
        /// Position of the argument.
        index: usize,
        /// What was wrong with the bytes.
        reason: &'static str,
    },
    /// Writing an argument into VM memory failed.
    ///
    /// Only the standalone decoder reports this; the driver treats staging
    /// failures as VM faults.
    #[error("failed to stage argument in VM memory: {0}")]
    Memory(String),
}

impl ErrorCode for DecodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "DECODE_INVALID_INPUT",
            Self::Rlp(_) => "DECODE_RLP",
            Self::TrailingBytes(_) => "DECODE_TRAILING_BYTES",
            Self::UnexpectedShape(_) => "DECODE_UNEXPECTED_SHAPE",
            Self::TooFewElements { .. } => "DECODE_TOO_FEW_ELEMENTS",
            Self::IntegerOverflow(_) => "DECODE_INTEGER_OVERFLOW",
            Self::InvalidUtf8 => "DECODE_INVALID_UTF8",
            Self::InvalidAbi(_) => "DECODE_INVALID_ABI",
            Self::MethodNotFound(_) => "DECODE_METHOD_NOT_FOUND",
            Self::ArgumentCount { .. } => "DECODE_ARGUMENT_COUNT",
            Self::ArgumentWidth { .. } => "DECODE_ARGUMENT_WIDTH",
            Self::UnsupportedArgType { .. } => "DECODE_UNSUPPORTED_ARG_TYPE",
            Self::InvalidArgText { .. } => "DECODE_INVALID_ARG_TEXT",
            Self::InvalidStringArg { .. } => "DECODE_INVALID_STRING_ARG",
            Self::Memory(_) => "DECODE_MEMORY",
        }
    }
}

/// Errors raised while encoding a raw result word into return bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The method declares a return type the encoder does not handle.
    #[error("unsupported return type '{0}'")]
    UnsupportedReturnType(String),
    /// Reading the returned value out of VM memory failed.
    #[error("failed to read return value from VM memory: {0}")]
    Memory(String),
}

impl ErrorCode for EncodingError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedReturnType(_) => "ENCODING_UNSUPPORTED_RETURN_TYPE",
            Self::Memory(_) => "ENCODING_MEMORY",
        }
    }
}

/// Errors related to the virtual machine engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// The VM failed to initialize.
    #[error("VM initialization failed: {0}")]
    Initialization(String),
    /// The provided contract bytecode was invalid.
    #[error("Invalid bytecode: {0}")]
    InvalidBytecode(String),
    /// The contract execution trapped (e.g., memory access error, unreachable).
    #[error("Execution trapped: {0}")]
    ExecutionTrap(String),
    /// The engine ran out of gas while executing.
    #[error("Out of gas")]
    OutOfGas,
    /// The contract requested an intentional revert.
    #[error("Execution reverted: {0}")]
    Reverted(String),
    /// The requested function was not found in the contract.
    #[error("Function not found in contract: {0}")]
    FunctionNotFound(String),
    /// The arguments did not fit the entry point's signature.
    #[error("Signature mismatch: {0}")]
    Signature(String),
    /// An error occurred within a host function called by the contract.
    #[error("Host function error: {0}")]
    HostError(String),
    /// A memory allocation or access error occurred within the VM.
    #[error("Memory allocation/access error in VM: {0}")]
    MemoryError(String),
}

impl ErrorCode for VmError {
    fn code(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "VM_INITIALIZATION_FAILED",
            Self::InvalidBytecode(_) => "VM_INVALID_BYTECODE",
            Self::ExecutionTrap(_) => "VM_EXECUTION_TRAP",
            Self::OutOfGas => "VM_OUT_OF_GAS",
            Self::Reverted(_) => "VM_REVERTED",
            Self::FunctionNotFound(_) => "VM_FUNCTION_NOT_FOUND",
            Self::Signature(_) => "VM_SIGNATURE_MISMATCH",
            Self::HostError(_) => "VM_HOST_ERROR",
            Self::MemoryError(_) => "VM_MEMORY_ERROR",
        }
    }
}

/// How a failed call settles the caller's gas budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPolicy {
    /// The failure happened before any VM instance existed; nothing is charged.
    NoCharge,
    /// Revert state changes and charge only the gas actually used.
    RefundRemaining,
    /// Revert state changes and consume the whole budget.
    ConsumeAll,
}

/// Errors returned by the execution driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The bundle or call input could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// The VM instance could not be created for the contract code.
    #[error("instantiation failed: {0}")]
    Instantiation(VmError),
    /// The named entry point is not exported by the instantiated module.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
    /// The contract asked to revert while keeping its remaining gas.
    #[error("execution reverted: {reason}")]
    Reverted {
        /// The reason supplied by the contract.
        reason: String,
        /// Gas consumed up to the revert.
        gas_used: u64,
    },
    /// The VM faulted while executing the entry point.
    #[error("execution fault: {0}")]
    Fault(VmError),
    /// The gas used exceeded the contract's budget.
    #[error("out of gas: used {gas_used}, limit {gas_limit}")]
    OutOfGas {
        /// Gas reported by the VM context.
        gas_used: u64,
        /// Gas budget of the call.
        gas_limit: u64,
    },
    /// Entering the call would exceed the maximum call depth.
    #[error("max call depth {max} exceeded")]
    CallDepthExceeded {
        /// The configured limit.
        max: usize,
    },
    /// The caller-imposed deadline elapsed before execution completed.
    #[error("execution timed out after {0} ms")]
    Timeout(u64),
}

impl ExecutionError {
    /// Returns the gas settlement rule for this failure.
    pub fn gas_policy(&self) -> GasPolicy {
        match self {
            Self::Decode(_) | Self::CallDepthExceeded { .. } => GasPolicy::NoCharge,
            Self::Reverted { .. } => GasPolicy::RefundRemaining,
            Self::Instantiation(_)
            | Self::EntryNotFound(_)
            | Self::Fault(_)
            | Self::OutOfGas { .. }
            | Self::Timeout(_) => GasPolicy::ConsumeAll,
        }
    }
}

impl ErrorCode for ExecutionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "EXECUTION_DECODE",
            Self::Instantiation(_) => "EXECUTION_INSTANTIATION",
            Self::EntryNotFound(_) => "EXECUTION_ENTRY_NOT_FOUND",
            Self::Reverted { .. } => "EXECUTION_REVERTED",
            Self::Fault(_) => "EXECUTION_FAULT",
            Self::OutOfGas { .. } => "EXECUTION_OUT_OF_GAS",
            Self::CallDepthExceeded { .. } => "EXECUTION_CALL_DEPTH_EXCEEDED",
            Self::Timeout(_) => "EXECUTION_TIMEOUT",
        }
    }
}

/// Errors related to loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value was out of range.
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "CONFIG_IO_ERROR",
            Self::Parse(_) => "CONFIG_PARSE_ERROR",
            Self::Invalid(_) => "CONFIG_INVALID_VALUE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_policy_by_class() {
        assert_eq!(
            ExecutionError::Decode(DecodeError::InvalidInput).gas_policy(),
            GasPolicy::NoCharge
        );
        assert_eq!(
            ExecutionError::Reverted {
                reason: "nope".into(),
                gas_used: 10
            }
            .gas_policy(),
            GasPolicy::RefundRemaining
        );
        assert_eq!(
            ExecutionError::EntryNotFound("init".into()).gas_policy(),
            GasPolicy::ConsumeAll
        );
        assert_eq!(
            ExecutionError::Fault(VmError::OutOfGas).gas_policy(),
            GasPolicy::ConsumeAll
        );
        assert_eq!(
            ExecutionError::OutOfGas {
                gas_used: 2,
                gas_limit: 1
            }
            .gas_policy(),
            GasPolicy::ConsumeAll
        );
    }

    #[test]
    fn test_messages_match_host_wording() {
        assert_eq!(DecodeError::InvalidInput.to_string(), "invalid input");
        assert!(DecodeError::MethodNotFound("x".into())
            .to_string()
            .starts_with("invalid input or invalid abi"));
        assert!(ExecutionError::EntryNotFound("init".into())
            .to_string()
            .starts_with("entry not found"));
        assert!(ExecutionError::OutOfGas {
            gas_used: 5,
            gas_limit: 4
        }
        .to_string()
        .starts_with("out of gas"));
    }
}
