// Path: crates/types/src/abi/mod.rs

//! The ABI description of a contract and its method registry.
//!
//! The ABI is a JSON array of method descriptors:
//!
//! ```json
//! [{ "method": "transfer",
//!    "args": [{ "name": "to", "realTypeName": "string" },
//!             { "name": "amount", "realTypeName": "uint64" }],
//!    "return": "int" }]
//! ```

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed set of type names understood by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AbiType {
    /// No value.
    Void,
    /// A boolean carried in one byte.
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 32-bit integer (`int` alias).
    Int,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 32-bit integer (`uint` alias).
    UInt,
    /// Unsigned 64-bit integer.
    UInt64,
    /// A UTF-8 string staged in VM memory.
    String,
    /// Any other type name, kept verbatim.
    Unsupported(String),
}

impl AbiType {
    /// Returns the canonical type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt => "uint",
            Self::UInt64 => "uint64",
            Self::String => "string",
            Self::Unsupported(name) => name,
        }
    }

    /// The number of big-endian bytes a fixed-width argument of this type occupies.
    ///
    /// Returns `None` for `string`, `void` and unsupported types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::Int | Self::UInt32 | Self::UInt => Some(4),
            Self::Int64 | Self::UInt64 => Some(8),
            Self::Void | Self::String | Self::Unsupported(_) => None,
        }
    }

    /// Converts the textual form of an argument into its wire bytes.
    ///
    /// This is the inverse of argument marshaling and is used by tooling that builds
    /// call inputs from `name(arg, ...)` text.
    pub fn encode_text_arg(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        let invalid = || DecodeError::InvalidArgText {
            text: text.to_string(),
            type_name: self.name().to_string(),
        };
        let bytes = match self {
            Self::String => text.as_bytes().to_vec(),
            Self::Bool => match text {
                "true" | "1" => vec![1],
                "false" | "0" => vec![0],
                _ => return Err(invalid()),
            },
            Self::Int8 => text.parse::<i8>().map_err(|_| invalid())?.to_be_bytes().to_vec(),
            Self::UInt8 => text.parse::<u8>().map_err(|_| invalid())?.to_be_bytes().to_vec(),
            Self::Int16 => text.parse::<i16>().map_err(|_| invalid())?.to_be_bytes().to_vec(),
            Self::UInt16 => text.parse::<u16>().map_err(|_| invalid())?.to_be_bytes().to_vec(),
            Self::Int32 | Self::Int => {
                text.parse::<i32>().map_err(|_| invalid())?.to_be_bytes().to_vec()
            }
            Self::UInt32 | Self::UInt => {
                text.parse::<u32>().map_err(|_| invalid())?.to_be_bytes().to_vec()
            }
            Self::Int64 => text.parse::<i64>().map_err(|_| invalid())?.to_be_bytes().to_vec(),
            Self::UInt64 => text.parse::<u64>().map_err(|_| invalid())?.to_be_bytes().to_vec(),
            Self::Void | Self::Unsupported(_) => return Err(invalid()),
        };
        Ok(bytes)
    }
}

impl From<&str> for AbiType {
    fn from(name: &str) -> Self {
        match name.trim() {
            "" | "void" => Self::Void,
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int" => Self::Int,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint" => Self::UInt,
            "uint64" => Self::UInt64,
            "string" => Self::String,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for AbiType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<AbiType> for String {
    fn from(ty: AbiType) -> Self {
        ty.name().to_string()
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared method argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodArg {
    /// The argument name.
    #[serde(default)]
    pub name: String,
    /// The source-level type name, informational only.
    #[serde(rename = "typeName", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// The type used for marshaling.
    #[serde(rename = "realTypeName")]
    pub real_type: AbiType,
}

/// A method signature as declared in the ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    /// The method name, as written in the ABI.
    #[serde(rename = "method")]
    pub name: String,
    /// The ordered arguments.
    #[serde(default)]
    pub args: Vec<MethodArg>,
    /// The return type.
    #[serde(rename = "return", default = "default_return")]
    pub return_type: AbiType,
}

fn default_return() -> AbiType {
    AbiType::Void
}

/// The methods of one contract, indexed by lower-cased name.
#[derive(Debug, Clone, Default)]
pub struct AbiRegistry {
    methods: HashMap<String, MethodSignature>,
}

impl AbiRegistry {
    /// Parses the ABI JSON of a contract.
    ///
    /// When two methods share a name (ignoring case), the first one wins.
    pub fn parse(abi_json: &[u8]) -> Result<Self, DecodeError> {
        let signatures: Vec<MethodSignature> =
            serde_json::from_slice(abi_json).map_err(|e| DecodeError::InvalidAbi(e.to_string()))?;
        Ok(Self::from_signatures(signatures))
    }

    /// Builds a registry from already parsed signatures.
    pub fn from_signatures(signatures: impl IntoIterator<Item = MethodSignature>) -> Self {
        let mut methods = HashMap::new();
        for signature in signatures {
            methods
                .entry(signature.name.to_lowercase())
                .or_insert(signature);
        }
        Self { methods }
    }

    /// Looks up a method by name, ignoring case.
    pub fn find_method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(&name.to_lowercase())
    }

    /// The number of distinct methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if the ABI declares no methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Parses the ABI JSON of a contract. See [`AbiRegistry::parse`].
pub fn parse_abi(abi_json: &[u8]) -> Result<AbiRegistry, DecodeError> {
    AbiRegistry::parse(abi_json)
}
