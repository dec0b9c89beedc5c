// Path: crates/execution/src/abi_input.rs

//! Decodes a call input against the contract ABI into VM argument words.

use cvm_api::LinearMemory;
use cvm_types::abi::{AbiRegistry, AbiType, MethodSignature};
use cvm_types::call::CallInput;
use cvm_types::error::{DecodeError, ErrorCode, VmError};

/// A call whose arguments have been converted into VM words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    /// The transaction type carried by the input.
    pub tx_type: u64,
    /// The function name as sent by the caller.
    pub func_name: String,
    /// One word per declared argument.
    pub args: Vec<i64>,
    /// The declared return type.
    pub return_type: AbiType,
}

/// A call that has been resolved and type-checked against the ABI but whose
/// string arguments have not been staged in VM memory yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    /// The transaction type carried by the input.
    pub tx_type: u64,
    /// The function name as sent by the caller.
    pub func_name: String,
    /// The resolved signature.
    pub method: MethodSignature,
    args: Vec<PreparedArg>,
}

/// One argument after type checking.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PreparedArg {
    Word(i64),
    Text(String),
}

/// Decodes `input`, resolves the method and converts every argument to its type.
///
/// Nothing is written to VM memory, so a failure here has no execution side effect.
pub fn prepare_call(input: &[u8], abi: &AbiRegistry) -> Result<PreparedCall, DecodeError> {
    let call = CallInput::decode(input)?;
    let method = abi
        .find_method(&call.func_name)
        .ok_or_else(|| DecodeError::MethodNotFound(call.func_name.clone()))?;
    if method.args.len() != call.args.len() {
        return Err(DecodeError::ArgumentCount {
            method: method.name.clone(),
            expected: method.args.len(),
            got: call.args.len(),
        });
    }

    let args = method
        .args
        .iter()
        .zip(&call.args)
        .enumerate()
        .map(|(index, (arg, raw))| prepare_arg(index, &arg.real_type, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PreparedCall {
        tx_type: call.tx_type,
        func_name: call.func_name,
        method: method.clone(),
        args,
    })
}

impl PreparedCall {
    /// Produces the VM words of the call, staging strings in `memory`.
    ///
    /// Staging runs guest code, so failures are VM faults rather than decode errors.
    pub fn marshal<M: LinearMemory + ?Sized>(self, memory: &mut M) -> Result<DecodedCall, VmError> {
        let args = self
            .args
            .into_iter()
            .map(|arg| match arg {
                PreparedArg::Word(word) => Ok(word),
                PreparedArg::Text(text) => memory.allocate_string(&text),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecodedCall {
            tx_type: self.tx_type,
            func_name: self.func_name,
            args,
            return_type: self.method.return_type,
        })
    }
}

/// Decodes a call input into its function name, argument words and return type.
///
/// Failures are logged with their cause before being returned.
pub fn decode_call<M: LinearMemory + ?Sized>(
    input: &[u8],
    abi: &AbiRegistry,
    memory: &mut M,
) -> Result<DecodedCall, DecodeError> {
    prepare_call(input, abi)
        .and_then(|prepared| {
            prepared
                .marshal(memory)
                .map_err(|e| DecodeError::Memory(e.to_string()))
        })
        .map_err(log_decode_failure)
}

/// Logs a decode failure and passes it through.
pub(crate) fn log_decode_failure(err: DecodeError) -> DecodeError {
    tracing::error!(target: "abi", code = err.code(), error = %err, "Parse input data fail.");
    err
}

/// Converts one raw argument to its declared type.
fn prepare_arg(index: usize, ty: &AbiType, raw: &[u8]) -> Result<PreparedArg, DecodeError> {
    let word = match ty {
        AbiType::String => {
            let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidStringArg {
                index,
                reason: "not valid utf-8",
            })?;
            if text.contains('\0') {
                return Err(DecodeError::InvalidStringArg {
                    index,
                    reason: "contains a NUL byte",
                });
            }
            return Ok(PreparedArg::Text(text.to_string()));
        }
        AbiType::Int8 => i64::from(i8::from_be_bytes(take(index, ty, raw)?)),
        AbiType::UInt8 | AbiType::Bool => i64::from(u8::from_be_bytes(take(index, ty, raw)?)),
        AbiType::Int16 => i64::from(i16::from_be_bytes(take(index, ty, raw)?)),
        AbiType::UInt16 => i64::from(u16::from_be_bytes(take(index, ty, raw)?)),
        AbiType::Int32 | AbiType::Int => i64::from(i32::from_be_bytes(take(index, ty, raw)?)),
        AbiType::UInt32 | AbiType::UInt => i64::from(u32::from_be_bytes(take(index, ty, raw)?)),
        AbiType::Int64 => i64::from_be_bytes(take(index, ty, raw)?),
        AbiType::UInt64 => u64::from_be_bytes(take(index, ty, raw)?) as i64,
        AbiType::Void | AbiType::Unsupported(_) => {
            return Err(DecodeError::UnsupportedArgType {
                index,
                type_name: ty.name().to_string(),
            })
        }
    };
    Ok(PreparedArg::Word(word))
}

/// The leading `N` bytes of `raw`; extra trailing bytes are ignored.
fn take<const N: usize>(index: usize, ty: &AbiType, raw: &[u8]) -> Result<[u8; N], DecodeError> {
    raw.get(..N)
        .and_then(|prefix| <[u8; N]>::try_from(prefix).ok())
        .ok_or_else(|| DecodeError::ArgumentWidth {
            index,
            type_name: ty.name().to_string(),
            expected: N,
            got: raw.len(),
        })
}
