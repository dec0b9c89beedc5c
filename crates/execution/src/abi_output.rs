// Path: crates/execution/src/abi_output.rs

//! Encodes the raw result word of an entry point into host return bytes.
//!
//! Every scalar is one 32-byte word holding the big-endian result word, left-padded
//! with zeros. A string is an offset word (always 32), a length word and the payload
//! zero-padded to a multiple of 32 bytes.

use cvm_api::LinearMemory;
use cvm_types::abi::AbiType;
use cvm_types::error::EncodingError;

/// The size of one encoded word.
pub const WORD_SIZE: usize = 32;

/// A 32-byte word holding `value` in its low eight bytes.
fn word(value: u64) -> [u8; WORD_SIZE] {
    let mut out = [0u8; WORD_SIZE];
    for (dst, src) in out.iter_mut().skip(WORD_SIZE - 8).zip(value.to_be_bytes()) {
        *dst = src;
    }
    out
}

/// Encodes `raw_word` according to `return_type`.
///
/// Signed types and `void` carry the raw word unchanged. Narrow unsigned types keep
/// only their low bits, since engines widen 32-bit results with sign extension.
/// For `string`, `raw_word` is the offset of a NUL-terminated string in `memory`.
pub fn encode_return<M: LinearMemory + ?Sized>(
    return_type: &AbiType,
    raw_word: i64,
    memory: &M,
) -> Result<Vec<u8>, EncodingError> {
    let encoded = match return_type {
        AbiType::Void
        | AbiType::Int8
        | AbiType::Int16
        | AbiType::Int32
        | AbiType::Int
        | AbiType::Int64
        | AbiType::UInt64 => word(raw_word as u64).to_vec(),
        AbiType::Bool => word(u64::from(raw_word != 0)).to_vec(),
        AbiType::UInt8 => word(u64::from(raw_word as u8)).to_vec(),
        AbiType::UInt16 => word(u64::from(raw_word as u16)).to_vec(),
        AbiType::UInt32 | AbiType::UInt => word(u64::from(raw_word as u32)).to_vec(),
        AbiType::String => {
            let payload = memory
                .read_c_string(raw_word)
                .map_err(|e| EncodingError::Memory(e.to_string()))?;
            let padded = payload.len().div_ceil(WORD_SIZE) * WORD_SIZE;
            let mut out = Vec::with_capacity(2 * WORD_SIZE + padded);
            out.extend_from_slice(&word(WORD_SIZE as u64));
            out.extend_from_slice(&word(payload.len() as u64));
            out.extend_from_slice(&payload);
            out.resize(2 * WORD_SIZE + padded, 0);
            out
        }
        AbiType::Unsupported(name) => {
            return Err(EncodingError::UnsupportedReturnType(name.clone()))
        }
    };
    Ok(encoded)
}
