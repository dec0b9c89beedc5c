// Path: crates/types/src/codec.rs

//! Defines the nested byte-string/list codec used for contract bundles and call inputs.
//!
//! The wire format is RLP: every item is either a byte string or a list of items, each
//! prefixed by a length header. Header parsing and emission is delegated to `alloy-rlp`,
//! which also enforces canonical headers. This module adds the untyped item tree on top,
//! since both the bundle and the call input are heterogeneous lists whose element types
//! are only known after the ABI has been consulted.

use crate::error::DecodeError;
use alloy_rlp::{Encodable, Header};

/// Lists nested deeper than this are rejected instead of recursing further.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A decoded RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte string.
    Bytes(Vec<u8>),
    /// A list of items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Decodes exactly one item from `input`. Trailing bytes are an error.
    pub fn decode(input: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = input;
        let item = Self::decode_from(&mut buf, 0)?;
        if !buf.is_empty() {
            return Err(DecodeError::TrailingBytes(buf.len()));
        }
        Ok(item)
    }

    fn decode_from(buf: &mut &[u8], depth: usize) -> Result<Self, DecodeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(DecodeError::Rlp(format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        let header = Header::decode(buf).map_err(|e| DecodeError::Rlp(e.to_string()))?;
        if buf.len() < header.payload_length {
            return Err(DecodeError::Rlp("input too short".into()));
        }
        let (payload, rest) = buf.split_at(header.payload_length);
        *buf = rest;

        if !header.list {
            return Ok(Self::Bytes(payload.to_vec()));
        }
        let mut items = Vec::new();
        let mut inner = payload;
        while !inner.is_empty() {
            items.push(Self::decode_from(&mut inner, depth + 1)?);
        }
        Ok(Self::List(items))
    }

    /// Encodes the item into its canonical wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Bytes(bytes) => bytes.as_slice().encode(out),
            Self::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    item.encode_into(&mut payload);
                }
                Header {
                    list: true,
                    payload_length: payload.len(),
                }
                .encode(out);
                out.extend_from_slice(&payload);
            }
        }
    }

    /// Returns the list elements, or an error naming what was expected instead.
    pub fn into_list(self, expected: &'static str) -> Result<Vec<RlpItem>, DecodeError> {
        match self {
            Self::List(items) => Ok(items),
            Self::Bytes(_) => Err(DecodeError::UnexpectedShape(expected)),
        }
    }

    /// Returns the byte string payload, or an error naming what was expected instead.
    pub fn into_bytes(self, expected: &'static str) -> Result<Vec<u8>, DecodeError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::List(_) => Err(DecodeError::UnexpectedShape(expected)),
        }
    }
}

/// Interprets a byte string as a big-endian unsigned integer of at most 8 bytes.
pub fn decode_uint(bytes: &[u8]) -> Result<u64, DecodeError> {
    if bytes.len() > 8 {
        return Err(DecodeError::IntegerOverflow(bytes.len()));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Encodes an unsigned integer as a minimal big-endian byte string (zero is empty).
pub fn encode_uint(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes.iter().skip(skip).copied().collect()
}
