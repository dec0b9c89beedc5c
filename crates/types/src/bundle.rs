// Path: crates/types/src/bundle.rs

//! The contract bundle: the unit stored on-chain for a deployed contract.

use crate::codec::{decode_uint, encode_uint, RlpItem};
use crate::error::DecodeError;

/// A decoded contract bundle `[txType, bytecode, abiJson]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContractBundle {
    /// The transaction type recorded at deploy time.
    pub tx_type: u64,
    /// The module bytecode.
    pub bytecode: Vec<u8>,
    /// The ABI description as raw JSON bytes.
    pub abi_json: Vec<u8>,
}

impl ContractBundle {
    /// Decodes a bundle from the stored contract code.
    ///
    /// Elements past the third are ignored.
    pub fn decode(code: &[u8]) -> Result<Self, DecodeError> {
        let items = RlpItem::decode(code)?.into_list("bundle list")?;
        if items.len() < 3 {
            return Err(DecodeError::TooFewElements {
                expected: 3,
                got: items.len(),
            });
        }
        let mut items = items.into_iter();
        let mut next = |what: &'static str| {
            items
                .next()
                .ok_or(DecodeError::UnexpectedShape(what))
                .and_then(|item| item.into_bytes(what))
        };
        let tx_type = decode_uint(&next("tx type bytes")?)?;
        let bytecode = next("bytecode bytes")?;
        let abi_json = next("abi bytes")?;
        Ok(Self {
            tx_type,
            bytecode,
            abi_json,
        })
    }

    /// Encodes the bundle into its stored form.
    pub fn encode(&self) -> Vec<u8> {
        RlpItem::List(vec![
            RlpItem::Bytes(encode_uint(self.tx_type)),
            RlpItem::Bytes(self.bytecode.clone()),
            RlpItem::Bytes(self.abi_json.clone()),
        ])
        .encode()
    }
}
