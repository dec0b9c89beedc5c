// Path: crates/types/src/call.rs

//! The raw call input carried in a transaction's data field.

use crate::codec::{decode_uint, encode_uint, RlpItem};
use crate::error::DecodeError;

/// An undecoded call: the target function and its arguments as raw byte strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallInput {
    /// The transaction type.
    pub tx_type: u64,
    /// The name of the function to call.
    pub func_name: String,
    /// The arguments, still in their wire form.
    pub args: Vec<Vec<u8>>,
}

impl CallInput {
    /// Decodes `[txType, funcName, arg0, arg1, ...]`.
    pub fn decode(input: &[u8]) -> Result<Self, DecodeError> {
        if input.len() <= 1 {
            return Err(DecodeError::InvalidInput);
        }
        let items = RlpItem::decode(input)?.into_list("call input list")?;
        if items.len() < 2 {
            return Err(DecodeError::TooFewElements {
                expected: 2,
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
        let func_name =
            String::from_utf8(next("function name bytes")?).map_err(|_| DecodeError::InvalidUtf8)?;
        let args = items
            .map(|item| item.into_bytes("argument bytes"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tx_type,
            func_name,
            args,
        })
    }

    /// Encodes the call into its wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut items = Vec::with_capacity(self.args.len() + 2);
        items.push(RlpItem::Bytes(encode_uint(self.tx_type)));
        items.push(RlpItem::Bytes(self.func_name.as_bytes().to_vec()));
        items.extend(self.args.iter().cloned().map(RlpItem::Bytes));
        RlpItem::List(items).encode()
    }
}

/// Splits `name(arg0, arg1)` into the function name and its trimmed textual arguments.
///
/// A call without parentheses has no arguments. Surrounding double quotes are stripped
/// from each argument.
pub fn parse_call_text(text: &str) -> (String, Vec<String>) {
    let text = text.trim();
    let Some((name, rest)) = text.split_once('(') else {
        return (text.to_string(), Vec::new());
    };
    let inner = rest.rsplit_once(')').map_or(rest, |(inner, _)| inner);
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(|arg| arg.trim().trim_matches('"').to_string())
            .collect()
    };
    (name.trim().to_string(), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_roundtrip() {
        let call = CallInput {
            tx_type: 2,
            func_name: "transfer".into(),
            args: vec![b"alice".to_vec(), vec![0, 0, 0, 5]],
        };
        assert_eq!(CallInput::decode(&call.encode()).unwrap(), call);
    }

    #[test]
    fn test_rejects_short_input() {
        assert_eq!(CallInput::decode(&[]), Err(DecodeError::InvalidInput));
        assert_eq!(CallInput::decode(&[0xc0]), Err(DecodeError::InvalidInput));
    }

    #[test]
    fn test_rejects_single_element() {
        let input = RlpItem::List(vec![RlpItem::Bytes(vec![1]), RlpItem::Bytes(vec![])])
            .encode();
        assert!(CallInput::decode(&input).is_ok());

        let input = RlpItem::List(vec![RlpItem::Bytes(b"only".to_vec())]).encode();
        assert_eq!(
            CallInput::decode(&input),
            Err(DecodeError::TooFewElements {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_rejects_bad_function_name() {
        let input = RlpItem::List(vec![
            RlpItem::Bytes(vec![1]),
            RlpItem::Bytes(vec![0xff, 0xfe]),
        ])
        .encode();
        assert_eq!(CallInput::decode(&input), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_parse_call_text() {
        assert_eq!(parse_call_text("set()"), ("set".to_string(), vec![]));
        assert_eq!(parse_call_text("init"), ("init".to_string(), vec![]));
        assert_eq!(
            parse_call_text(" transfer( \"alice\" , 5 ) "),
            (
                "transfer".to_string(),
                vec!["alice".to_string(), "5".to_string()]
            )
        );
    }
}
