// Path: crates/cli/src/util.rs

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Decodes hex text, with or without a `0x` prefix.
pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).with_context(|| format!("'{text}' is not valid hex"))
}

/// Reads a file holding either raw bytes or the hex text printed by `cvm bundle`.
pub fn read_binary_or_hex(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match std::str::from_utf8(&bytes) {
        Ok(text) if !text.trim().is_empty() && is_hex_text(text.trim()) => decode_hex(text),
        _ => Ok(bytes),
    }
}

fn is_hex_text(text: &str) -> bool {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}
