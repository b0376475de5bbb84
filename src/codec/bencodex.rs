//! Bencodex codec.
//!
//! Grammar: `n` null, `t`/`f` boolean, `i<int>e` integer, `<len>:<bytes>` binary,
//! `u<len>:<utf8>` text, `l...e` list, `d...e` dictionary (binary or text keys).

use std::collections::BTreeMap;

use crate::constants::MAX_VALUE_NESTING_DEPTH;
use crate::error::{AppError, Result};
use crate::models::value::{EncodedValue, Key};

fn codec_error(offset: usize, reason: impl AsRef<str>) -> AppError {
    AppError::Codec(format!("offset {}: {}", offset, reason.as_ref()))
}

/// Decodes a complete value. Trailing bytes are rejected.
pub fn decode(bytes: &[u8]) -> Result<EncodedValue> {
    let mut reader = Reader { bytes, pos: 0 };
    let value = reader.read_value(0)?;
    if reader.pos != bytes.len() {
        return Err(codec_error(reader.pos, "trailing bytes after value"));
    }
    Ok(value)
}

/// Decodes hex text (optionally `0x`-prefixed) as returned by the state service.
pub fn decode_hex(text: &str) -> Result<EncodedValue> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| AppError::Codec(format!("invalid hex: {}", e)))?;
    decode(&bytes)
}

/// Canonical encoding, used to build fixtures for the decoder.
#[cfg(test)]
pub fn encode(value: &EncodedValue) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, &mut out);
    out
}

#[cfg(test)]
pub fn encode_hex(value: &EncodedValue) -> String {
    hex::encode(encode(value))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Result<u8> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| codec_error(self.pos, "unexpected end of input"))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| codec_error(self.pos, format!("needs {} more bytes", len)))?;
        let bytes = self.bytes;
        let slice = &bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_until(&mut self, terminator: u8) -> Result<&'a [u8]> {
        let bytes = self.bytes;
        let start = self.pos;
        let offset = bytes[start..]
            .iter()
            .position(|b| *b == terminator)
            .ok_or_else(|| {
                codec_error(start, format!("missing terminator {:?}", terminator as char))
            })?;
        self.pos = start + offset + 1;
        Ok(&bytes[start..start + offset])
    }

    fn read_length(&mut self) -> Result<usize> {
        let start = self.pos;
        let digits = self.read_until(b':')?;
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(codec_error(start, "invalid length prefix"));
        }
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| codec_error(start, "length prefix out of range"))
    }

    fn read_value(&mut self, depth: usize) -> Result<EncodedValue> {
        if depth > MAX_VALUE_NESTING_DEPTH {
            return Err(codec_error(self.pos, "nesting too deep"));
        }

        let start = self.pos;
        match self.peek()? {
            b'n' => {
                self.pos += 1;
                Ok(EncodedValue::Null)
            }
            b't' => {
                self.pos += 1;
                Ok(EncodedValue::Boolean(true))
            }
            b'f' => {
                self.pos += 1;
                Ok(EncodedValue::Boolean(false))
            }
            b'i' => {
                self.pos += 1;
                let digits = self.read_until(b'e')?;
                parse_integer(digits)
                    .map(EncodedValue::Integer)
                    .ok_or_else(|| codec_error(start, "invalid integer"))
            }
            b'u' => {
                self.pos += 1;
                let len = self.read_length()?;
                let raw = self.take(len)?;
                let text = std::str::from_utf8(raw)
                    .map_err(|e| codec_error(start, format!("invalid utf-8 text: {}", e)))?;
                Ok(EncodedValue::Text(text.to_string()))
            }
            b'0'..=b'9' => {
                let len = self.read_length()?;
                Ok(EncodedValue::Binary(self.take(len)?.to_vec()))
            }
            b'l' => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.peek()? != b'e' {
                    items.push(self.read_value(depth + 1)?);
                }
                self.pos += 1;
                Ok(EncodedValue::List(items))
            }
            b'd' => {
                self.pos += 1;
                let mut entries = BTreeMap::new();
                while self.peek()? != b'e' {
                    let key_offset = self.pos;
                    let key = match self.read_value(depth + 1)? {
                        EncodedValue::Binary(bytes) => Key::Binary(bytes),
                        EncodedValue::Text(text) => Key::Text(text),
                        other => {
                            return Err(codec_error(
                                key_offset,
                                format!("dictionary key must be Binary or Text, got {}", other.kind()),
                            ))
                        }
                    };
                    let value = self.read_value(depth + 1)?;
                    if entries.insert(key, value).is_some() {
                        return Err(codec_error(key_offset, "duplicate dictionary key"));
                    }
                }
                self.pos += 1;
                Ok(EncodedValue::Dictionary(entries))
            }
            other => Err(codec_error(start, format!("unexpected byte 0x{:02x}", other))),
        }
    }
}

// Rejects empty digits, leading zeros and negative zero.
fn parse_integer(digits: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(digits).ok()?;
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if unsigned.len() > 1 && unsigned.starts_with('0') {
        return None;
    }
    if text == "-0" {
        return None;
    }
    text.parse::<i64>().ok()
}

#[cfg(test)]
fn write_value(value: &EncodedValue, out: &mut Vec<u8>) {
    match value {
        EncodedValue::Null => out.push(b'n'),
        EncodedValue::Boolean(true) => out.push(b't'),
        EncodedValue::Boolean(false) => out.push(b'f'),
        EncodedValue::Integer(n) => {
            out.push(b'i');
            out.extend_from_slice(n.to_string().as_bytes());
            out.push(b'e');
        }
        EncodedValue::Binary(bytes) => write_binary(bytes, out),
        EncodedValue::Text(text) => write_text(text, out),
        EncodedValue::List(items) => {
            out.push(b'l');
            for item in items {
                write_value(item, out);
            }
            out.push(b'e');
        }
        EncodedValue::Dictionary(entries) => {
            // BTreeMap order is the canonical key order
            out.push(b'd');
            for (key, value) in entries {
                match key {
                    Key::Binary(bytes) => write_binary(bytes, out),
                    Key::Text(text) => write_text(text, out),
                }
                write_value(value, out);
            }
            out.push(b'e');
        }
    }
}

#[cfg(test)]
fn write_binary(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

#[cfg(test)]
fn write_text(text: &str, out: &mut Vec<u8>) {
    out.push(b'u');
    out.extend_from_slice(text.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode(b"n").unwrap(), EncodedValue::Null);
        assert_eq!(decode(b"t").unwrap(), EncodedValue::Boolean(true));
        assert_eq!(decode(b"i-42e").unwrap(), EncodedValue::Integer(-42));
        assert_eq!(decode(b"i0e").unwrap(), EncodedValue::Integer(0));
        assert_eq!(decode(b"u5:hello").unwrap(), EncodedValue::text("hello"));
        assert_eq!(
            decode(b"3:\x01\x02\x03").unwrap(),
            EncodedValue::Binary(vec![1, 2, 3])
        );
        assert_eq!(decode(b"0:").unwrap(), EncodedValue::Binary(vec![]));
    }

    #[test]
    fn decodes_nested_list() {
        let value = decode(b"lu1:ai1elnee").unwrap();
        assert_eq!(
            value,
            EncodedValue::List(vec![
                EncodedValue::text("a"),
                EncodedValue::Integer(1),
                EncodedValue::List(vec![EncodedValue::Null]),
            ])
        );
    }

    #[test]
    fn dictionary_encodes_in_canonical_key_order() {
        let bytes = b"d3:abcnu4:nameteo";
        // trailing garbage after the dictionary
        assert!(decode(bytes).is_err());

        let canonical = b"d3:abcnu4:namete";
        let value = decode(canonical).unwrap();
        match &value {
            EncodedValue::Dictionary(map) => {
                assert_eq!(map.get(&Key::Binary(b"abc".to_vec())), Some(&EncodedValue::Null));
                assert_eq!(map.get(&Key::text("name")), Some(&EncodedValue::Boolean(true)));
            }
            other => panic!("expected dictionary, got {other:?}"),
        }
        assert_eq!(encode(&value), canonical.to_vec());
    }

    #[test]
    fn rejects_malformed_integers() {
        assert!(decode(b"i01e").is_err());
        assert!(decode(b"i-0e").is_err());
        assert!(decode(b"ie").is_err());
        assert!(decode(b"i12").is_err());
        assert!(decode(b"i99999999999999999999e").is_err());
    }

    #[test]
    fn rejects_truncated_and_trailing_input() {
        assert!(decode(b"u3:ab").is_err());
        assert!(decode(b"l").is_err());
        assert!(decode(b"nn").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn rejects_non_key_dictionary_keys() {
        assert!(decode(b"dlenne").is_err());
        assert!(decode(b"du1:ani1eu1:ante").is_err());
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut bytes = vec![b'l'; MAX_VALUE_NESTING_DEPTH + 2];
        bytes.extend(vec![b'e'; MAX_VALUE_NESTING_DEPTH + 2]);
        assert!(matches!(decode(&bytes), Err(AppError::Codec(_))));
    }

    #[test]
    fn decode_hex_accepts_prefix() {
        assert_eq!(decode_hex("0x6e").unwrap(), EncodedValue::Null);
        assert_eq!(decode_hex("693765").unwrap(), EncodedValue::Integer(7));
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn encode_hex_matches_wire_bytes() {
        let value = EncodedValue::List(vec![EncodedValue::Integer(7), EncodedValue::Null]);
        assert_eq!(encode_hex(&value), hex::encode(b"li7ene"));
    }
}
