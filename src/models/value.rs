use std::collections::BTreeMap;
use std::fmt;

/// Dictionary key. Binary keys order before text keys, matching the canonical wire order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Binary(Vec<u8>),
    Text(String),
}

impl Key {
    pub fn text(value: impl Into<String>) -> Self {
        Key::Text(value.into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Binary(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Key::Text(text) => f.write_str(text),
        }
    }
}

/// Generic decoded on-chain value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Binary(Vec<u8>),
    Text(String),
    List(Vec<EncodedValue>),
    Dictionary(BTreeMap<Key, EncodedValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Binary,
    Text,
    List,
    Dictionary,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Binary => "Binary",
            ValueKind::Text => "Text",
            ValueKind::List => "List",
            ValueKind::Dictionary => "Dictionary",
        };
        f.write_str(name)
    }
}

impl EncodedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            EncodedValue::Null => ValueKind::Null,
            EncodedValue::Boolean(_) => ValueKind::Boolean,
            EncodedValue::Integer(_) => ValueKind::Integer,
            EncodedValue::Binary(_) => ValueKind::Binary,
            EncodedValue::Text(_) => ValueKind::Text,
            EncodedValue::List(_) => ValueKind::List,
            EncodedValue::Dictionary(_) => ValueKind::Dictionary,
        }
    }

    #[cfg(test)]
    pub fn text(value: impl Into<String>) -> Self {
        EncodedValue::Text(value.into())
    }

    /// Builds a dictionary with text keys.
    #[cfg(test)]
    pub fn dictionary<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, EncodedValue)>,
        K: Into<String>,
    {
        EncodedValue::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (Key::Text(key.into()), value))
                .collect(),
        )
    }
}

impl From<i64> for EncodedValue {
    fn from(value: i64) -> Self {
        EncodedValue::Integer(value)
    }
}

impl From<bool> for EncodedValue {
    fn from(value: bool) -> Self {
        EncodedValue::Boolean(value)
    }
}

impl From<&str> for EncodedValue {
    fn from(value: &str) -> Self {
        EncodedValue::Text(value.to_string())
    }
}

impl From<Vec<EncodedValue>> for EncodedValue {
    fn from(items: Vec<EncodedValue>) -> Self {
        EncodedValue::List(items)
    }
}
