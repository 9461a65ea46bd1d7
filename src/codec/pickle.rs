//! Binary codec, the least restrictive format
//!
//! Layout: `PVARS\0`, one version byte, then a bincode body.

use serde::{Deserialize, Serialize};

use crate::error::{PvarsError, Result};
use crate::value::{Mapping, Value};

const MAGIC: &[u8] = b"PVARS\0";
const VERSION: u8 = 1;

/// Tagged mirror of [`Value`]; maps are kept as pair lists to preserve order.
#[derive(Debug, Serialize, Deserialize)]
enum Repr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Repr>),
    Map(Vec<(String, Repr)>),
}

impl From<&Value> for Repr {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Repr::Null,
            Value::Bool(b) => Repr::Bool(*b),
            Value::Int(i) => Repr::Int(*i),
            Value::Float(f) => Repr::Float(*f),
            Value::Str(s) => Repr::Str(s.clone()),
            Value::List(items) => Repr::List(items.iter().map(Repr::from).collect()),
            Value::Map(map) => Repr::Map(pairs(map)),
        }
    }
}

impl From<Repr> for Value {
    fn from(repr: Repr) -> Self {
        match repr {
            Repr::Null => Value::Null,
            Repr::Bool(b) => Value::Bool(b),
            Repr::Int(i) => Value::Int(i),
            Repr::Float(f) => Value::Float(f),
            Repr::Str(s) => Value::Str(s),
            Repr::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Repr::Map(entries) => Value::Map(mapping(entries)),
        }
    }
}

fn pairs(map: &Mapping) -> Vec<(String, Repr)> {
    map.iter().map(|(k, v)| (k.clone(), Repr::from(v))).collect()
}

fn mapping(entries: Vec<(String, Repr)>) -> Mapping {
    entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

/// The bytes start with the binary store header
pub fn has_header(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

pub fn encode(map: &Mapping) -> Result<Vec<u8>> {
    let body = bincode::serialize(&pairs(map))
        .map_err(|e| PvarsError::EncodeFailure(e.to_string()))?;
    let mut bytes = Vec::with_capacity(MAGIC.len() + 1 + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> std::result::Result<Mapping, String> {
    let body = bytes
        .strip_prefix(MAGIC)
        .ok_or_else(|| "missing binary store header".to_string())?;
    match body.split_first() {
        Some((&VERSION, rest)) => {
            let entries: Vec<(String, Repr)> =
                bincode::deserialize(rest).map_err(|e| e.to_string())?;
            Ok(mapping(entries))
        }
        Some((version, _)) => Err(format!("unsupported binary store version {}", version)),
        None => Err("truncated binary store header".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_values_survive() {
        let mut inner = Mapping::new();
        inner.insert("z".into(), Value::List(vec![Value::Null, Value::Float(0.5)]));
        inner.insert("a".into(), Value::Bool(false));
        let mut map = Mapping::new();
        map.insert("cfg".into(), Value::Map(inner));
        map.insert("n".into(), Value::Int(-7));

        let decoded = decode(&encode(&map).unwrap()).unwrap();
        assert_eq!(decoded, map);
        let keys: Vec<_> = decoded["cfg"].as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_header_checked() {
        assert!(decode(b"{\"a\": 1}").is_err());
        assert!(decode(b"PVARS\0").is_err());
        assert!(decode(b"PVARS\0\x09").unwrap_err().contains("version 9"));
    }

    #[test]
    fn test_truncated_body() {
        let mut map = Mapping::new();
        map.insert("text".into(), Value::from("a fairly long string value"));
        let bytes = encode(&map).unwrap();
        assert!(decode(&bytes[..bytes.len() - 4]).is_err());
    }
}
