//! JSON codec

use crate::config::CodecOptions;
use crate::error::{PvarsError, Result};
use crate::value::{Mapping, Value};

pub fn encode(map: &Mapping, options: &CodecOptions) -> Result<Vec<u8>> {
    let mut object = serde_json::Map::with_capacity(map.len());
    for (name, value) in map {
        object.insert(name.clone(), value.to_json()?);
    }
    let object = serde_json::Value::Object(object);

    let encoded = if options.pretty {
        serde_json::to_vec_pretty(&object)
    } else {
        serde_json::to_vec(&object)
    };
    encoded.map_err(|e| PvarsError::EncodeFailure(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> std::result::Result<Mapping, String> {
    match serde_json::from_slice::<serde_json::Value>(bytes).map_err(|e| e.to_string())? {
        serde_json::Value::Object(object) => Ok(object
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .collect()),
        other => Err(format!("top-level JSON value is not an object: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_compact_and_pretty() {
        let mut map = Mapping::new();
        map.insert("k".into(), Value::Int(1));

        let compact = encode(&map, &CodecOptions::default()).unwrap();
        assert_eq!(compact, br#"{"k":1}"#);

        let pretty = CodecOptions {
            pretty: true,
            ..Default::default()
        };
        let indented = String::from_utf8(encode(&map, &pretty).unwrap()).unwrap();
        assert!(indented.contains('\n'));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut map = Mapping::new();
        map.insert("x".into(), Value::Float(f64::INFINITY));
        let err = encode(&map, &CodecOptions::default()).unwrap_err();
        assert!(matches!(err, PvarsError::UnrepresentableValue { .. }));
    }

    #[test]
    fn test_decode_requires_object() {
        assert!(decode(b"[1, 2]").is_err());
        assert!(decode(b"not json").is_err());
        let map = decode(br#"{"a": {"b": [1, 2.5]}}"#).unwrap();
        assert_eq!(
            map["a"].as_map().unwrap()["b"],
            Value::List(vec![Value::Int(1), Value::Float(2.5)])
        );
    }
}
