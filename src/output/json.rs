//! JSON output formatting

use serde_json::{json, Value as Json};

use crate::output::formatter::Report;
use crate::value::Value;

fn value_json(value: &Value) -> Json {
    // Non-finite floats have no JSON form; show them as text
    value.to_json().unwrap_or_else(|_| json!(value.to_string()))
}

pub fn format_json(report: &Report) -> String {
    let data: Json = match report {
        Report::Entries(mapping) => Json::Object(
            mapping
                .iter()
                .map(|(name, value)| (name.clone(), value_json(value)))
                .collect(),
        ),
        Report::Entry { name, value } => json!({ "name": name, "value": value_json(value) }),
        Report::Info(info) => serde_json::to_value(info).unwrap_or(json!(null)),
        Report::Message(s) => json!({ "message": s }),
    };

    serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Mapping;

    #[test]
    fn test_entries_object() {
        let mut mapping = Mapping::new();
        mapping.insert("a".into(), Value::Int(1));
        mapping.insert("nan".into(), Value::Float(f64::NAN));
        let parsed: Json = serde_json::from_str(&format_json(&Report::Entries(mapping))).unwrap();
        assert_eq!(parsed["a"], json!(1));
        assert_eq!(parsed["nan"], json!("NaN"));
    }
}
