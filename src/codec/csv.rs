//! CSV codec: one `name,value` record per entry, no header row
//!
//! Fields carry no type information, so each value is typed by inference on
//! load. Values that would not infer back to themselves are refused on save.

use crate::config::CodecOptions;
use crate::error::{PvarsError, Result};
use crate::value::{Mapping, Value};

const FORMAT: &str = "csv";

pub fn encode(map: &Mapping, options: &CodecOptions) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for (name, value) in map {
        if name.trim_start().starts_with('{') {
            // Would make the file look like a JSON object on load
            return Err(PvarsError::unrepresentable(
                FORMAT,
                format!("name '{}' starts with '{{'", name),
            ));
        }
        let field = field_for(name, value)?;
        writer
            .write_record([name.as_str(), field.as_str()])
            .map_err(|e| PvarsError::EncodeFailure(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| PvarsError::EncodeFailure(e.to_string()))
}

pub fn decode(bytes: &[u8], options: &CodecOptions) -> std::result::Result<Mapping, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(bytes);

    let mut map = Mapping::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() != 2 {
            return Err(format!(
                "record {} has {} fields, expected 2",
                index + 1,
                record.len()
            ));
        }
        map.insert(record[0].to_string(), infer(&record[1]));
    }
    Ok(map)
}

fn field_for(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(format!("{:?}", f)),
        Value::Str(s) => match infer(s) {
            Value::Str(_) => Ok(s.clone()),
            other => Err(PvarsError::unrepresentable(
                FORMAT,
                format!("string {:?} in '{}' would load back as {}", s, name, other.type_name()),
            )),
        },
        Value::Null | Value::List(_) | Value::Map(_) => Err(PvarsError::unrepresentable(
            FORMAT,
            format!("'{}' holds a {}, only scalars fit a flat table", name, value.type_name()),
        )),
    }
}

fn infer(field: &str) -> Value {
    match field {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Str(field.to_string())
}
