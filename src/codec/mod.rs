//! Codecs turning a name -> value mapping into file bytes and back
//!
//! Each format lives in its own submodule; [`Codec`] dispatches on the
//! configured [`FileFormat`] the same way the CLI output layer dispatches on
//! its output format.

pub mod csv;
pub mod json;
pub mod pickle;

use tracing::debug;

use crate::config::{CodecOptions, FileFormat};
use crate::error::Result;
use crate::value::Mapping;

/// Encoder/decoder for one configured format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Codec {
    pub format: FileFormat,
    pub options: CodecOptions,
}

impl Codec {
    pub fn new(format: FileFormat, options: CodecOptions) -> Self {
        Self { format, options }
    }

    /// Encode the full mapping in the configured format
    pub fn encode(&self, mapping: &Mapping) -> Result<Vec<u8>> {
        match self.format {
            FileFormat::Pickle => pickle::encode(mapping),
            FileFormat::Json => json::encode(mapping, &self.options),
            FileFormat::Csv => self::csv::encode(mapping, &self.options),
        }
    }

    /// Decode strictly in the configured format
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<Mapping, String> {
        decode_as(self.format, bytes, &self.options)
    }

    /// Decode bytes of unknown format.
    ///
    /// A file that starts like a binary store (magic header) or a JSON
    /// object (`{`) is decoded in that format only, and its error is final,
    /// so a damaged store is never read as a table. Anything else is tried
    /// in the configured format first, then in the remaining ones in
    /// pickle, JSON, CSV order. When nothing matches, the error of the
    /// configured format is reported. Returns the format that matched.
    pub fn detect(&self, bytes: &[u8]) -> std::result::Result<(Mapping, FileFormat), String> {
        if bytes.is_empty() {
            return Ok((Mapping::new(), self.format));
        }

        if let Some(format) = claimed_format(bytes) {
            let mapping = decode_as(format, bytes, &self.options)
                .map_err(|reason| format!("damaged {} store: {}", format, reason))?;
            return Ok((mapping, format));
        }

        let order = std::iter::once(self.format)
            .chain(FileFormat::ALL.into_iter().filter(|f| *f != self.format));
        let mut preferred_error = None;
        for format in order {
            match decode_as(format, bytes, &self.options) {
                Ok(mapping) => {
                    if format != self.format {
                        debug!(found = %format, configured = %self.format, "decoded with a different format");
                    }
                    return Ok((mapping, format));
                }
                Err(reason) if format == self.format => preferred_error = Some(reason),
                Err(_) => {}
            }
        }

        Err(preferred_error.unwrap_or_else(|| "file not in a supported format".to_string()))
    }
}

/// Format whose signature the bytes carry, if any
fn claimed_format(bytes: &[u8]) -> Option<FileFormat> {
    if pickle::has_header(bytes) {
        return Some(FileFormat::Pickle);
    }
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Some(FileFormat::Json),
        _ => None,
    }
}

fn decode_as(
    format: FileFormat,
    bytes: &[u8],
    options: &CodecOptions,
) -> std::result::Result<Mapping, String> {
    match format {
        FileFormat::Pickle => pickle::decode(bytes),
        FileFormat::Json => json::decode(bytes),
        FileFormat::Csv => self::csv::decode(bytes, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample() -> Mapping {
        let mut map = Mapping::new();
        map.insert("count".into(), Value::Int(5));
        map.insert("name".into(), Value::from("widget"));
        map
    }

    #[test]
    fn test_detect_each_format() {
        let reader = Codec::default();
        for format in FileFormat::ALL {
            let writer = Codec::new(format, CodecOptions::default());
            let bytes = writer.encode(&sample()).unwrap();
            let (mapping, found) = reader.detect(&bytes).unwrap();
            assert_eq!(found, format);
            assert_eq!(mapping, sample());
        }
    }

    #[test]
    fn test_detect_empty_input() {
        let (mapping, _) = Codec::default().detect(b"").unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_detect_garbage_reports_configured_error() {
        let codec = Codec::new(FileFormat::Json, CodecOptions::default());
        let err = codec.detect(b"\xff\xfe not a store").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_truncated_json_is_not_read_as_csv() {
        let csv = Codec::new(FileFormat::Csv, CodecOptions::default());
        for codec in [Codec::default(), csv] {
            let err = codec.detect(br#"{"count":5,"name":"x""#).unwrap_err();
            assert!(err.contains("json"));
        }
    }

    #[test]
    fn test_damaged_binary_is_not_read_as_csv() {
        let mut bytes = Codec::default().encode(&sample()).unwrap();
        bytes.truncate(10);
        bytes.extend_from_slice(b",x\n");
        let csv = Codec::new(FileFormat::Csv, CodecOptions::default());
        assert!(csv.detect(&bytes).is_err());
    }

    #[test]
    fn test_configured_format_tried_first() {
        let bytes = b"a,1,2\n";
        let csv = Codec::new(FileFormat::Csv, CodecOptions::default());
        assert!(csv.detect(bytes).unwrap_err().contains("3 fields"));
        let json = Codec::new(FileFormat::Json, CodecOptions::default());
        assert!(!json.detect(bytes).unwrap_err().contains("fields"));
    }

    #[test]
    fn test_strict_decode_rejects_other_format() {
        let json = Codec::new(FileFormat::Json, CodecOptions::default());
        let bytes = Codec::default().encode(&sample()).unwrap();
        assert!(json.decode(&bytes).is_err());
    }
}
