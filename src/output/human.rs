//! Human-readable output formatting

use bytesize::ByteSize;

use crate::output::formatter::Report;

pub fn format_human(report: &Report) -> String {
    match report {
        Report::Entries(mapping) => {
            if mapping.is_empty() {
                return "No entries".to_string();
            }
            let width = mapping.keys().map(|k| k.len()).max().unwrap_or(0).min(30);
            let mut output = String::from("Entries\n-------\n");
            for (name, value) in mapping {
                output.push_str(&format!(
                    "{:<width$}  {:<6}  {}\n",
                    name,
                    value.type_name(),
                    value,
                    width = width
                ));
            }
            output
        }
        Report::Entry { name, value } => format!("{} = {}", name, value),
        Report::Info(info) => {
            let mut output = String::from("Store Information\n-----------------\n");
            output.push_str(&format!("Path:    {}\n", info.path.display()));
            if !info.exists {
                output.push_str("Status:  not created yet\n");
                return output;
            }
            output.push_str(&format!(
                "Format:  {}\n",
                info.format
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "empty".to_string())
            ));
            output.push_str(&format!("Entries: {}\n", info.entries));
            output.push_str(&format!("Size:    {}\n", ByteSize(info.size)));
            output
        }
        Report::Message(message) => message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileFormat;
    use crate::output::formatter::StoreInfo;
    use crate::value::{Mapping, Value};
    use std::path::PathBuf;

    #[test]
    fn test_entries_table() {
        let mut mapping = Mapping::new();
        mapping.insert("count".into(), Value::Int(5));
        let text = format_human(&Report::Entries(mapping));
        assert!(text.contains("count"));
        assert!(text.contains("int"));
        assert!(text.contains('5'));
    }

    #[test]
    fn test_empty_entries() {
        assert_eq!(format_human(&Report::Entries(Mapping::new())), "No entries");
    }

    #[test]
    fn test_info() {
        let info = StoreInfo {
            path: PathBuf::from("/tmp/x.pdb"),
            exists: true,
            format: Some(FileFormat::Json),
            entries: 2,
            size: 2048,
        };
        let text = format_human(&Report::Info(info));
        assert!(text.contains("json"));
        assert!(text.contains("Entries: 2"));
    }
}
