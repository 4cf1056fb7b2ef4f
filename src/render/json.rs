//! JSON rendering for records and reports.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize records, a report or a batch of outcomes to a JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Serialize to a writer, with a trailing newline.
pub fn write_json<T, W>(value: &T, format: JsonFormat, mut writer: W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    match format {
        JsonFormat::Pretty => serde_json::to_writer_pretty(&mut writer, value)?,
        JsonFormat::Compact => serde_json::to_writer(&mut writer, value)?,
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DocumentOutcome, DocumentReport};

    fn outcomes() -> Vec<DocumentOutcome> {
        vec![
            DocumentOutcome::Parsed(DocumentReport::from_pages("a.pdf", Vec::new())),
            DocumentOutcome::Failed {
                document: "b.pdf".to_string(),
                reason: "Document is encrypted".to_string(),
            },
        ]
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&outcomes(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"status\": \"parsed\""));
        assert!(json.contains("\"status\": \"failed\""));
        assert!(json.contains('\n')); // Pretty has newlines
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&outcomes(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n')); // Compact has no newlines
        assert!(json.contains("\"document\":\"b.pdf\""));
    }

    #[test]
    fn test_write_json() {
        let mut buf = Vec::new();
        write_json(&outcomes(), JsonFormat::Compact, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
