// src/process/decode.rs

use std::str::FromStr;

use super::schema::{Field, FieldWidthSchema};
use crate::error::{Error, Result};

/// Character encoding of the source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceEncoding {
    /// ISO-8859-1, one byte per character. The registry publishes in this.
    #[default]
    Latin1,
    Utf8,
}

impl FromStr for SourceEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(SourceEncoding::Latin1),
            "utf8" | "utf-8" => Ok(SourceEncoding::Utf8),
            other => Err(Error::Config(format!("unknown encoding {:?}", other))),
        }
    }
}

impl SourceEncoding {
    fn decode(&self, bytes: &[u8], field: &'static str) -> Result<String> {
        match self {
            SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            SourceEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| Error::Encoding { line_no: 0, field }),
        }
    }
}

/// Slice `line` by byte position according to `schema` and trim each kept field.
///
/// The line must reach the final slot of the layout. A final slot cut short
/// (trailing padding stripped in transit) is accepted, and bytes past the span
/// are ignored.
pub fn decode(
    line: &[u8],
    schema: &FieldWidthSchema,
    encoding: SourceEncoding,
) -> Result<Vec<String>> {
    if line.len() < schema.last_offset() {
        return Err(Error::WidthMismatch {
            line_no: 0,
            required: schema.last_offset(),
            actual: line.len(),
        });
    }

    let mut out = Vec::with_capacity(schema.kept());
    let mut pos = 0;
    for field in schema.fields() {
        let end = pos + field.width();
        if let Field::Keep { name, .. } = field {
            let raw = &line[pos.min(line.len())..end.min(line.len())];
            out.push(encoding.decode(raw, name)?.trim().to_string());
        }
        pos = end;
    }
    Ok(out)
}
