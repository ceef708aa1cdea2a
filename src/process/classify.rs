// src/process/classify.rs

use super::schema::{FieldWidthSchema, COMPANY_SCHEMA, SHAREHOLDER_SCHEMA};
use crate::error::{Error, Result};

/// Record shapes carried by a region file, keyed by the leading type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Company,
    Shareholder,
}

impl RecordKind {
    pub const fn code(&self) -> &'static str {
        match self {
            RecordKind::Company => "01",
            RecordKind::Shareholder => "02",
        }
    }

    pub fn schema(&self) -> &'static FieldWidthSchema {
        match self {
            RecordKind::Company => &COMPANY_SCHEMA,
            RecordKind::Shareholder => &SHAREHOLDER_SCHEMA,
        }
    }
}

/// Decide which layout applies to `line` from its first two bytes.
pub fn classify(line: &[u8]) -> Result<RecordKind> {
    [RecordKind::Company, RecordKind::Shareholder]
        .into_iter()
        .find(|kind| line.starts_with(kind.code().as_bytes()))
        .ok_or_else(|| Error::UnknownRecordType {
            line_no: 0,
            line: String::from_utf8_lossy(line).into_owned(),
        })
}
