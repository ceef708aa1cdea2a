// src/error.rs

use thiserror::Error;

use crate::region::RegionCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The index page has no `<table>` to read region links from.
    #[error("index page has no table of dataset links")]
    MissingTable,

    /// The catalog has no link for this region.
    #[error("no dataset link for region {0}")]
    MissingLink(RegionCode),

    /// Range request unsupported or answered with an unusable header.
    #[error("size probe failed: {0}")]
    SizeProbe(String),

    #[error("unknown record type at line {line_no}: {line:?}")]
    UnknownRecordType { line_no: usize, line: String },

    /// The line ends before the last field of its layout begins.
    #[error("line {line_no} is {actual} bytes, record layout needs at least {required}")]
    WidthMismatch {
        line_no: usize,
        required: usize,
        actual: usize,
    },

    #[error("line {line_no}: field {field} is not valid text in the source encoding")]
    Encoding { line_no: usize, field: &'static str },

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("persisting tables: {0}")]
    Persistence(#[from] duckdb::Error),

    #[error("parquet export: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("configuration: {0}")]
    Config(String),

    /// Every requested region failed under the isolate policy.
    #[error("no region loaded successfully")]
    NothingLoaded,

    /// Wraps any failure raised while loading a single region.
    #[error("region {region}: {source}")]
    RegionFailed {
        region: RegionCode,
        #[source]
        source: Box<Error>,
    },
}

impl From<arrow::error::ArrowError> for Error {
    fn from(e: arrow::error::ArrowError) -> Self {
        Error::Export(e.to_string())
    }
}

impl From<parquet::errors::ParquetError> for Error {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Error::Export(e.to_string())
    }
}

impl Error {
    /// Attach a 1-based line number to a line-level failure.
    pub(crate) fn at_line(self, line_no: usize) -> Self {
        match self {
            Error::UnknownRecordType { line, .. } => Error::UnknownRecordType { line_no, line },
            Error::WidthMismatch {
                required, actual, ..
            } => Error::WidthMismatch {
                line_no,
                required,
                actual,
            },
            Error::Encoding { field, .. } => Error::Encoding { line_no, field },
            other => other,
        }
    }
}
