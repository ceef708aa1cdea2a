// src/process/mod.rs
pub mod aggregate;
pub mod classify;
pub mod decode;
pub mod lines;
pub mod record;
pub mod schema;

pub use aggregate::{aggregate, RegionAggregator};
pub use classify::{classify, RecordKind};
pub use decode::{decode, SourceEncoding};
pub use lines::LineSplitter;
pub use record::{
    id_type_label, CompanyRecord, DatasetTables, RegionTables, ShareholderRecord,
    COMPANIES_TABLE, SHAREHOLDERS_TABLE,
};
pub use schema::{Field, FieldWidthSchema, COMPANY_SCHEMA, SHAREHOLDER_SCHEMA};
