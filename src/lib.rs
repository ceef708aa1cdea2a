pub mod config;
pub mod duck;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod region;
pub mod report;

pub use config::{Config, FailurePolicy};
pub use error::{Error, Result};
pub use pipeline::{DatasetPipeline, RegionOutcome};
pub use region::RegionCode;
