// src/config.rs

use std::{path::PathBuf, str::FromStr};
use url::Url;

use crate::error::{Error, Result};
use crate::process::SourceEncoding;
use crate::region::RegionCode;

pub const DEFAULT_INDEX_URL: &str = "http://idg.receita.fazenda.gov.br/orientacao/tributaria/\
     cadastros/cadastro-nacional-de-pessoas-juridicas-cnpj/dados-abertos-do-cnpj";
pub const DEFAULT_DATABASE: &str = "open_cnpj.duckdb";

/// What to do when one region fails to download or decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run; nothing is persisted.
    #[default]
    Abort,
    /// Record the failure, carry on, and persist the regions that loaded.
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(Error::Config(format!("unknown failure policy {:?}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub index_url: Url,
    pub database: PathBuf,
    pub encoding: SourceEncoding,
    pub failure_policy: FailurePolicy,
    /// Regions to load, always in declaration order.
    pub regions: Vec<RegionCode>,
    pub parquet_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: Url::parse(DEFAULT_INDEX_URL).expect("default index url is valid"),
            database: PathBuf::from(DEFAULT_DATABASE),
            encoding: SourceEncoding::default(),
            failure_policy: FailurePolicy::default(),
            regions: RegionCode::ALL.to_vec(),
            parquet_dir: None,
            report_path: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `CNPJ_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Config::default();

        if let Some(v) = var("CNPJ_INDEX_URL") {
            cfg.index_url = Url::parse(v.trim())
                .map_err(|e| Error::Config(format!("CNPJ_INDEX_URL {:?}: {}", v, e)))?;
        }
        if let Some(v) = var("CNPJ_DATABASE") {
            cfg.database = PathBuf::from(v);
        }
        if let Some(v) = var("CNPJ_ENCODING") {
            cfg.encoding = v.parse()?;
        }
        if let Some(v) = var("CNPJ_FAILURE_POLICY") {
            cfg.failure_policy = v.parse()?;
        }
        if let Some(v) = var("CNPJ_REGIONS") {
            cfg.regions = parse_regions(&v)?;
        }
        cfg.parquet_dir = var("CNPJ_PARQUET_DIR").map(PathBuf::from);
        cfg.report_path = var("CNPJ_REPORT_PATH").map(PathBuf::from);
        Ok(cfg)
    }
}

/// Comma-separated codes, deduplicated and put back in declaration order.
pub fn parse_regions(list: &str) -> Result<Vec<RegionCode>> {
    let mut regions = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<RegionCode>>>()?;
    regions.sort();
    regions.dedup();
    if regions.is_empty() {
        return Err(Error::Config("CNPJ_REGIONS names no region".into()));
    }
    Ok(regions)
}
