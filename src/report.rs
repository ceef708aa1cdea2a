// src/report.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs, path::Path};

use crate::error::Result;
use crate::region::RegionCode;

#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub region: RegionCode,
    pub url: String,
    pub size_bytes: Option<u64>,
    pub size: String,
    pub companies: usize,
    pub shareholders: usize,
    /// Set when the region failed under the isolate policy.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub regions: Vec<RegionSummary>,
    pub companies: usize,
    pub shareholders: usize,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &RegionSummary> {
        self.regions.iter().filter(|r| r.error.is_some())
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
