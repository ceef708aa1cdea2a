// src/process/record.rs

use serde::Serialize;

use crate::region::RegionCode;

pub const COMPANIES_TABLE: &str = "companies";
pub const SHAREHOLDERS_TABLE: &str = "shareholders";

pub const COMPANY_COLUMNS: [&str; 3] = ["region", "national_id", "legal_name"];
pub const SHAREHOLDER_COLUMNS: [&str; 7] = [
    "region",
    "national_id",
    "id_type_indicator",
    "id_type_national_id",
    "qualification_code",
    "shareholder_name",
    "id_type_label",
];

/// Stored in place of an empty shareholder id; the registry leaves the field
/// blank where it means zero.
pub const MISSING_ID: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRecord {
    pub region: RegionCode,
    pub national_id: String,
    pub legal_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareholderRecord {
    pub region: RegionCode,
    /// National id of the company this shareholder belongs to.
    pub national_id: String,
    pub id_type_indicator: String,
    pub id_type_national_id: String,
    pub qualification_code: String,
    pub shareholder_name: String,
    pub id_type_label: Option<&'static str>,
}

/// Human label for the shareholder id-type indicator.
pub fn id_type_label(indicator: &str) -> Option<&'static str> {
    match indicator {
        "1" => Some("Legal Entity"),
        "2" => Some("Natural Person"),
        "3" => Some("Foreign Name"),
        _ => None,
    }
}

/// The two tables built from a single region file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTables {
    pub region: RegionCode,
    pub companies: Vec<CompanyRecord>,
    pub shareholders: Vec<ShareholderRecord>,
}

/// All regions concatenated, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetTables {
    pub companies: Vec<CompanyRecord>,
    pub shareholders: Vec<ShareholderRecord>,
}

impl DatasetTables {
    /// Append one region's rows after everything collected so far.
    pub fn concat(mut self, region: RegionTables) -> Self {
        self.companies.extend(region.companies);
        self.shareholders.extend(region.shareholders);
        self
    }
}

impl FromIterator<RegionTables> for DatasetTables {
    fn from_iter<I: IntoIterator<Item = RegionTables>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DatasetTables::default(), DatasetTables::concat)
    }
}
