// src/process/aggregate.rs

use tracing::trace;

use super::classify::{classify, RecordKind};
use super::decode::{decode, SourceEncoding};
use super::record::{
    id_type_label, CompanyRecord, RegionTables, ShareholderRecord, MISSING_ID,
};
use crate::error::Result;
use crate::region::RegionCode;

/// Builds one region's company and shareholder tables from its lines.
///
/// Lines are fed one at a time so a download can be decoded while it streams.
/// The first line that fails to classify or decode poisons the whole region:
/// the error is returned and the caller is expected to drop the aggregator.
#[derive(Debug)]
pub struct RegionAggregator {
    region: RegionCode,
    encoding: SourceEncoding,
    line_no: usize,
    companies: Vec<CompanyRecord>,
    shareholders: Vec<ShareholderRecord>,
}

impl RegionAggregator {
    pub fn new(region: RegionCode, encoding: SourceEncoding) -> Self {
        Self {
            region,
            encoding,
            line_no: 0,
            companies: Vec::new(),
            shareholders: Vec::new(),
        }
    }

    pub fn lines_seen(&self) -> usize {
        self.line_no
    }

    pub fn push_line(&mut self, line: &[u8]) -> Result<()> {
        self.line_no += 1;
        let line_no = self.line_no;
        self.route(line).map_err(|e| e.at_line(line_no))
    }

    fn route(&mut self, line: &[u8]) -> Result<()> {
        let kind = classify(line)?;
        // field 0 is the type code; it only served classification
        let mut fields = decode(line, kind.schema(), self.encoding)?
            .into_iter()
            .skip(1);
        let mut next = || fields.next().unwrap_or_default();

        match kind {
            RecordKind::Company => self.companies.push(CompanyRecord {
                region: self.region,
                national_id: next(),
                legal_name: next(),
            }),
            RecordKind::Shareholder => {
                let national_id = next();
                let id_type_indicator = next();
                let mut id_type_national_id = next();
                if id_type_national_id.is_empty() {
                    id_type_national_id = MISSING_ID.to_string();
                }
                self.shareholders.push(ShareholderRecord {
                    region: self.region,
                    national_id,
                    id_type_label: id_type_label(&id_type_indicator),
                    id_type_indicator,
                    id_type_national_id,
                    qualification_code: next(),
                    shareholder_name: next(),
                });
            }
        }
        Ok(())
    }

    pub fn finish(self) -> RegionTables {
        trace!(
            region = %self.region,
            lines = self.line_no,
            companies = self.companies.len(),
            shareholders = self.shareholders.len(),
            "region aggregated"
        );
        RegionTables {
            region: self.region,
            companies: self.companies,
            shareholders: self.shareholders,
        }
    }
}

/// Aggregate an in-memory sequence of lines for `region`.
pub fn aggregate<'a, I>(
    region: RegionCode,
    encoding: SourceEncoding,
    lines: I,
) -> Result<RegionTables>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut agg = RegionAggregator::new(region, encoding);
    for line in lines {
        agg.push_line(line)?;
    }
    Ok(agg.finish())
}
