// src/export.rs

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::process::record::{COMPANY_COLUMNS, SHAREHOLDER_COLUMNS};
use crate::process::{DatasetTables, COMPANIES_TABLE, SHAREHOLDERS_TABLE};

const STAGING_DIR: &str = ".staging";

/// Parquet files written under `<dir>/.staging`, not yet visible in `<dir>`.
#[derive(Debug)]
pub struct StagedExport {
    dir: PathBuf,
    staging: PathBuf,
    files: Vec<PathBuf>,
}

impl StagedExport {
    /// Move the staged files into the target directory.
    pub fn publish(self) -> Result<Vec<PathBuf>> {
        let mut published = Vec::with_capacity(self.files.len());
        for staged in &self.files {
            let Some(name) = staged.file_name() else {
                continue;
            };
            let target = self.dir.join(name);
            fs::rename(staged, &target)?;
            info!(path = %target.display(), "exported");
            published.push(target);
        }
        fs::remove_dir(&self.staging)?;
        Ok(published)
    }

    /// Throw the staged files away.
    pub fn discard(self) {
        if let Err(e) = fs::remove_dir_all(&self.staging) {
            warn!(path = %self.staging.display(), error = %e, "could not remove staged export");
        }
    }
}

/// Write `companies.parquet` and `shareholders.parquet` under `<dir>/.staging`.
pub fn stage_parquet(tables: &DatasetTables, dir: &Path) -> Result<StagedExport> {
    let staging = dir.join(STAGING_DIR);
    fs::create_dir_all(&staging)?;
    let files = write_parquet(tables, &staging)?;
    Ok(StagedExport {
        dir: dir.to_path_buf(),
        staging,
        files,
    })
}

/// Write `<dir>/companies.parquet` and `<dir>/shareholders.parquet`.
pub fn write_parquet(tables: &DatasetTables, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let companies = RecordBatch::try_new(
        utf8_schema(&COMPANY_COLUMNS, &[]),
        vec![
            strings(tables.companies.iter().map(|c| c.region.as_str())),
            strings(tables.companies.iter().map(|c| c.national_id.as_str())),
            strings(tables.companies.iter().map(|c| c.legal_name.as_str())),
        ],
    )?;

    let sh = &tables.shareholders;
    let shareholders = RecordBatch::try_new(
        utf8_schema(&SHAREHOLDER_COLUMNS, &["id_type_label"]),
        vec![
            strings(sh.iter().map(|s| s.region.as_str())),
            strings(sh.iter().map(|s| s.national_id.as_str())),
            strings(sh.iter().map(|s| s.id_type_indicator.as_str())),
            strings(sh.iter().map(|s| s.id_type_national_id.as_str())),
            strings(sh.iter().map(|s| s.qualification_code.as_str())),
            strings(sh.iter().map(|s| s.shareholder_name.as_str())),
            Arc::new(StringArray::from_iter(sh.iter().map(|s| s.id_type_label))) as ArrayRef,
        ],
    )?;

    let mut written = Vec::with_capacity(2);
    for (name, batch) in [(COMPANIES_TABLE, companies), (SHAREHOLDERS_TABLE, shareholders)] {
        let path = dir.join(format!("{}.parquet", name));
        write_batch(&path, &batch)?;
        debug!(path = %path.display(), rows = batch.num_rows(), "parquet written");
        written.push(path);
    }
    Ok(written)
}

fn utf8_schema(columns: &[&str], nullable: &[&str]) -> Arc<Schema> {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(|c| Field::new(*c, DataType::Utf8, nullable.contains(c)))
            .collect::<Vec<_>>(),
    ))
}

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values)) as ArrayRef
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
