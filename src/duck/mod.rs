use duckdb::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::process::{DatasetTables, COMPANIES_TABLE, SHAREHOLDERS_TABLE};

const CREATE_TABLES: &str = "
    DROP TABLE IF EXISTS companies;
    CREATE TABLE companies(
        region VARCHAR NOT NULL,
        national_id VARCHAR NOT NULL,
        legal_name VARCHAR NOT NULL
    );
    DROP TABLE IF EXISTS shareholders;
    CREATE TABLE shareholders(
        region VARCHAR NOT NULL,
        national_id VARCHAR NOT NULL,
        id_type_indicator VARCHAR NOT NULL,
        id_type_national_id VARCHAR NOT NULL,
        qualification_code VARCHAR NOT NULL,
        shareholder_name VARCHAR NOT NULL,
        id_type_label VARCHAR
    );";

/// DuckDB database holding the `companies` and `shareholders` tables.
/// The connection closes when the store is dropped.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a database on disk at `path`, creating the file if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace both tables with `tables` in a single transaction. On error
    /// nothing is committed and the previous content stays.
    pub fn replace_tables(&mut self, tables: &DatasetTables) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(CREATE_TABLES)?;

        {
            let mut appender = tx.appender(COMPANIES_TABLE)?;
            for c in &tables.companies {
                appender.append_row(params![c.region.as_str(), c.national_id, c.legal_name])?;
            }
            appender.flush()?;
        }
        debug!(rows = tables.companies.len(), table = COMPANIES_TABLE, "appended");

        {
            let mut appender = tx.appender(SHAREHOLDERS_TABLE)?;
            for s in &tables.shareholders {
                appender.append_row(params![
                    s.region.as_str(),
                    s.national_id,
                    s.id_type_indicator,
                    s.id_type_national_id,
                    s.qualification_code,
                    s.shareholder_name,
                    s.id_type_label,
                ])?;
            }
            appender.flush()?;
        }
        debug!(rows = tables.shareholders.len(), table = SHAREHOLDERS_TABLE, "appended");

        tx.commit()?;
        info!(
            companies = tables.companies.len(),
            shareholders = tables.shareholders.len(),
            "tables replaced"
        );
        Ok(())
    }

    pub fn count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as u64)
    }
}
