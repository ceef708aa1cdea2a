// src/pipeline.rs

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::config::{Config, FailurePolicy};
use crate::duck::Store;
use crate::error::{Error, Result};
use crate::export::stage_parquet;
use crate::fetch::{describe_size, probe_size, DatasetSource, LinkCatalog};
use crate::process::{DatasetTables, LineSplitter, RegionAggregator, RegionTables};
use crate::region::RegionCode;
use crate::report::{thousands, RegionSummary, RunReport};

/// Result of loading a single region.
#[derive(Debug)]
pub enum RegionOutcome {
    Loaded(RegionTables),
    Failed(Error),
}

impl RegionOutcome {
    pub fn loaded(self) -> Option<RegionTables> {
        match self {
            RegionOutcome::Loaded(t) => Some(t),
            RegionOutcome::Failed(_) => None,
        }
    }
}

/// Everything downloaded in one run, not yet persisted.
#[derive(Debug)]
pub struct Collected {
    pub started_at: DateTime<Utc>,
    pub tables: DatasetTables,
    pub regions: Vec<RegionSummary>,
}

/// Downloads every configured region, one after another, and folds the
/// per-region tables into the two dataset tables.
pub struct DatasetPipeline<S> {
    source: S,
    config: Config,
}

impl<S: DatasetSource> DatasetPipeline<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn catalog(&self) -> Result<LinkCatalog> {
        let html = self.source.index_page().await?;
        LinkCatalog::parse(self.source.index_url(), &html)
    }

    /// Stream one region file through the aggregator.
    #[instrument(level = "info", skip(self, url), fields(url = %url))]
    pub async fn load_region(&self, region: RegionCode, url: &Url) -> Result<RegionTables> {
        let mut body = self.source.open(url).await?;
        let mut agg = RegionAggregator::new(region, self.config.encoding);
        let mut lines = LineSplitter::new();
        while let Some(chunk) = body.next().await {
            lines.push(&chunk?, |line| agg.push_line(line))?;
        }
        lines.finish(|line| agg.push_line(line))?;
        Ok(agg.finish())
    }

    pub async fn collect(&self) -> Result<Collected> {
        let started_at = Utc::now();
        let catalog = self.catalog().await?;

        let mut outcomes = Vec::with_capacity(self.config.regions.len());
        let mut summaries = Vec::with_capacity(self.config.regions.len());
        for &region in &self.config.regions {
            let url = catalog.url(region)?;
            let size = probe_size(&self.source, url).await;
            info!(%region, size = %describe_size(size), "downloading data");

            let outcome = match self.load_region(region, url).await {
                Ok(tables) => {
                    info!(
                        %region,
                        companies = tables.companies.len(),
                        shareholders = tables.shareholders.len(),
                        "region loaded"
                    );
                    RegionOutcome::Loaded(tables)
                }
                Err(e) if self.config.failure_policy == FailurePolicy::Abort => {
                    return Err(Error::RegionFailed {
                        region,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    error!(%region, error = %e, "region failed; continuing");
                    RegionOutcome::Failed(e)
                }
            };
            summaries.push(summarize(region, url, size, &outcome));
            outcomes.push(outcome);
        }

        if !outcomes.is_empty() && outcomes.iter().all(|o| matches!(o, RegionOutcome::Failed(_)))
        {
            return Err(Error::NothingLoaded);
        }

        let tables: DatasetTables = outcomes
            .into_iter()
            .filter_map(RegionOutcome::loaded)
            .collect();
        Ok(Collected {
            started_at,
            tables,
            regions: summaries,
        })
    }

    /// Replace the stored tables with `collected` and write the optional
    /// Parquet snapshot. On error the store is left as it was.
    pub fn persist(&self, collected: Collected, store: &mut Store) -> Result<RunReport> {
        let Collected {
            started_at,
            tables,
            regions,
        } = collected;

        info!("found {} companies", thousands(tables.companies.len()));
        info!("found {} shareholders", thousands(tables.shareholders.len()));

        // the snapshot is staged before the commit and only published after it
        let staged = match &self.config.parquet_dir {
            Some(dir) => Some(stage_parquet(&tables, dir)?),
            None => None,
        };
        if let Err(e) = store.replace_tables(&tables) {
            if let Some(staged) = staged {
                staged.discard();
            }
            return Err(e);
        }
        if let Some(staged) = staged {
            if let Err(e) = staged.publish() {
                warn!(error = %e, "tables replaced but parquet snapshot not published");
            }
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            regions,
            companies: tables.companies.len(),
            shareholders: tables.shareholders.len(),
        })
    }

    pub async fn run(&self, store: &mut Store) -> Result<RunReport> {
        let collected = self.collect().await?;
        self.persist(collected, store)
    }
}

fn summarize(
    region: RegionCode,
    url: &Url,
    size: Option<u64>,
    outcome: &RegionOutcome,
) -> RegionSummary {
    let (companies, shareholders, error) = match outcome {
        RegionOutcome::Loaded(t) => (t.companies.len(), t.shareholders.len(), None),
        RegionOutcome::Failed(e) => (0, 0, Some(e.to_string())),
    };
    RegionSummary {
        region,
        url: url.to_string(),
        size_bytes: size,
        size: describe_size(size),
        companies,
        shareholders,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ByteStream;
    use crate::process::{COMPANIES_TABLE, SHAREHOLDERS_TABLE};
    use futures::stream;
    use std::collections::HashMap;
    use tracing_subscriber::{fmt, EnvFilter};

    fn init_logging() {
        let _ = fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    }

    const BASE: &str = "http://files.example/cnpj/";

    /// Serves an index page and region files from memory.
    struct MemorySource {
        index_url: Url,
        files: HashMap<RegionCode, Vec<u8>>,
        ranges: HashMap<RegionCode, String>,
        chunk: usize,
    }

    impl MemorySource {
        fn new() -> Self {
            Self {
                index_url: Url::parse(BASE).unwrap(),
                files: HashMap::new(),
                ranges: HashMap::new(),
                chunk: 4096,
            }
        }

        fn with_file(mut self, region: RegionCode, lines: &[String]) -> Self {
            let body = lines.iter().map(|l| format!("{l}\r\n")).collect::<String>();
            self.ranges
                .insert(region, format!("bytes 0-1/{}", body.len()));
            self.files.insert(region, body.into_bytes());
            self
        }

        fn chunked(mut self, chunk: usize) -> Self {
            self.chunk = chunk;
            self
        }

        fn region_of(url: &Url) -> RegionCode {
            url.path()[url.path().len() - 2..].parse().unwrap()
        }
    }

    impl DatasetSource for MemorySource {
        fn index_url(&self) -> &Url {
            &self.index_url
        }

        async fn index_page(&self) -> Result<String> {
            let rows: String = RegionCode::ALL
                .iter()
                .map(|r| format!("<tr><td><a href=\"dados/{r}\">{}</a></td></tr>", r.name()))
                .collect();
            Ok(format!("<html><body><table>{rows}</table></body></html>"))
        }

        async fn content_range(&self, url: &Url) -> Result<String> {
            self.ranges
                .get(&Self::region_of(url))
                .cloned()
                .ok_or_else(|| Error::SizeProbe("range requests not supported".into()))
        }

        async fn open(&self, url: &Url) -> Result<ByteStream> {
            let body = self.files.get(&Self::region_of(url)).cloned().ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("404 {url}"),
                ))
            })?;
            let chunks: Vec<Result<Vec<u8>>> =
                body.chunks(self.chunk).map(|c| Ok(c.to_vec())).collect();
            Ok(stream::iter(chunks).boxed())
        }
    }

    fn company(id: &str, name: &str) -> String {
        format!("01{:<14}{:<150}", id, name)
    }

    fn shareholder(company_id: &str, indicator: &str, id: &str, name: &str) -> String {
        format!("02{:<14}{}{:<14}49{:<150}", company_id, indicator, id, name)
    }

    fn config(regions: &[RegionCode], policy: FailurePolicy) -> Config {
        Config {
            regions: regions.to_vec(),
            failure_policy: policy,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn synthetic_region_end_to_end() -> Result<()> {
        init_logging();
        let pad = |n: usize| " ".repeat(n);
        let lines = vec![
            format!("01{}ACME CORP{}", pad(14), pad(137)),
            format!("02{}2{}{}01JOHN DOE{}", pad(14), "", pad(14), pad(142)),
        ];
        let source = MemorySource::new().with_file(RegionCode::SP, &lines);
        let pipeline = DatasetPipeline::new(
            source,
            config(&[RegionCode::SP], FailurePolicy::Abort),
        );
        let mut store = Store::open_in_memory()?;

        let report = pipeline.run(&mut store).await?;
        assert_eq!((report.companies, report.shareholders), (1, 1));
        assert_eq!(report.regions[0].size_bytes, Some(349));

        let name: String = store.connection().query_row(
            "SELECT legal_name FROM companies WHERE region = 'SP'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(name, "ACME CORP");
        let (id, label): (String, String) = store.connection().query_row(
            "SELECT id_type_national_id, id_type_label FROM shareholders",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!(id, "0");
        assert_eq!(label, "Natural Person");
        Ok(())
    }

    #[tokio::test]
    async fn running_twice_leaves_one_copy() -> Result<()> {
        let source = MemorySource::new().with_file(
            RegionCode::RS,
            &[company("1", "A"), company("2", "B"), shareholder("1", "1", "9", "C")],
        );
        let pipeline = DatasetPipeline::new(
            source,
            config(&[RegionCode::RS], FailurePolicy::Abort),
        );
        let mut store = Store::open_in_memory()?;
        pipeline.run(&mut store).await?;
        pipeline.run(&mut store).await?;
        assert_eq!(store.count(COMPANIES_TABLE)?, 2);
        assert_eq!(store.count(SHAREHOLDERS_TABLE)?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn regions_concatenate_in_declaration_order() -> Result<()> {
        let source = MemorySource::new()
            .with_file(RegionCode::AC, &[company("10", "ACRE 1"), company("11", "ACRE 2")])
            .with_file(RegionCode::SP, &[company("10", "PAULISTA")])
            .with_file(RegionCode::AL, &[]);
        let regions = [RegionCode::AC, RegionCode::AL, RegionCode::SP];
        let pipeline = DatasetPipeline::new(source, config(&regions, FailurePolicy::Abort));

        let collected = pipeline.collect().await?;
        let per_region: usize = collected.regions.iter().map(|r| r.companies).sum();
        assert_eq!(collected.tables.companies.len(), per_region);
        let tags: Vec<_> = collected
            .tables
            .companies
            .iter()
            .map(|c| (c.region, c.legal_name.as_str()))
            .collect();
        assert_eq!(
            tags,
            vec![
                (RegionCode::AC, "ACRE 1"),
                (RegionCode::AC, "ACRE 2"),
                (RegionCode::SP, "PAULISTA"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn chunk_boundaries_do_not_change_the_result() -> Result<()> {
        let lines = vec![
            company("1", "ÚNICA"),
            shareholder("1", "2", "", "ANA"),
            shareholder("1", "3", "", "BOB"),
        ];
        let whole = MemorySource::new().with_file(RegionCode::PE, &lines);
        let split = MemorySource::new().with_file(RegionCode::PE, &lines).chunked(7);
        let cfg = config(&[RegionCode::PE], FailurePolicy::Abort);

        let a = DatasetPipeline::new(whole, cfg.clone()).collect().await?;
        let b = DatasetPipeline::new(split, cfg).collect().await?;
        assert_eq!(a.tables, b.tables);
        assert_eq!(b.tables.shareholders[1].id_type_label, Some("Foreign Name"));
        Ok(())
    }

    #[tokio::test]
    async fn size_probe_failure_is_not_fatal() -> Result<()> {
        let mut source = MemorySource::new().with_file(RegionCode::DF, &[company("1", "X")]);
        source.ranges.clear();
        let pipeline = DatasetPipeline::new(
            source,
            config(&[RegionCode::DF], FailurePolicy::Abort),
        );
        let collected = pipeline.collect().await?;
        assert_eq!(collected.regions[0].size, "unknown size");
        assert_eq!(collected.tables.companies.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn abort_policy_persists_nothing() -> Result<()> {
        let mut store = Store::open_in_memory()?;
        let good = MemorySource::new().with_file(RegionCode::AC, &[company("1", "OLD")]);
        DatasetPipeline::new(good, config(&[RegionCode::AC], FailurePolicy::Abort))
            .run(&mut store)
            .await?;

        let bad = MemorySource::new()
            .with_file(RegionCode::AC, &[company("1", "NEW")])
            .with_file(RegionCode::AL, &[company("2", "Y"), "03BOGUS".to_string()]);
        let err = DatasetPipeline::new(
            bad,
            config(&[RegionCode::AC, RegionCode::AL], FailurePolicy::Abort),
        )
        .run(&mut store)
        .await
        .unwrap_err();

        match err {
            Error::RegionFailed { region, source } => {
                assert_eq!(region, RegionCode::AL);
                match *source {
                    Error::UnknownRecordType { line_no, ref line } => {
                        assert_eq!(line_no, 2);
                        assert_eq!(line, "03BOGUS");
                    }
                    ref other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
        let name: String = store.connection().query_row(
            "SELECT legal_name FROM companies",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(name, "OLD");
        Ok(())
    }

    #[tokio::test]
    async fn isolate_policy_persists_loaded_regions() -> Result<()> {
        init_logging();
        let source = MemorySource::new()
            .with_file(RegionCode::MA, &["01short".to_string()])
            .with_file(RegionCode::PA, &[company("1", "OK")]);
        let regions = [RegionCode::MA, RegionCode::MT, RegionCode::PA];
        let pipeline = DatasetPipeline::new(source, config(&regions, FailurePolicy::Isolate));

        // MT has a link but no file behind it: a fetch failure
        let mut store = Store::open_in_memory()?;
        let report = pipeline.run(&mut store).await?;
        let failed: Vec<_> = report.failed().map(|r| r.region).collect();
        assert_eq!(failed, vec![RegionCode::MA, RegionCode::MT]);
        assert_eq!(store.count(COMPANIES_TABLE)?, 1);
        assert_eq!(report.regions.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn isolate_policy_with_no_success_is_an_error() -> Result<()> {
        let source = MemorySource::new();
        let pipeline = DatasetPipeline::new(
            source,
            config(&[RegionCode::RR], FailurePolicy::Isolate),
        );
        assert!(matches!(pipeline.collect().await, Err(Error::NothingLoaded)));
        Ok(())
    }

    #[tokio::test]
    async fn missing_link_is_fatal_under_any_policy() -> Result<()> {
        struct NoLinks(Url);
        impl DatasetSource for NoLinks {
            fn index_url(&self) -> &Url {
                &self.0
            }
            async fn index_page(&self) -> Result<String> {
                Ok("<table><tr><td><a href='dados/SP'>SP</a></td></tr></table>".into())
            }
            async fn content_range(&self, _: &Url) -> Result<String> {
                Err(Error::SizeProbe("unsupported".into()))
            }
            async fn open(&self, _: &Url) -> Result<ByteStream> {
                Ok(stream::iter(Vec::<Result<Vec<u8>>>::new()).boxed())
            }
        }

        let source = NoLinks(Url::parse(BASE).unwrap());
        let pipeline = DatasetPipeline::new(
            source,
            config(&[RegionCode::RJ, RegionCode::SP], FailurePolicy::Isolate),
        );
        assert!(matches!(
            pipeline.collect().await,
            Err(Error::MissingLink(RegionCode::RJ))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn failed_export_leaves_the_store_untouched() -> Result<()> {
        let mut store = Store::open_in_memory()?;
        let old = MemorySource::new().with_file(RegionCode::SC, &[company("1", "OLD")]);
        DatasetPipeline::new(old, config(&[RegionCode::SC], FailurePolicy::Abort))
            .run(&mut store)
            .await?;

        // a regular file where the export directory should go
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"")?;
        let new = MemorySource::new().with_file(
            RegionCode::SC,
            &[company("1", "NEW"), company("2", "NEWER")],
        );
        let mut cfg = config(&[RegionCode::SC], FailurePolicy::Abort);
        cfg.parquet_dir = Some(blocker.join("snapshot"));

        let result = DatasetPipeline::new(new, cfg).run(&mut store).await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(store.count(COMPANIES_TABLE)?, 1);
        let name: String = store.connection().query_row(
            "SELECT legal_name FROM companies",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(name, "OLD");
        Ok(())
    }

    #[tokio::test]
    async fn exports_parquet_when_configured() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = MemorySource::new().with_file(RegionCode::SE, &[company("1", "X")]);
        let mut cfg = config(&[RegionCode::SE], FailurePolicy::Abort);
        cfg.parquet_dir = Some(dir.path().join("snapshot"));
        let mut store = Store::open_in_memory()?;
        DatasetPipeline::new(source, cfg).run(&mut store).await?;
        assert!(dir.path().join("snapshot/companies.parquet").is_file());
        assert!(dir.path().join("snapshot/shareholders.parquet").is_file());
        assert!(!dir.path().join("snapshot/.staging").exists());
        Ok(())
    }
}
