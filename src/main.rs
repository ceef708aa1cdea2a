use anyhow::{Context, Result};
use cnpjscraper::{duck::Store, fetch::HttpSource, Config, DatasetPipeline};
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::from_env().context("reading CNPJ_* configuration")?;
    info!(
        index = %config.index_url,
        database = %config.database.display(),
        regions = config.regions.len(),
        policy = ?config.failure_policy,
        "startup"
    );

    // ─── 3) download + decode every region ───────────────────────────
    let source = HttpSource::new(Client::new(), config.index_url.clone());
    let pipeline = DatasetPipeline::new(source, config.clone());
    let collected = pipeline.collect().await.context("loading regions")?;

    // ─── 4) persist ──────────────────────────────────────────────────
    let report = {
        let mut store = Store::open(&config.database)
            .with_context(|| format!("opening {}", config.database.display()))?;
        pipeline
            .persist(collected, &mut store)
            .context("persisting tables")?
    };

    if let Some(path) = &config.report_path {
        report
            .write_json(path)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!(path = %path.display(), "wrote run report");
    }
    for failed in report.failed() {
        error!(
            region = %failed.region,
            error = failed.error.as_deref().unwrap_or_default(),
            "region not loaded"
        );
    }

    info!("all done");
    Ok(())
}
