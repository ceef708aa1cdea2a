// src/fetch/mod.rs

use futures::stream::{BoxStream, StreamExt};
use reqwest::{
    header::{CONTENT_RANGE, RANGE},
    Client,
};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

pub mod size;
pub mod urls;

pub use size::{describe_size, format_size, parse_content_range, probe_size};
pub use urls::LinkCatalog;

/// Body of a dataset file, delivered in chunks as they arrive.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Everything the pipeline needs from the remote registry.
#[allow(async_fn_in_trait)]
pub trait DatasetSource {
    /// Address of the index page; relative dataset links resolve against it.
    fn index_url(&self) -> &Url;

    async fn index_page(&self) -> Result<String>;

    /// Raw `Content-Range` header returned for a two-byte range request.
    async fn content_range(&self, url: &Url) -> Result<String>;

    async fn open(&self, url: &Url) -> Result<ByteStream>;
}

/// `DatasetSource` over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    index_url: Url,
}

impl HttpSource {
    pub fn new(client: Client, index_url: Url) -> Self {
        Self { client, index_url }
    }
}

impl DatasetSource for HttpSource {
    fn index_url(&self) -> &Url {
        &self.index_url
    }

    async fn index_page(&self) -> Result<String> {
        debug!(url = %self.index_url, "fetching index page");
        Ok(self
            .client
            .get(self.index_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    async fn content_range(&self, url: &Url) -> Result<String> {
        let resp = self
            .client
            .get(url.clone())
            .header(RANGE, "bytes=0-1")
            .send()
            .await?
            .error_for_status()?;
        let status = resp.status();
        resp.headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::SizeProbe(format!("no Content-Range in response (status {})", status))
            })
    }

    async fn open(&self, url: &Url) -> Result<ByteStream> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(Error::from))
            .boxed())
    }
}
