// src/fetch/urls.rs
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::region::RegionCode;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Region → dataset URL, scraped from the first table of the index page.
#[derive(Debug, Clone, Default)]
pub struct LinkCatalog {
    links: BTreeMap<RegionCode, Url>,
}

impl LinkCatalog {
    /// Read every anchor of the first `<table>` in `html`. The region is the
    /// last two characters of the raw `href`; links are resolved against `base`.
    pub fn parse(base: &Url, html: &str) -> Result<Self> {
        let doc = Html::parse_document(html);
        let table = doc.select(&TABLE).next().ok_or(Error::MissingTable)?;

        let mut links = BTreeMap::new();
        for href in table
            .select(&LINKS)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
        {
            let Some(region) = href
                .get(href.len().saturating_sub(2)..)
                .filter(|code| code.bytes().all(|b| b.is_ascii_uppercase()))
                .and_then(|code| code.parse::<RegionCode>().ok())
            else {
                trace!(href, "link does not end in a region code");
                continue;
            };
            match base.join(href) {
                Ok(url) => {
                    links.insert(region, url);
                }
                Err(e) => debug!(href, error = %e, "skipping unparseable link"),
            }
        }
        debug!(count = links.len(), "dataset links found");
        Ok(Self { links })
    }

    pub fn url(&self, region: RegionCode) -> Result<&Url> {
        self.links.get(&region).ok_or(Error::MissingLink(region))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
