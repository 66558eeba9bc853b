use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// One page of an API response, split out of the `[meta, records]` array.
#[derive(Debug, Clone)]
pub(crate) struct Page {
    pub meta: Value,
    pub records: Vec<Value>,
}

/// The slice of page metadata the fetch loop actually reads.
#[derive(Debug, Clone, Deserialize)]
struct PageInfo {
    #[serde(default, deserialize_with = "number_or_string")]
    total: Option<u64>,
}

impl Page {
    /// Total record count advertised by the page metadata.
    /// The API serves it as a number or a numeric string depending on
    /// the endpoint, so both are accepted.
    pub(crate) fn total(&self) -> Result<u64> {
        let info: PageInfo = serde_json::from_value(self.meta.clone())?;
        info.total
            .ok_or_else(|| Error::Payload("metadata carries no record total".into()))
    }

    pub(crate) fn from_body(body: Value) -> Result<Self> {
        let Value::Array(parts) = body else {
            return Err(Error::Payload("expected a JSON array response".into()));
        };
        let mut parts = parts.into_iter();
        let Some(meta) = parts.next() else {
            return Err(Error::Payload("empty response array".into()));
        };
        let records = match parts.next() {
            Some(Value::Array(records)) => records,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(Error::Payload("records element is not an array".into())),
        };
        Ok(Page { meta, records })
    }
}

/// Requests a single page and splits the payload.
pub(crate) async fn get_page(
    client: &Client,
    url: &str,
    params: &[(String, String)],
    page: u64,
    per_page: u64,
) -> Result<Page> {
    let res = client
        .get(url)
        .query(&[("format", "json")])
        .query(&[("per_page", per_page.to_string()), ("page", page.to_string())])
        .query(params)
        .send()
        .await?;
    debug!(page, per_page, url = %res.url(), "requested page");

    let body: Value = res.json().await?;
    Page::from_body(body)
}

fn number_or_string<'de, D>(de: D) -> core::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => Ok(n.as_u64()),
        Some(Value::String(s)) => Ok(s.parse().ok()),
        _ => Ok(None),
    }
}

pub(crate) fn build_url(base: &str, indicator: &str, country: &str) -> String {
    if indicator.eq_ignore_ascii_case("all") {
        format!("{base}/indicator")
    } else if indicator.eq_ignore_ascii_case("source") {
        format!("{base}/source")
    } else {
        format!("{base}/country/{country}/indicator/{indicator}")
    }
}
