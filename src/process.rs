use std::path::{Path, PathBuf};

use reqwest::Client;
use serde_json::{Map, Value};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{info, warn};

use crate::request::{build_url, get_page, Page};
use crate::{
    Error, Result, BASE_API_URL, DEFAULT_COUNTRY, DEFAULT_DATE, DEFAULT_INDICATOR, PER_PAGE,
};

/// Parameters for one fetch job. Fixed once the client is built.
#[derive(Debug, Clone)]
pub struct Query {
    pub indicator: String,
    /// Country code, or `all` for every country.
    pub country: String,
    /// Year range, e.g. `1960:2019`. Not sent to the listing endpoints.
    pub date: String,
    /// Extra filters passed through to the query string as-is.
    pub filters: Vec<(String, String)>,
    /// Output file name; derived from indicator and country when `None`.
    pub file_name: Option<String>,
    pub overwrite: bool,
    /// Overridable so tests can point the client at a local server.
    pub base_url: String,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            indicator: DEFAULT_INDICATOR.into(),
            country: DEFAULT_COUNTRY.into(),
            date: DEFAULT_DATE.into(),
            filters: Vec::new(),
            file_name: None,
            overwrite: false,
            base_url: BASE_API_URL.into(),
        }
    }
}

/// What the client currently holds. The raw → transformed transition is
/// one-way; once the table is built the raw pages are gone.
#[derive(Debug, Clone)]
pub enum Dataset {
    Raw { meta: Value, records: Vec<Value> },
    Transformed(Table),
}

/// Row/column view over the records' "value" sub-mappings.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Client for one indicator/country query against the World Bank API.
#[derive(Debug)]
pub struct WorldBank {
    query: Query,
    url: String,
    file_name: PathBuf,
    client: Client,
    data: Option<Dataset>,
}

impl WorldBank {
    pub fn new(query: Query) -> Result<Self> {
        let url = build_url(&query.base_url, &query.indicator, &query.country);
        info!(%url, "base url set up");

        let file_name = match &query.file_name {
            Some(name) => with_json_ext(name),
            None => PathBuf::from(format!("{}_{}.json", query.indicator, query.country)),
        };
        info!(file = %file_name.display(), "the data will be saved here");
        if file_name.exists() && !query.overwrite {
            return Err(Error::FileExists(file_name));
        }

        Ok(WorldBank {
            url,
            file_name,
            client: Client::new(),
            data: None,
            query,
        })
    }

    /// Downloads the whole result set, one page at a time. A probe
    /// request reads the record total, then every page is appended in
    /// order. Fails fast when the data was already transformed.
    pub async fn fetch(&mut self) -> Result<()> {
        if matches!(self.data, Some(Dataset::Transformed(_))) {
            return Err(Error::AlreadyTransformed);
        }

        let probe = self.page(1, 1).await?;
        let total = probe.total()?;
        let pages = page_count(total);
        info!(total, pages, "starting download");
        if pages > 1 {
            warn!("high number of records, this might take a few minutes");
        }

        let mut meta = probe.meta;
        let mut records = Vec::with_capacity(total as usize);
        for page in 1..=pages {
            let chunk = self.page(page, PER_PAGE).await?;
            if page == 1 {
                meta = chunk.meta;
            }
            records.extend(chunk.records);
            info!("page {page} of {pages}");
        }

        self.data = Some(Dataset::Raw { meta, records });
        Ok(())
    }

    /// Reshapes the raw records into a [`Table`] keyed by each record's
    /// "value" sub-mapping. One-way; a second call is an error, as is
    /// calling [`WorldBank::fetch`] afterwards.
    pub fn transform(&mut self) -> Result<()> {
        let table = match &self.data {
            Some(Dataset::Raw { records, .. }) => build_table(records)?,
            Some(Dataset::Transformed(_)) => return Err(Error::AlreadyTransformed),
            None => return Err(Error::NotDownloaded),
        };
        info!(rows = table.rows.len(), "transformed {} data", self.query.indicator);

        self.data = Some(Dataset::Transformed(table));
        Ok(())
    }

    /// Writes the dataset to disk and returns the path written. Raw
    /// data goes out as one pretty-printed `[meta, records]` document,
    /// transformed data as newline-delimited JSON rows. An explicit
    /// `name` overrides the file name picked at construction.
    pub async fn save(&self, name: Option<&str>) -> Result<PathBuf> {
        let data = self.data.as_ref().ok_or(Error::NotDownloaded)?;
        let path = match name {
            Some(name) => with_json_ext(name),
            None => self.file_name.clone(),
        };

        let bytes = match data {
            Dataset::Raw { meta, records } => serde_json::to_vec_pretty(&(meta, records))?,
            Dataset::Transformed(table) => {
                let mut buf = Vec::new();
                for row in &table.rows {
                    serde_json::to_writer(&mut buf, row)?;
                    buf.push(b'\n');
                }
                buf
            }
        };

        info!(path = %path.display(), "saving data");
        let mut file = File::create(&path).await?;
        file.write_all(&bytes).await?;
        Ok(path)
    }

    /// The accumulated dataset, if a fetch has completed.
    pub fn data(&self) -> Option<&Dataset> {
        self.data.as_ref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    async fn page(&self, page: u64, per_page: u64) -> Result<Page> {
        let mut params = self.query.filters.clone();
        if !self.is_listing() {
            params.push(("date".into(), self.query.date.clone()));
        }
        get_page(&self.client, &self.url, &params, page, per_page).await
    }

    fn is_listing(&self) -> bool {
        self.query.indicator.eq_ignore_ascii_case("all")
            || self.query.indicator.eq_ignore_ascii_case("source")
    }
}

/// Downloads the full indicator listing into `indicators.json`.
pub async fn indicators_list() -> Result<PathBuf> {
    listing("all", "indicators").await
}

/// Downloads the source listing into `sources.json`.
pub async fn sources_list() -> Result<PathBuf> {
    listing("source", "sources").await
}

async fn listing(indicator: &str, name: &str) -> Result<PathBuf> {
    let mut wb = WorldBank::new(Query {
        indicator: indicator.into(),
        overwrite: true,
        ..Query::default()
    })?;
    wb.fetch().await?;
    wb.save(Some(name)).await
}

fn page_count(total: u64) -> u64 {
    total.div_ceil(PER_PAGE)
}

/// Columns come from the first record's "value" mapping; every record
/// contributes one row, missing keys filling in as null.
fn build_table(records: &[Value]) -> Result<Table> {
    let first = records
        .first()
        .and_then(|rec| rec.get("value"))
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Payload("first record has no \"value\" mapping".into()))?;
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut rows = Vec::with_capacity(records.len());
    for (idx, rec) in records.iter().enumerate() {
        let value = rec
            .get("value")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Payload(format!("record {idx} has no \"value\" mapping")))?;
        let row = columns
            .iter()
            .map(|col| (col.clone(), value.get(col).cloned().unwrap_or(Value::Null)))
            .collect();
        rows.push(row);
    }
    Ok(Table { columns, rows })
}

fn with_json_ext(name: &str) -> PathBuf {
    if name.to_lowercase().contains("json") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.json"))
    }
}
