//! World Bank indicator fetcher.
//!
//! Pages through the v2 API, accumulates the records and writes them to
//! a JSON file, either raw or reshaped into a row/column table.

mod error;
pub mod process;
mod request;

pub use error::{Error, Result};
pub use process::{indicators_list, sources_list, Dataset, Query, Table, WorldBank};

const BASE_API_URL: &str = "http://api.worldbank.org/v2";
/// Records requested per page once the total is known.
const PER_PAGE: u64 = 1000;

const DEFAULT_INDICATOR: &str = "SP.POP.TOTL";
const DEFAULT_COUNTRY: &str = "all";
const DEFAULT_DATE: &str = "1960:2019";
/// The bundled binary appends its log lines here.
pub const LOG_FILE: &str = "log.txt";
