use std::{fs::OpenOptions, sync::Arc};

use chrono::Local;
use tracing::info;
use wbfetch::{Query, Result, WorldBank, LOG_FILE};

#[tokio::main]
async fn main() -> Result<()> {
    let log = OpenOptions::new().create(true).append(true).open(LOG_FILE)?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(Arc::new(log))
        .with_ansi(false)
        .init();

    let start_time = Local::now();
    let mut wb = WorldBank::new(Query::default())?;
    wb.fetch().await?;
    wb.transform()?;
    let path = wb.save(None).await?;

    let run_time = (Local::now() - start_time).num_milliseconds() as f64 / 1000.0;
    info!("wrote {}, full program time: {run_time} sec", path.display());

    Ok(())
}
