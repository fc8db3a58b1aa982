//! Result persistence: a pretty-printed JSON array and a flat CSV table.
//! Both writers are best-effort; a failed write is logged and absorbed so
//! the run itself never dies on a full disk.

use anyhow::Context;
use itertools::Itertools;
use tracing::{info, warn};

use crate::record::GameRecord;

const CSV_COLUMNS: [&str; 10] = [
    "name",
    "price_regular",
    "price_discount",
    "rating",
    "platforms",
    "howlongtobeat",
    "distribution_type",
    "site",
    "url",
    "image_url",
];

pub fn write_json(path: &str, records: &[GameRecord]) {
    match write_json_inner(path, records) {
        Ok(()) => info!(%path, count = records.len(), "JSON artifact written"),
        Err(err) => warn!(%path, %err, "failed to write JSON artifact"),
    }
}

pub fn write_csv(path: &str, records: &[GameRecord]) {
    match write_csv_inner(path, records) {
        Ok(()) => info!(%path, count = records.len(), "CSV artifact written"),
        Err(err) => warn!(%path, %err, "failed to write CSV artifact"),
    }
}

fn write_json_inner(path: &str, records: &[GameRecord]) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(records).context("serialize records")?;
    std::fs::write(path, body).with_context(|| format!("write {path}"))?;
    Ok(())
}

fn write_csv_inner(path: &str, records: &[GameRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("open {path}"))?;
    wtr.write_record(CSV_COLUMNS).context("write header")?;
    for r in records {
        wtr.write_record(&[
            r.name.clone(),
            r.price_regular.map(|v| v.to_string()).unwrap_or_default(),
            r.price_discount.map(|v| v.to_string()).unwrap_or_default(),
            r.rating.to_string(),
            r.platforms.iter().join(";"),
            r.howlongtobeat.to_string(),
            r.distribution_type.as_str().to_string(),
            r.site.clone(),
            r.url.clone(),
            r.image_url.clone(),
        ])
        .context("write row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}
