//! CSV bar loading with boundary validation.
//!
//! Expected columns: `timestamp,open,high,low,close` with RFC 3339
//! timestamps. Ordering and sanity problems are rejected here so the core
//! can assume clean, strictly increasing bars.

use chrono::{DateTime, Utc};
use driftline_core::domain::Bar;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: row {row} has non-increasing timestamp {timestamp}")]
    NonMonotonic {
        path: String,
        row: usize,
        timestamp: DateTime<Utc>,
    },
    #[error("{path}: row {row} fails OHLC sanity")]
    InsaneBar { path: String, row: usize },
    #[error("{path}: no bars")]
    Empty { path: String },
}

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Load one instrument's ordered bar history from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path)
        .map_err(|source| LoadError::Io { path: display.clone(), source })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars: Vec<Bar> = Vec::new();
    for (idx, record) in reader.deserialize::<BarRow>().enumerate() {
        let row = record.map_err(|source| LoadError::Csv { path: display.clone(), source })?;
        let bar = Bar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
        };
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar { path: display, row: idx });
        }
        if let Some(prev) = bars.last() {
            if bar.timestamp <= prev.timestamp {
                return Err(LoadError::NonMonotonic {
                    path: display,
                    row: idx,
                    timestamp: bar.timestamp,
                });
            }
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty { path: display });
    }
    Ok(bars)
}
