use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AverageError, Result};

/// Format of the timestamps in the event log, e.g. `2018-12-26 18:11:08.509654`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Format of the tick timestamps written to the results.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An entry of the event log as it appears on disk. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
struct RawEvent {
    timestamp: String,
    duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    pub duration: f64,
}

/// One line of the results: the average duration over the window ending at `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageRecord {
    pub date: String,
    pub average_delivery_time: f64,
}

pub fn parse_events(json: &[u8]) -> Result<Vec<Event>> {
    let raw: Vec<RawEvent> = serde_json::from_slice(json)?;
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let timestamp = NaiveDateTime::parse_from_str(&raw.timestamp, TIMESTAMP_FORMAT)
                .map_err(|source| AverageError::Timestamp {
                    index,
                    timestamp: raw.timestamp.clone(),
                    source,
                })?;
            Ok(Event {
                timestamp,
                duration: raw.duration,
            })
        })
        .collect()
}

#[tracing::instrument(level = "debug")]
pub async fn load_events(path: &Path) -> Result<Vec<Event>> {
    let data = tokio::fs::read(path).await.map_err(|source| AverageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    let events = parse_events(&data)?;
    info!("Loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Overwrites `path` with the records as a JSON array.
#[tracing::instrument(level = "debug", skip(records))]
pub async fn write_records(path: &Path, records: &[AverageRecord]) -> Result<()> {
    let data = serde_json::to_vec(records)?;
    tokio::fs::write(path, data)
        .await
        .map_err(|source| AverageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Wrote {} averages to {}", records.len(), path.display());
    Ok(())
}
