//! Stop lookup against a GTFS static `stops.txt`.
//!
//! Real-time feeds only carry stop ids (`L12N`); this finds the id for a
//! station name so it can be configured as the target stop.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One row of `stops.txt`. Columns not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopRecord {
    pub stop_id: String,
    pub stop_name: String,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
    #[serde(default)]
    pub parent_station: Option<String>,
}

/// Returns every stop whose name contains `name`, in file order.
///
/// Matching is case-sensitive, so `"Grand St"` matches `"Grand St"` but not
/// `"GRAND ST"`.
pub fn find_stops(path: impl AsRef<Path>, name: &str) -> Result<Vec<StopRecord>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut matches = Vec::new();
    for result in rdr.deserialize() {
        let record: StopRecord =
            result.with_context(|| format!("invalid row in {}", path.display()))?;
        if record.stop_name.contains(name) {
            matches.push(record);
        }
    }

    debug!(path = %path.display(), query = name, found = matches.len(), "Stop lookup complete");
    Ok(matches)
}
