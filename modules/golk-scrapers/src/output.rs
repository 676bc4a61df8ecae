use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::maps::{ListingKind, Listing};

/// Serialize `rows` with a header row taken from the field names.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Saved CSV");
    Ok(rows.len())
}

/// Listings use the kind-specific name column: `area,<kind>,ratings,google_map_link`.
pub fn write_listings(path: &Path, kind: ListingKind, rows: &[Listing]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["area", kind.column(), "ratings", "google_map_link"])?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Saved CSV");
    Ok(rows.len())
}
