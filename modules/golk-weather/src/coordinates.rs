use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::error::CoordinatesError;

#[derive(Debug, Clone, PartialEq)]
pub struct AreaCoordinate {
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub fn read_coordinates(path: &Path) -> Result<Vec<AreaCoordinate>, CoordinatesError> {
    let file = std::fs::File::open(path)?;
    parse_coordinates(file)
}

/// Parse an `Area,Latitude,Longitude` CSV (extra columns allowed, any order).
/// Malformed rows are skipped with a warning.
pub fn parse_coordinates<R: Read>(reader: R) -> Result<Vec<AreaCoordinate>, CoordinatesError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let position = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(CoordinatesError::MissingColumn(name))
    };
    let area_idx = position("Area")?;
    let lat_idx = position("Latitude")?;
    let lon_idx = position("Longitude")?;

    let mut coords = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping unreadable coordinates row");
                continue;
            }
        };

        let area = record.get(area_idx).unwrap_or_default();
        let lat = record.get(lat_idx).and_then(|v| v.parse::<f64>().ok());
        let lon = record.get(lon_idx).and_then(|v| v.parse::<f64>().ok());

        match (area.is_empty(), lat, lon) {
            (false, Some(latitude), Some(longitude)) => coords.push(AreaCoordinate {
                area: area.to_string(),
                latitude,
                longitude,
            }),
            _ => warn!(line = line + 2, "Skipping malformed coordinates row"),
        }
    }

    Ok(coords)
}
