//! Instrument CSV → column buffers.
//!
//! The sun-photometer logger writes one row per observation with a fixed set
//! of housekeeping columns followed by one `AOD {wavelength} nm` column per
//! filter channel. Everything is read into memory in one pass; housekeeping
//! temperatures are converted to kelvin and pressure to hPa on the way in.

use crate::error::{ConvertError, Result};
use crate::{CELSIUS_TO_KELVIN, KPA_TO_HPA};
use chrono::NaiveDateTime;
use csv::StringRecord;
use log::{debug, trace};
use rayon::prelude::*;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────
// Column names
// ─────────────────────────────────────────────────────────────────────
pub const TIMESTAMP_COLUMN:            &str = "Timestamp";
pub const ELEVATION_COLUMN:            &str = "Elevation (deg)";
pub const AZIMUTH_COLUMN:              &str = "Azimuth (deg)";
pub const AMBIENT_TEMPERATURE_COLUMN:  &str = "Ambient temperature (C)";
pub const AMBIENT_PRESSURE_COLUMN:     &str = "Ambient pressure (kPa)";
pub const INTERNAL_TEMPERATURE_COLUMN: &str = "Internal temperature (C)";
pub const INTERNAL_HUMIDITY_COLUMN:    &str = "Internal humidity (%)";
pub const DNI_COLUMN:                  &str = "DNI (W/m2)";

/// Numeric housekeeping columns, in the order they are checked and parsed.
const HOUSEKEEPING_COLUMNS: [&str; 7] = [
    ELEVATION_COLUMN,
    AZIMUTH_COLUMN,
    AMBIENT_TEMPERATURE_COLUMN,
    AMBIENT_PRESSURE_COLUMN,
    INTERNAL_TEMPERATURE_COLUMN,
    INTERNAL_HUMIDITY_COLUMN,
    DNI_COLUMN,
];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header of the AOD column for one channel. `368.0` → `AOD 368 nm`.
pub fn aod_column_name(wavelength: f64) -> String {
    format!("AOD {wavelength} nm")
}

// ─────────────────────────────────────────────────────────────────────
// In-memory representation of one CSV file
// ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Observations {
    pub times:                Vec<NaiveDateTime>,
    pub elevation:            Vec<f64>,
    pub azimuth:              Vec<f64>,
    /// K
    pub ambient_temperature:  Vec<f64>,
    /// hPa
    pub ambient_pressure:     Vec<f64>,
    /// K
    pub internal_temperature: Vec<f64>,
    pub internal_humidity:    Vec<f64>,
    pub dni:                  Vec<f64>,
    pub wavelengths:          Vec<f64>,
    /// Row-major `time × wavelength`.
    pub aod:                  Vec<f64>,
}

impl Observations {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn aod_at(&self, row: usize, channel: usize) -> f64 {
        self.aod[row * self.wavelengths.len() + channel]
    }

    pub fn aod_column(&self, channel: usize) -> Vec<f64> {
        (0..self.len()).map(|row| self.aod_at(row, channel)).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────
// CSV → buffers
// ─────────────────────────────────────────────────────────────────────
pub fn read_observations(csv_path: &Path, wavelengths: &[f64]) -> Result<Observations> {
    if wavelengths.is_empty() {
        return Err(ConvertError::NoWavelengths);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Fields)
        .from_path(csv_path)?;

    // every column is located before a single value is parsed
    let headers = rdr.headers()?.clone();
    let ts_idx = column_index(&headers, TIMESTAMP_COLUMN)?;
    let mut numeric: Vec<(String, usize)> = Vec::with_capacity(HOUSEKEEPING_COLUMNS.len() + wavelengths.len());
    for name in HOUSEKEEPING_COLUMNS {
        numeric.push((name.to_string(), column_index(&headers, name)?));
    }
    for &w in wavelengths {
        let name = aod_column_name(w);
        let idx = column_index(&headers, &name)?;
        numeric.push((name, idx));
    }

    let records = rdr.records().collect::<std::result::Result<Vec<StringRecord>, _>>()?;
    debug!("read {} rows × {} columns from {}", records.len(), headers.len(), csv_path.display());

    let times = records
        .iter()
        .enumerate()
        .map(|(row, rec)| parse_timestamp(rec.get(ts_idx).unwrap_or(""), line_of(rec, row)))
        .collect::<Result<Vec<_>>>()?;

    // columns parse independently; errors surface in column order
    let mut columns = numeric
        .par_iter()
        .map(|(name, idx)| parse_column(&records, name, *idx))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<Vec<f64>>>>()?
        .into_iter();

    let mut next = || columns.next().unwrap_or_default();
    let elevation            = next();
    let azimuth              = next();
    let ambient_temperature  = next().into_iter().map(|c| c + CELSIUS_TO_KELVIN).collect();
    let ambient_pressure     = next().into_iter().map(|p| p * KPA_TO_HPA).collect();
    let internal_temperature = next().into_iter().map(|c| c + CELSIUS_TO_KELVIN).collect();
    let internal_humidity    = next();
    let dni                  = next();
    let channels: Vec<Vec<f64>> = wavelengths.iter().map(|_| next()).collect();

    let mut aod = Vec::with_capacity(times.len() * wavelengths.len());
    for row in 0..times.len() {
        aod.extend(channels.iter().map(|ch| ch[row]));
    }
    trace!("aod matrix {}×{}", times.len(), wavelengths.len());

    Ok(Observations {
        times,
        elevation,
        azimuth,
        ambient_temperature,
        ambient_pressure,
        internal_temperature,
        internal_humidity,
        dni,
        wavelengths: wavelengths.to_vec(),
        aod,
    })
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ConvertError::MissingColumn(name.to_string()))
}

/// 1-based line in the source file, header included.
fn line_of(rec: &StringRecord, row: usize) -> usize {
    rec.position().map_or(row + 2, |p| p.line() as usize)
}

pub fn parse_timestamp(field: &str, line: usize) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT).map_err(|_| ConvertError::BadTimestamp {
        line,
        value: field.to_string(),
    })
}

fn parse_column(records: &[StringRecord], name: &str, idx: usize) -> Result<Vec<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(row, rec)| {
            let field = rec.get(idx).unwrap_or("");
            // blank cells are missing data, not malformed
            if field.is_empty() {
                return Ok(f64::NAN);
            }
            field.parse::<f64>().map_err(|_| ConvertError::BadValue {
                line: line_of(rec, row),
                column: name.to_string(),
                value: field.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aod_column_name_uses_shortest_display() {
        assert_eq!(aod_column_name(368.0), "AOD 368 nm");
        assert_eq!(aod_column_name(412.5), "AOD 412.5 nm");
        assert_eq!(aod_column_name(1024.0), "AOD 1024 nm");
    }

    #[test]
    fn timestamp_needs_space_separated_format() {
        let t = parse_timestamp("2023-01-01 00:10:00", 2).unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "00:10");
        let err = parse_timestamp("2023-01-01T00:10:00", 7).unwrap_err();
        assert!(matches!(err, ConvertError::BadTimestamp { line: 7, .. }));
    }

    #[test]
    fn column_index_is_exact_match() {
        let headers = StringRecord::from(vec!["Timestamp", "AOD 368.0 nm", " DNI (W/m2)"]);
        assert_eq!(column_index(&headers, "Timestamp").unwrap(), 0);
        assert!(column_index(&headers, "AOD 368 nm").is_err());
        assert!(column_index(&headers, DNI_COLUMN).is_err());
    }
}
