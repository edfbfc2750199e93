//! User metadata merged into the output file.
//!
//! The file is a headerless CSV of `name,value` rows. Everything after the
//! first field is the value, so values may contain commas.

use crate::amof_file::AmofFile;
use crate::error::{ConvertError, Result};
use log::{debug, info};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub line:  usize,
    pub name:  String,
    pub value: String,
}

/// Blank lines and `#` comments are skipped. Later rows win over earlier
/// rows with the same name when applied.
pub fn read_metadata(path: &Path) -> Result<Vec<MetadataEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)?;

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let line = rec.position().map_or(0, |p| p.line() as usize);
        let name = rec.get(0).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let value = rec.iter().skip(1).collect::<Vec<_>>().join(",").trim().to_string();
        out.push(MetadataEntry { line, name: name.to_string(), value });
    }
    Ok(out)
}

/// `latitude` and `longitude` rows fill the coordinate variables; all other
/// rows set the global attribute of the same name.
pub fn add_metadata_to_netcdf(file: &mut AmofFile, metadata_file: Option<&Path>) -> Result<()> {
    let Some(path) = metadata_file else {
        return Ok(());
    };
    let entries = read_metadata(path)?;
    info!("Adding {} metadata entries from {}", entries.len(), path.display());

    for entry in entries {
        match entry.name.as_str() {
            "latitude" | "longitude" => {
                let v: f64 = entry.value.parse().map_err(|_| ConvertError::MalformedMetadata {
                    line: entry.line,
                    message: format!("{} '{}' is not a number", entry.name, entry.value),
                })?;
                file.update_variable(&entry.name, &[v])?;
            }
            _ => file.set_attribute(&entry.name, &entry.value)?,
        }
        debug!("metadata {} = {}", entry.name, entry.value);
    }
    Ok(())
}
