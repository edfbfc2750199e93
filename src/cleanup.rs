//! Remove template variables that were never populated.
//!
//! netCDF has no "delete variable", so a file with empty variables is copied
//! to a sibling without them and moved back over the original.

use crate::error::Result;
use crate::kind::{with_kind, NcKind};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Coordinates stay even when unset; AMOF files always carry them.
pub const ALWAYS_KEEP: [&str; 2] = ["latitude", "longitude"];

/// Every element equals the fill value (explicit or netCDF default) or is NaN.
pub fn is_empty_variable(var: &netcdf::Variable) -> Result<bool> {
    let kind = NcKind::of_variable(var)?;
    with_kind!(kind, V => {
        let fill = var.fill_value::<V>()?.map_or(kind.default_fill(), |f| f as f64);
        let values = var.get_values::<V, _>(..)?;
        Ok(values.iter().all(|&x| {
            let x = x as f64;
            x.is_nan() || x == fill
        }))
    })
}

/// Returns the names of the variables removed.
pub fn remove_empty_variables(path: &Path, skip_check: &[&str]) -> Result<Vec<String>> {
    let empty = {
        let src = netcdf::open(path)?;
        let mut empty = Vec::new();
        for var in src.variables() {
            let name = var.name();
            if skip_check.contains(&name.as_str()) {
                continue;
            }
            if is_empty_variable(&var)? {
                empty.push(name);
            }
        }
        empty
    };

    if empty.is_empty() {
        debug!("no empty variables in {}", path.display());
        return Ok(empty);
    }
    info!("Removing {} empty variable(s): {}", empty.len(), empty.join(", "));

    let tmp = path.with_extension("nc.tmp");
    rewrite_without(path, &tmp, &empty)?;
    fs::rename(&tmp, path)?;
    Ok(empty)
}

fn rewrite_without(src_path: &Path, dst_path: &Path, skip: &[String]) -> Result<()> {
    let src = netcdf::open(src_path)?;
    let mut dst = netcdf::create(dst_path)?;

    for dim in src.dimensions() {
        if dim.is_unlimited() {
            dst.add_unlimited_dimension(&dim.name())?;
        } else {
            dst.add_dimension(&dim.name(), dim.len())?;
        }
    }

    for attr in src.attributes() {
        dst.add_attribute(attr.name(), attr.value()?)?;
    }

    for var in src.variables() {
        if skip.contains(&var.name()) {
            continue;
        }
        copy_variable(&var, &mut dst)?;
    }
    Ok(())
}

/// Attributes go first so `_FillValue` is set before any data.
fn copy_variable(var: &netcdf::Variable, dst: &mut netcdf::FileMut) -> Result<()> {
    let kind = NcKind::of_variable(var)?;
    let name = var.name();
    let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let dims: Vec<&str> = dim_names.iter().map(String::as_str).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let unlimited = var.dimensions().iter().any(|d| d.is_unlimited());

    with_kind!(kind, V => {
        let data = var.get_values::<V, _>(..)?;
        let mut out = dst.add_variable::<V>(&name, &dims)?;
        for attr in var.attributes() {
            out.put_attribute(attr.name(), attr.value()?)?;
        }
        if unlimited {
            // unlimited dimensions start at length 0 in the new file
            let start = vec![0usize; shape.len()];
            out.put_values(&data, (start.as_slice(), shape.as_slice()))?;
        } else {
            out.put_values(&data, ..)?;
        }
    });
    debug!("copied {name} {shape:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_only_unwritten_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleanup.nc");
        {
            let mut nc = netcdf::create(&path).unwrap();
            nc.add_dimension("time", 3).unwrap();
            nc.add_dimension("latitude", 1).unwrap();
            nc.add_attribute("title", "cleanup test").unwrap();
            {
                let mut v = nc.add_variable::<f32>("aod", &["time"]).unwrap();
                v.set_fill_value(-1.0e20f32).unwrap();
                v.put_attribute("units", "1").unwrap();
                v.put_values(&[0.1f32, -1.0e20, 0.3], ..).unwrap();
            }
            {
                let mut v = nc.add_variable::<f32>("unused", &["time"]).unwrap();
                v.set_fill_value(-1.0e20f32).unwrap();
            }
            nc.add_variable::<i8>("qc_flag", &["time"]).unwrap();
            nc.add_variable::<f32>("latitude", &["latitude"]).unwrap();
        }

        let removed = remove_empty_variables(&path, &ALWAYS_KEEP).unwrap();
        assert_eq!(removed, vec!["unused".to_string(), "qc_flag".to_string()]);

        let nc = netcdf::open(&path).unwrap();
        assert!(nc.variable("unused").is_none());
        assert!(nc.variable("qc_flag").is_none());
        assert!(nc.variable("latitude").is_some());
        let aod = nc.variable("aod").unwrap();
        assert_eq!(aod.get_values::<f32, _>(..).unwrap(), vec![0.1, -1.0e20, 0.3]);
        assert_eq!(aod.fill_value::<f32>().unwrap(), Some(-1.0e20));
        assert!(matches!(
            nc.attribute("title").unwrap().value().unwrap(),
            netcdf::AttributeValue::Str(ref s) if s == "cleanup test"
        ));
        assert!(!dir.path().join("cleanup.nc.tmp").exists());
    }

    #[test]
    fn nothing_to_remove_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.nc");
        {
            let mut nc = netcdf::create(&path).unwrap();
            nc.add_dimension("time", 2).unwrap();
            let mut v = nc.add_variable::<f64>("time", &["time"]).unwrap();
            v.put_values(&[1.0f64, 2.0], ..).unwrap();
        }
        assert!(remove_empty_variables(&path, &ALWAYS_KEEP).unwrap().is_empty());
        assert_eq!(
            netcdf::open(&path).unwrap().variable("time").unwrap().get_values::<f64, _>(..).unwrap(),
            vec![1.0, 2.0]
        );
    }
}
