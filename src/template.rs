//! Create an empty AMOF file from a product definition.

use crate::amof_file::AmofFile;
use crate::error::{ConvertError, Result};
use crate::kind::with_kind;
use crate::vocab::{DimensionLength, GlobalAttributeDef, ProductDefinition, VarAttr, DERIVED_FROM_FILE};
use crate::CHANGE_MARKER;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Run-specific inputs to the template.
#[derive(Debug, Clone)]
pub struct TemplateRequest<'a> {
    pub platform:          &'a str,
    /// `YYYYMMDD`
    pub date:              &'a str,
    /// Lengths for placeholder dimensions; also overrides fixed ones
    pub dimension_lengths: &'a BTreeMap<String, usize>,
    pub file_location:     &'a Path,
    pub product_version:   &'a str,
}

pub fn output_file_name(instrument: &str, platform: &str, date: &str, product: &str, version: &str) -> String {
    format!("{instrument}_{platform}_{date}_{product}_v{version}.nc")
}

pub fn output_path(def: &ProductDefinition, req: &TemplateRequest) -> PathBuf {
    req.file_location.join(output_file_name(
        &def.instrument.name,
        req.platform,
        req.date,
        &def.product,
        req.product_version,
    ))
}

/// Dimensions, typed variable placeholders and baseline global attributes.
/// An existing file at the output path is replaced.
pub fn create_netcdf(def: &ProductDefinition, req: &TemplateRequest) -> Result<AmofFile> {
    let path = output_path(def, req);
    if path.exists() {
        debug!("replacing existing {}", path.display());
        fs::remove_file(&path)?;
    }

    for name in req.dimension_lengths.keys() {
        if !def.dimensions.iter().any(|d| &d.name == name) {
            warn!("dimension '{name}' is not part of the {} template, ignored", def.product);
        }
    }

    let mut nc = netcdf::create(&path)?;

    for dim in &def.dimensions {
        let len = match (req.dimension_lengths.get(&dim.name), &dim.length) {
            (Some(&n), _) => n,
            (None, DimensionLength::Fixed(n)) => *n,
            (None, DimensionLength::Supplied) => {
                return Err(ConvertError::MissingDimensionLength(dim.name.clone()))
            }
        };
        nc.add_dimension(&dim.name, len)?;
    }

    for var in &def.variables {
        let dims: Vec<&str> = var.dimensions.iter().map(String::as_str).collect();
        with_kind!(var.kind, V => {
            let mut v = nc.add_variable::<V>(&var.name, &dims)?;
            if let Some(fill) = var.fill_value {
                v.set_fill_value(fill as V)?;
            }
            for (name, attr) in &var.attributes {
                match attr {
                    VarAttr::Text(s) => {
                        v.put_attribute(name, s.as_str())?;
                    }
                    VarAttr::Numbers(ns) => {
                        v.put_attribute(name, var.kind.attribute(ns))?;
                    }
                    VarAttr::DerivedRange => {}
                }
            }
        });
    }

    for attr in &def.global_attributes {
        match resolve_global(attr, def, req) {
            Some(value) => {
                nc.add_attribute(&attr.name, value.as_str())?;
            }
            None => debug!("global attribute {} is set later", attr.name),
        }
    }

    debug!("created {}", path.display());
    Ok(AmofFile::new(nc, path, &def.variables))
}

fn change(example: &str) -> String {
    format!("{CHANGE_MARKER}: {example}")
}

fn or_change(value: &str, example: &str) -> String {
    if value.is_empty() {
        change(example)
    } else {
        value.to_string()
    }
}

/// Value written at creation time, or `None` for attributes the pipeline
/// derives from the data.
fn resolve_global(attr: &GlobalAttributeDef, def: &ProductDefinition, req: &TemplateRequest) -> Option<String> {
    let inst = &def.instrument;
    Some(match attr.fixed_value.as_str() {
        "" => change(&attr.example),
        DERIVED_FROM_FILE => return None,
        "<instrument descriptor>" => or_change(&inst.descriptor, &attr.example),
        "<instrument manufacturer>" => or_change(&inst.manufacturer, &attr.example),
        "<instrument model>" => or_change(&inst.model, &attr.example),
        "<instrument serial number>" => or_change(&inst.serial_number, &attr.example),
        "<platform>" => req.platform.to_string(),
        "<deployment mode>" => def.loc.clone(),
        "<product version>" => format!("v{}", req.product_version),
        other if other.starts_with('<') && other.ends_with('>') => {
            warn!("unknown placeholder {other} for global attribute {}", attr.name);
            change(&attr.example)
        }
        fixed => fixed.to_string(),
    })
}
