//! Handle on an open AMOF output file.

use crate::error::{ConvertError, Result};
use crate::kind::{with_kind, NcKind};
use crate::vocab::VariableDef;
use crate::CHANGE_MARKER;
use log::{debug, trace};
use netcdf::AttributeValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
struct Slot {
    kind:          NcKind,
    /// fill value as stored, i.e. already cast to `kind`
    fill:          f64,
    derived_range: bool,
}

/// Writable file created from a product template. Dropping it closes the
/// file; [`AmofFile::close`] does the same and hands back the path.
pub struct AmofFile {
    nc:    netcdf::FileMut,
    path:  PathBuf,
    slots: BTreeMap<String, Slot>,
}

impl AmofFile {
    pub(crate) fn new(nc: netcdf::FileMut, path: PathBuf, variables: &[VariableDef]) -> Self {
        let slots = variables
            .iter()
            .map(|v| {
                let slot = Slot {
                    kind:          v.kind,
                    fill:          v.kind.cast(v.effective_fill()),
                    derived_range: v.has_derived_range(),
                };
                (v.name.clone(), slot)
            })
            .collect();
        AmofFile { nc, path, slots }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn slot(&self, name: &str) -> Result<Slot> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| ConvertError::MissingVariable(name.to_string()))
    }

    /// Write every element of `name` in storage order. NaN becomes the fill
    /// value; a derived `valid_min`/`valid_max` is set from what was written.
    pub fn update_variable<T: Copy + Into<f64>>(&mut self, name: &str, values: &[T]) -> Result<()> {
        let slot = self.slot(name)?;
        let mut var = self
            .nc
            .variable_mut(name)
            .ok_or_else(|| ConvertError::MissingVariable(name.to_string()))?;

        let expected: usize = var.dimensions().iter().map(|d| d.len()).product();
        if expected != values.len() {
            return Err(ConvertError::ShapeMismatch {
                name: name.to_string(),
                expected,
                actual: values.len(),
            });
        }

        let values: Vec<f64> = values.iter().map(|&v| v.into()).collect();
        with_kind!(slot.kind, V => {
            let data: Vec<V> = values
                .iter()
                .map(|&v| if v.is_nan() { slot.fill as V } else { v as V })
                .collect();
            var.put_values(&data, ..)?;
        });

        if slot.derived_range {
            if let Some((lo, hi)) = finite_range(&values) {
                var.put_attribute("valid_min", slot.kind.attribute(&[lo]))?;
                var.put_attribute("valid_max", slot.kind.attribute(&[hi]))?;
            }
        }
        trace!("wrote {} values to {name}", values.len());
        Ok(())
    }

    /// First element of `name`, or `None` when it is masked (fill or NaN).
    pub fn first_value(&self, name: &str) -> Result<Option<f64>> {
        let slot = self.slot(name)?;
        let var = self
            .nc
            .variable(name)
            .ok_or_else(|| ConvertError::MissingVariable(name.to_string()))?;
        let first: Option<f64> = with_kind!(slot.kind, V => {
            var.get_values::<V, _>(..)?.first().map(|&x| x as f64)
        });
        Ok(first.filter(|v| !v.is_nan() && *v != slot.fill))
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.nc.add_attribute(name, value)?;
        Ok(())
    }

    /// Global attribute as text; `None` when absent or not a string.
    pub fn attribute_string(&self, name: &str) -> Result<Option<String>> {
        match self.nc.attribute(name) {
            None => Ok(None),
            Some(attr) => match attr.value()? {
                AttributeValue::Str(s) => Ok(Some(s)),
                _ => Ok(None),
            },
        }
    }

    /// Replace a `geospatial_bounds` still carrying the template marker with
    /// the point position, when latitude and longitude are both known.
    /// Returns whether the attribute changed.
    pub fn update_geospatial_bounds(&mut self) -> Result<bool> {
        let lat = self.first_value("latitude")?;
        let lon = self.first_value("longitude")?;
        let marked = self
            .attribute_string("geospatial_bounds")?
            .map_or(false, |s| s.contains(CHANGE_MARKER));

        match (marked, lat, lon) {
            (true, Some(lat), Some(lon)) => {
                let bounds = format!(
                    "{}N, {}E",
                    format_coordinate(self.slot("latitude")?.kind, lat),
                    format_coordinate(self.slot("longitude")?.kind, lon),
                );
                debug!("geospatial_bounds = {bounds}");
                self.set_attribute("geospatial_bounds", &bounds)?;
                Ok(true)
            }
            _ => {
                debug!("geospatial_bounds left as is (marker: {marked}, lat: {lat:?}, lon: {lon:?})");
                Ok(false)
            }
        }
    }

    /// Flush and close the file.
    pub fn close(self) -> PathBuf {
        let AmofFile { nc, path, .. } = self;
        drop(nc);
        path
    }
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Shortest display in the stored type, so a float32 `51.5` prints as `51.5`.
fn format_coordinate(kind: NcKind, v: f64) -> String {
    match kind {
        NcKind::F32 => format!("{}", v as f32),
        _ => format!("{v}"),
    }
}
