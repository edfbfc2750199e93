//! One CSV in, one aerosol-optical-depth file out.

use crate::amof_file::AmofFile;
use crate::cleanup::{remove_empty_variables, ALWAYS_KEEP};
use crate::ingest::{read_observations, Observations};
use crate::metadata::add_metadata_to_netcdf;
use crate::template::{create_netcdf, TemplateRequest};
use crate::times::{format_coverage, get_times, TimeFields};
use crate::vocab::{ProductDefinition, VocabSource};
use crate::{timeit, DEFAULT_WAVELENGTHS, DEPLOYMENT_MODE, INSTRUMENT, PLATFORM, PRODUCT, PRODUCT_VERSION};
use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const AOD_VARIABLE:        &str = "atmosphere_optical_thickness_due_to_ambient_aerosol_particles";
pub const WAVELENGTH_VARIABLE: &str = "instrument_channel_wavelength";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input_csv:       PathBuf,
    pub metadata_file:   Option<PathBuf>,
    pub ncfile_location: PathBuf,
    pub vocab:           VocabSource,
    pub wavelengths:     Vec<f64>,
}

impl ConvertOptions {
    /// Defaults: no metadata, current directory, bundled vocabulary, six channels.
    pub fn new(input_csv: impl Into<PathBuf>) -> Self {
        ConvertOptions {
            input_csv:       input_csv.into(),
            metadata_file:   None,
            ncfile_location: PathBuf::from("."),
            vocab:           VocabSource::Bundled,
            wavelengths:     DEFAULT_WAVELENGTHS.to_vec(),
        }
    }
}

/// Returns the path of the finished file.
pub fn make_netcdf_aerosol_optical_depth(opts: &ConvertOptions) -> Result<PathBuf> {
    info!("Making {PRODUCT} netCDF file");
    info!("Reading data");
    let obs = timeit("read_observations", || read_observations(&opts.input_csv, &opts.wavelengths))
        .with_context(|| format!("reading {}", opts.input_csv.display()))?;
    let times = get_times(&obs.times).with_context(|| format!("deriving times from {}", opts.input_csv.display()))?;
    debug!("{} observations, {} channels, file date {}", obs.len(), obs.wavelengths.len(), times.file_date);

    let def = ProductDefinition::load(&opts.vocab, INSTRUMENT, PRODUCT, DEPLOYMENT_MODE)
        .context("loading product definition")?;

    info!("Creating file");
    let lengths = BTreeMap::from([
        ("time".to_string(), obs.len()),
        ("index".to_string(), obs.wavelengths.len()),
    ]);
    let req = TemplateRequest {
        platform:          PLATFORM,
        date:              &times.file_date,
        dimension_lengths: &lengths,
        file_location:     &opts.ncfile_location,
        product_version:   PRODUCT_VERSION,
    };
    let mut nc = timeit("create_netcdf", || create_netcdf(&def, &req))
        .with_context(|| format!("creating file in {}", opts.ncfile_location.display()))?;

    info!("Adding data to variables");
    timeit("update_variables", || populate(&mut nc, &obs, &times))
        .with_context(|| format!("writing {}", nc.path().display()))?;

    info!("Setting global attributes");
    nc.set_attribute("time_coverage_start", &format_coverage(times.time_coverage_start)?)?;
    nc.set_attribute("time_coverage_end", &format_coverage(times.time_coverage_end)?)?;

    if let Some(path) = &opts.metadata_file {
        add_metadata_to_netcdf(&mut nc, Some(path))
            .with_context(|| format!("applying metadata from {}", path.display()))?;
    }

    // lat/lon may only be known once the metadata is in
    nc.update_geospatial_bounds()?;

    let path = nc.close();

    info!("Removing empty variables");
    timeit("remove_empty_variables", || remove_empty_variables(&path, &ALWAYS_KEEP))
        .with_context(|| format!("removing empty variables from {}", path.display()))?;

    info!("Complete");
    Ok(path)
}

fn populate(nc: &mut AmofFile, obs: &Observations, times: &TimeFields) -> crate::Result<()> {
    nc.update_variable(AOD_VARIABLE, &obs.aod)?;
    nc.update_variable(WAVELENGTH_VARIABLE, &obs.wavelengths)?;

    nc.update_variable("time", &times.unix_times)?;
    nc.update_variable("year", &times.years)?;
    nc.update_variable("month", &times.months)?;
    nc.update_variable("day", &times.days)?;
    nc.update_variable("hour", &times.hours)?;
    nc.update_variable("minute", &times.minutes)?;
    nc.update_variable("second", &times.seconds)?;
    nc.update_variable("day_of_year", &times.day_of_year)?;
    Ok(())
}
