//! Command-line arguments and logging setup.

use crate::convert::ConvertOptions;
use crate::vocab::VocabSource;
use crate::DEFAULT_WAVELENGTHS;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;

/// Create AMOF-compliant netCDF file for ncas-sunphotometer-3 instrument.
#[derive(Parser, Debug)]
#[command(name = "sunphotometer_to_netcdf", version)]
pub struct Args {
    /// Raw csv data from instrument.
    pub input_csv: PathBuf,

    /// Print out additional information (repeat for more).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// csv file with global attributes and additional metadata.
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,

    /// Path for where to save netCDF file.
    #[arg(short = 'o', long = "ncfile-location", default_value = ".")]
    pub ncfile_location: PathBuf,

    /// Path where local copy of AMF_CVs tsv files are, for 'offline' use.
    /// Bundled tables are used when not given.
    #[arg(short = 't', long = "tsv-location", env = "AMF_CVS_TSV_LOCATION")]
    pub tsv_location: Option<PathBuf>,

    /// Wavelength(s) in nanometres used by instrument.
    #[arg(short, long, num_args = 1.., default_values_t = DEFAULT_WAVELENGTHS)]
    pub wavelengths: Vec<f64>,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn into_options(self) -> ConvertOptions {
        ConvertOptions {
            input_csv:       self.input_csv,
            metadata_file:   self.metadata,
            ncfile_location: self.ncfile_location,
            vocab:           VocabSource::from_option(self.tsv_location),
            wavelengths:     self.wavelengths,
        }
    }
}

/// `RUST_LOG`, when set, takes precedence over the verbosity flag.
pub fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}
