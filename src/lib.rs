// Library side of sunphotometer_to_netcdf: ncas-sunphotometer-3 CSV → AMOF NetCDF.

use log::debug;
use std::time::Instant;

pub mod kind;
pub mod error;
pub mod ingest;
pub mod times;
pub mod vocab;
pub mod template;
pub mod amof_file;
pub mod metadata;
pub mod cleanup;
pub mod convert;
pub mod cli;


pub use error::{ConvertError, Result};

// ─────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────
pub const INSTRUMENT:      &str = "ncas-sunphotometer-3";
pub const PLATFORM:        &str = "iao";
pub const PRODUCT:         &str = "aerosol-optical-depth";
pub const PRODUCT_VERSION: &str = "1.0";
pub const DEPLOYMENT_MODE: &str = "land";

pub const DEFAULT_WAVELENGTHS: [f64; 6] = [368.0, 412.0, 500.0, 675.0, 862.0, 1024.0];

pub const CELSIUS_TO_KELVIN: f64 = 273.15;
pub const KPA_TO_HPA:        f64 = 10.0;

/// Marker left in template attributes that still need a real value.
pub const CHANGE_MARKER: &str = "CHANGE";

// ─────────────────────────────────────────────────────────────────────
// Simple timing helper
// ─────────────────────────────────────────────────────────────────────
pub fn timeit<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let t0 = Instant::now();
    let out = f();
    debug!("{label:<28}{:?}", t0.elapsed());
    out
}
