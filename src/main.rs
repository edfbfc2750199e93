// USAGE cargo run --release -- /path/to/sunphotometer.csv -m metadata.csv -o /path/to/output

use anyhow::Result;
use clap::Parser;
use log::info;
use sunphotometer_to_netcdf::cli::{init_logging, Args};
use sunphotometer_to_netcdf::convert::make_netcdf_aerosol_optical_depth;
use sunphotometer_to_netcdf::timeit;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level());

    let opts = args.into_options();
    let path = timeit("total", || make_netcdf_aerosol_optical_depth(&opts))?;
    info!("Finished OK → {}", path.display());
    Ok(())
}
