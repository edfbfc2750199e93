use netcdf::AttributeValue;
use std::path::{Path, PathBuf};
use sunphotometer_to_netcdf::convert::{make_netcdf_aerosol_optical_depth, ConvertOptions, AOD_VARIABLE, WAVELENGTH_VARIABLE};

const EXPECTED_NAME: &str = "ncas-sunphotometer-3_iao_20230101_aerosol-optical-depth_v1.0.nc";

fn data(name: &str) -> PathBuf {
    Path::new("tests/data").join(name)
}

fn options(out: &Path, metadata: bool) -> ConvertOptions {
    let mut opts = ConvertOptions::new(data("sunphotometer_sample.csv"));
    opts.ncfile_location = out.to_path_buf();
    if metadata {
        opts.metadata_file = Some(data("metadata.csv"));
    }
    opts
}

fn global(nc: &netcdf::File, name: &str) -> String {
    match nc.attribute(name).unwrap().value().unwrap() {
        AttributeValue::Str(s) => s,
        _ => panic!("global attribute {name} is not text"),
    }
}

#[test]
fn sample_with_metadata() {
    let out = tempfile::tempdir().unwrap();
    let path = make_netcdf_aerosol_optical_depth(&options(out.path(), true)).unwrap();
    assert_eq!(path, out.path().join(EXPECTED_NAME));

    let nc = netcdf::open(&path).unwrap();
    assert_eq!(nc.dimension("time").unwrap().len(), 3);
    assert_eq!(nc.dimension("index").unwrap().len(), 6);

    let aod = nc.variable(AOD_VARIABLE).unwrap();
    let values = aod.get_values::<f32, _>(..).unwrap();
    assert_eq!(values.len(), 18);
    assert_eq!(&values[0..6], &[0.089f32, 0.078, 0.061, 0.045, 0.032, 0.021]);
    // blank 862 nm cell in the last row
    assert_eq!(values[2 * 6 + 4], -1.0e20f32);
    assert!(matches!(
        aod.attribute("valid_min").unwrap().value().unwrap(),
        AttributeValue::Float(v) if v == 0.020f32
    ));
    assert!(matches!(
        aod.attribute("valid_max").unwrap().value().unwrap(),
        AttributeValue::Float(v) if v == 0.091f32
    ));

    let wl = nc.variable(WAVELENGTH_VARIABLE).unwrap().get_values::<f32, _>(..).unwrap();
    assert_eq!(wl, vec![368.0f32, 412.0, 500.0, 675.0, 862.0, 1024.0]);

    let time = nc.variable("time").unwrap().get_values::<f64, _>(..).unwrap();
    assert_eq!(time, vec![1672531200.0, 1672531800.0, 1672532400.0]);
    let minute = nc.variable("minute").unwrap().get_values::<i8, _>(..).unwrap();
    assert_eq!(minute, vec![0, 10, 20]);
    let doy = nc.variable("day_of_year").unwrap().get_values::<f32, _>(..).unwrap();
    assert_eq!(doy, vec![1.0f32; 3]);

    assert_eq!(global(&nc, "time_coverage_start"), "2023-01-01T00:00:00");
    assert_eq!(global(&nc, "time_coverage_end"), "2023-01-01T00:20:00");
    assert_eq!(global(&nc, "creator_name"), "Jane Smith");
    assert_eq!(global(&nc, "location_keywords"), "Ilkley, West Yorkshire");
    assert_eq!(global(&nc, "geospatial_bounds"), "53.9N, -1.8E");
    assert_eq!(global(&nc, "platform"), "iao");
    assert_eq!(global(&nc, "product_version"), "v1.0");
    assert!(global(&nc, "title").starts_with("CHANGE"));

    let lat = nc.variable("latitude").unwrap().get_values::<f32, _>(..).unwrap();
    assert_eq!(lat, vec![53.9f32]);

    // never populated
    assert!(nc.variable("qc_flag").is_none());
    assert!(!out.path().join(format!("{EXPECTED_NAME}.tmp")).exists());
}

#[test]
fn without_metadata_bounds_keep_marker() {
    let out = tempfile::tempdir().unwrap();
    let path = make_netcdf_aerosol_optical_depth(&options(out.path(), false)).unwrap();

    let nc = netcdf::open(&path).unwrap();
    assert!(global(&nc, "geospatial_bounds").starts_with("CHANGE"));
    assert!(nc.variable("latitude").is_some());
    assert!(nc.variable("longitude").is_some());
    assert!(nc.variable("qc_flag").is_none());
}

#[test]
fn index_follows_wavelength_count() {
    let out = tempfile::tempdir().unwrap();
    let mut opts = options(out.path(), false);
    opts.wavelengths = vec![368.0, 500.0, 1024.0];
    let path = make_netcdf_aerosol_optical_depth(&opts).unwrap();

    let nc = netcdf::open(&path).unwrap();
    assert_eq!(nc.dimension("index").unwrap().len(), 3);
    let aod = nc.variable(AOD_VARIABLE).unwrap().get_values::<f32, _>(..).unwrap();
    assert_eq!(aod.len(), 9);
    assert_eq!(&aod[0..3], &[0.089f32, 0.061, 0.021]);
    let wl = nc.variable(WAVELENGTH_VARIABLE).unwrap().get_values::<f32, _>(..).unwrap();
    assert_eq!(wl, vec![368.0f32, 500.0, 1024.0]);
}

#[test]
fn rerun_replaces_with_same_content() {
    let out = tempfile::tempdir().unwrap();
    let opts = options(out.path(), true);

    let snapshot = |path: &Path| {
        let nc = netcdf::open(path).unwrap();
        let aod = nc.variable(AOD_VARIABLE).unwrap().get_values::<f32, _>(..).unwrap();
        let time = nc.variable("time").unwrap().get_values::<f64, _>(..).unwrap();
        let month = nc.variable("month").unwrap().get_values::<i8, _>(..).unwrap();
        let attrs: Vec<String> = ["time_coverage_start", "time_coverage_end", "geospatial_bounds", "creator_name"]
            .iter()
            .map(|name| global(&nc, name))
            .collect();
        let names: Vec<String> = nc.variables().map(|v| v.name()).collect();
        (aod, time, month, attrs, names)
    };

    let first = make_netcdf_aerosol_optical_depth(&opts).unwrap();
    let before = snapshot(&first);
    let second = make_netcdf_aerosol_optical_depth(&opts).unwrap();
    assert_eq!(first, second);
    assert_eq!(before, snapshot(&second));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn missing_input_column_leaves_no_file() {
    let out = tempfile::tempdir().unwrap();
    let mut opts = options(out.path(), false);
    opts.input_csv = data("missing_dni.csv");
    let err = make_netcdf_aerosol_optical_depth(&opts).unwrap_err();
    assert!(format!("{err:#}").contains("DNI (W/m2)"));
    assert!(!out.path().join(EXPECTED_NAME).exists());
}
