//! Controlled-vocabulary tables describing an AMOF product.
//!
//! The tables are tab-separated with a header row. They are read either from
//! a local directory laid out like the published vocabulary release
//! (`_common/`, `_instrument_vocabs/`, one directory per product) or from the
//! copies bundled into the binary.

use crate::error::{ConvertError, Result};
use crate::kind::NcKind;
use csv::StringRecord;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

pub const DERIVED_FROM_FILE: &str = "<derived from file>";

pub const INSTRUMENT_TABLE: &str = "_instrument_vocabs/ncas-instrument-name-and-descriptors.tsv";
pub const GLOBAL_ATTRIBUTE_TABLE: &str = "_common/global-attributes.tsv";

// ─────────────────────────────────────────────────────────────────────
// Where tables come from
// ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabSource {
    /// Tables compiled into the binary
    Bundled,
    /// Offline copy of the vocabulary release
    Local(PathBuf),
}

impl VocabSource {
    pub fn from_option(dir: Option<PathBuf>) -> Self {
        dir.map_or(VocabSource::Bundled, VocabSource::Local)
    }

    pub fn read_table(&self, rel: &str) -> Result<String> {
        match self {
            VocabSource::Bundled => bundled(rel)
                .map(str::to_string)
                .ok_or_else(|| ConvertError::MissingVocabulary(rel.to_string())),
            VocabSource::Local(dir) => {
                let path = dir.join(rel);
                if !path.is_file() {
                    return Err(ConvertError::MissingVocabulary(path.display().to_string()));
                }
                debug!("reading vocabulary table {}", path.display());
                Ok(fs::read_to_string(path)?)
            }
        }
    }
}

fn bundled(rel: &str) -> Option<&'static str> {
    Some(match rel {
        INSTRUMENT_TABLE => include_str!("../vocab/_instrument_vocabs/ncas-instrument-name-and-descriptors.tsv"),
        GLOBAL_ATTRIBUTE_TABLE => include_str!("../vocab/_common/global-attributes.tsv"),
        "_common/dimensions-land.tsv" => include_str!("../vocab/_common/dimensions-land.tsv"),
        "_common/variables-land.tsv" => include_str!("../vocab/_common/variables-land.tsv"),
        "aerosol-optical-depth/dimensions-specific.tsv" => {
            include_str!("../vocab/aerosol-optical-depth/dimensions-specific.tsv")
        }
        "aerosol-optical-depth/variables-specific.tsv" => {
            include_str!("../vocab/aerosol-optical-depth/variables-specific.tsv")
        }
        _ => return None,
    })
}

// ─────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentDef {
    pub name:          String,
    pub descriptor:    String,
    pub manufacturer:  String,
    pub model:         String,
    pub serial_number: String,
    pub data_products: Vec<String>,
    pub loc:           String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionLength {
    Fixed(usize),
    /// Placeholder such as `<i>`; the caller supplies the length
    Supplied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionDef {
    pub name:   String,
    pub length: DimensionLength,
    pub units:  String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarAttr {
    Text(String),
    /// Stored in the variable's own type
    Numbers(Vec<f64>),
    /// Filled in from the data when the variable is written
    DerivedRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name:       String,
    pub kind:       NcKind,
    pub dimensions: Vec<String>,
    pub fill_value: Option<f64>,
    pub attributes: Vec<(String, VarAttr)>,
}

impl VariableDef {
    /// Explicit fill value, or the netCDF default for the type.
    pub fn effective_fill(&self) -> f64 {
        self.fill_value.unwrap_or_else(|| self.kind.default_fill())
    }

    pub fn has_derived_range(&self) -> bool {
        self.attributes.iter().any(|(_, a)| *a == VarAttr::DerivedRange)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAttributeDef {
    pub name:        String,
    pub description: String,
    pub example:     String,
    pub fixed_value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    pub instrument:        InstrumentDef,
    pub product:           String,
    pub loc:               String,
    pub dimensions:        Vec<DimensionDef>,
    pub variables:         Vec<VariableDef>,
    pub global_attributes: Vec<GlobalAttributeDef>,
}

impl ProductDefinition {
    /// Common tables for `loc` first, then the product-specific ones.
    pub fn load(source: &VocabSource, instrument: &str, product: &str, loc: &str) -> Result<Self> {
        let instrument = find_instrument(&source.read_table(INSTRUMENT_TABLE)?, instrument)?;
        if !instrument.data_products.iter().any(|p| p == product) {
            warn!("{} does not list '{}' among its data products", instrument.name, product);
        }

        let mut dimensions = Vec::new();
        for rel in [format!("_common/dimensions-{loc}.tsv"), format!("{product}/dimensions-specific.tsv")] {
            dimensions.extend(parse_dimensions(&rel, &source.read_table(&rel)?)?);
        }

        let mut variables = Vec::new();
        for rel in [format!("_common/variables-{loc}.tsv"), format!("{product}/variables-specific.tsv")] {
            variables.extend(parse_variables(&rel, &source.read_table(&rel)?)?);
        }

        let global_attributes =
            parse_global_attributes(GLOBAL_ATTRIBUTE_TABLE, &source.read_table(GLOBAL_ATTRIBUTE_TABLE)?)?;

        debug!(
            "{instrument}/{product}: {} dimensions, {} variables, {} global attributes",
            dimensions.len(),
            variables.len(),
            global_attributes.len(),
            instrument = instrument.name,
        );

        Ok(ProductDefinition {
            instrument,
            product: product.to_string(),
            loc: loc.to_string(),
            dimensions,
            variables,
            global_attributes,
        })
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDef> {
        self.variables.iter().find(|v| v.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Table parsers
// ─────────────────────────────────────────────────────────────────────
fn tsv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes())
}

fn field(rec: &StringRecord, i: usize) -> &str {
    rec.get(i).unwrap_or("").trim()
}

fn malformed(table: &str, message: impl Into<String>) -> ConvertError {
    ConvertError::MalformedVocabulary { table: table.to_string(), message: message.into() }
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with('<') && value.ends_with('>')
}

pub fn find_instrument(text: &str, name: &str) -> Result<InstrumentDef> {
    let mut rdr = tsv_reader(text);
    let headers = rdr.headers()?.clone();
    let col = |h: &str| headers.iter().position(|x| x.trim() == h);
    let name_col = col("New Instrument Name")
        .ok_or_else(|| malformed(INSTRUMENT_TABLE, "no 'New Instrument Name' column"))?;

    for rec in rdr.records() {
        let rec = rec?;
        if field(&rec, name_col) != name {
            continue;
        }
        let get = |h: &str| col(h).map(|i| field(&rec, i).to_string()).unwrap_or_default();
        return Ok(InstrumentDef {
            name:          name.to_string(),
            descriptor:    get("Descriptor"),
            manufacturer:  get("Manufacturer"),
            model:         get("Model No."),
            serial_number: get("Serial Number"),
            data_products: get("Data Product(s)")
                .split(|c: char| c == ',' || c == '|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            loc:           get("Mobile/Fixed (loc)"),
        });
    }
    Err(ConvertError::UnknownInstrument(name.to_string()))
}

pub fn parse_dimensions(table: &str, text: &str) -> Result<Vec<DimensionDef>> {
    let mut out = Vec::new();
    for rec in tsv_reader(text).records() {
        let rec = rec?;
        let name = field(&rec, 0);
        if name.is_empty() {
            continue;
        }
        let raw = field(&rec, 1);
        let length = if is_placeholder(raw) {
            DimensionLength::Supplied
        } else {
            DimensionLength::Fixed(
                raw.parse()
                    .map_err(|_| malformed(table, format!("dimension '{name}' has length '{raw}'")))?,
            )
        };
        out.push(DimensionDef { name: name.to_string(), length, units: field(&rec, 2).to_string() });
    }
    Ok(out)
}

/// A variable row names the variable; the rows under it carry its
/// `Attribute`/`Value` pairs until the next named row.
pub fn parse_variables(table: &str, text: &str) -> Result<Vec<VariableDef>> {
    let mut raw: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for rec in tsv_reader(text).records() {
        let rec = rec?;
        let name = field(&rec, 0);
        if !name.is_empty() {
            raw.push((name.to_string(), Vec::new()));
            continue;
        }
        let attr = field(&rec, 1);
        if attr.is_empty() {
            continue;
        }
        match raw.last_mut() {
            Some((_, attrs)) => attrs.push((attr.to_string(), field(&rec, 2).to_string())),
            None => return Err(malformed(table, format!("attribute '{attr}' before any variable"))),
        }
    }
    raw.into_iter().map(|(name, attrs)| build_variable(table, name, attrs)).collect()
}

fn build_variable(table: &str, name: String, attrs: Vec<(String, String)>) -> Result<VariableDef> {
    let kind = attrs
        .iter()
        .find(|(a, _)| a == "type")
        .ok_or_else(|| malformed(table, format!("variable '{name}' has no type")))
        .and_then(|(_, v)| NcKind::parse(v))?;

    let number = |attr: &str, v: &str| -> Result<f64> {
        v.trim()
            .trim_end_matches('b')
            .parse::<f64>()
            .map_err(|_| malformed(table, format!("{name}:{attr} = '{v}' is not a number")))
    };

    let mut dimensions = Vec::new();
    let mut fill_value = None;
    let mut attributes = Vec::new();
    for (attr, value) in &attrs {
        match attr.as_str() {
            "type" => {}
            "dimension" => {
                dimensions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "_FillValue" => fill_value = Some(number(attr, value)?),
            "valid_min" | "valid_max" if value == DERIVED_FROM_FILE => {
                attributes.push((attr.clone(), VarAttr::DerivedRange));
            }
            "valid_min" | "valid_max" => {
                attributes.push((attr.clone(), VarAttr::Numbers(vec![number(attr, value)?])));
            }
            "flag_values" => {
                let values = value.split(',').map(|v| number(attr, v)).collect::<Result<Vec<_>>>()?;
                attributes.push((attr.clone(), VarAttr::Numbers(values)));
            }
            _ if is_placeholder(value) => debug!("{name}:{attr} left unset ({value})"),
            _ => attributes.push((attr.clone(), VarAttr::Text(value.clone()))),
        }
    }

    Ok(VariableDef { name, kind, dimensions, fill_value, attributes })
}

pub fn parse_global_attributes(table: &str, text: &str) -> Result<Vec<GlobalAttributeDef>> {
    let mut out = Vec::new();
    for rec in tsv_reader(text).records() {
        let rec = rec?;
        let name = field(&rec, 0);
        if name.is_empty() {
            continue;
        }
        if rec.len() < 3 {
            return Err(malformed(table, format!("attribute '{name}' has no example value")));
        }
        out.push(GlobalAttributeDef {
            name:        name.to_string(),
            description: field(&rec, 1).to_string(),
            example:     field(&rec, 2).to_string(),
            fixed_value: field(&rec, 3).to_string(),
        });
    }
    Ok(out)
}
