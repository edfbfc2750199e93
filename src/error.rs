//! Error type shared by the library modules.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// A header the instrument CSV must carry is absent
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: could not parse '{value}' in column '{column}' as a number")]
    BadValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("line {line}: could not parse timestamp '{value}' (expected YYYY-MM-DD HH:MM:SS)")]
    BadTimestamp { line: usize, value: String },

    #[error("epoch {0} s is outside the representable date range")]
    TimeOutOfRange(f64),

    #[error("input contains no observations")]
    NoObservations,

    #[error("at least one wavelength is required")]
    NoWavelengths,

    #[error("instrument '{0}' is not in the instrument vocabulary")]
    UnknownInstrument(String),

    #[error("vocabulary table '{0}' is not available")]
    MissingVocabulary(String),

    #[error("{table}: {message}")]
    MalformedVocabulary { table: String, message: String },

    #[error("no length given for dimension '{0}'")]
    MissingDimensionLength(String),

    #[error("unsupported variable type '{0}'")]
    UnsupportedType(String),

    #[error("variable '{0}' not found in file")]
    MissingVariable(String),

    #[error("variable '{name}' holds {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("metadata line {line}: {message}")]
    MalformedMetadata { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
