//! Numeric storage types used by AMOF variables.

use crate::error::{ConvertError, Result};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;

// netCDF-C default fill values (netcdf.h)
pub const NC_FILL_BYTE:   i8  = -127;
pub const NC_FILL_INT:    i32 = -2_147_483_647;
pub const NC_FILL_FLOAT:  f32 = 9.969_209_968_386_869e36;
pub const NC_FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcKind {
    F64,
    F32,
    I32,
    I8,
}

impl NcKind {
    /// Parse the `type` column of a variable table.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "float64" | "double" => Ok(NcKind::F64),
            "float32" | "float"  => Ok(NcKind::F32),
            "int32"   | "int"    => Ok(NcKind::I32),
            "int8"    | "byte"   => Ok(NcKind::I8),
            other => Err(ConvertError::UnsupportedType(other.to_string())),
        }
    }

    /// Storage type of a variable already in a file.
    pub fn of_variable(var: &netcdf::Variable) -> Result<Self> {
        match var.vartype() {
            NcVariableType::Float(FloatType::F64) => Ok(NcKind::F64),
            NcVariableType::Float(FloatType::F32) => Ok(NcKind::F32),
            NcVariableType::Int(IntType::I32)     => Ok(NcKind::I32),
            NcVariableType::Int(IntType::I8)      => Ok(NcKind::I8),
            _ => Err(ConvertError::UnsupportedType(format!("variable '{}'", var.name()))),
        }
    }

    pub fn default_fill(self) -> f64 {
        match self {
            NcKind::F64 => NC_FILL_DOUBLE,
            NcKind::F32 => f64::from(NC_FILL_FLOAT),
            NcKind::I32 => f64::from(NC_FILL_INT),
            NcKind::I8  => f64::from(NC_FILL_BYTE),
        }
    }

    /// `v` after a round trip through this storage type.
    pub fn cast(self, v: f64) -> f64 {
        match self {
            NcKind::F64 => v,
            NcKind::F32 => f64::from(v as f32),
            NcKind::I32 => f64::from(v as i32),
            NcKind::I8  => f64::from(v as i8),
        }
    }

    /// Typed attribute value; a single value becomes a scalar attribute.
    pub fn attribute(self, values: &[f64]) -> AttributeValue {
        match (self, values) {
            (NcKind::F64, [v]) => AttributeValue::Double(*v),
            (NcKind::F32, [v]) => AttributeValue::Float(*v as f32),
            (NcKind::I32, [v]) => AttributeValue::Int(*v as i32),
            (NcKind::I8,  [v]) => AttributeValue::Schar(*v as i8),
            (NcKind::F64, vs)  => AttributeValue::Doubles(vs.to_vec()),
            (NcKind::F32, vs)  => AttributeValue::Floats(vs.iter().map(|v| *v as f32).collect()),
            (NcKind::I32, vs)  => AttributeValue::Ints(vs.iter().map(|v| *v as i32).collect()),
            (NcKind::I8,  vs)  => AttributeValue::Schars(vs.iter().map(|v| *v as i8).collect()),
        }
    }
}

/// Run `$body` with `$t` aliased to the Rust type stored for `$kind`.
macro_rules! with_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            $crate::kind::NcKind::F64 => { type $t = f64; $body }
            $crate::kind::NcKind::F32 => { type $t = f32; $body }
            $crate::kind::NcKind::I32 => { type $t = i32; $body }
            $crate::kind::NcKind::I8  => { type $t = i8;  $body }
        }
    };
}
pub(crate) use with_kind;
