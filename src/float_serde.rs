//! Serde adapters for floats that may be undefined.
//!
//! Undefined values are `NaN` in memory and `null` on the wire. JSON has
//! no representation for non-finite numbers, so infinities are written as
//! `null` too and read back as `NaN`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn to_wire(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn from_wire(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}

/// `f64` field.
pub(crate) mod nullable {
    use super::*;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_wire(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer).map(from_wire)
    }
}

/// `Vec<f64>` field.
pub(crate) mod nullable_vec {
    use super::*;

    pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|&v| to_wire(v)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(from_wire).collect())
    }
}

/// `Vec<Vec<f64>>` field (column-major data).
pub(crate) mod nullable_columns {
    use super::*;

    pub fn serialize<S>(columns: &[Vec<f64>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|c| c.iter().map(|&v| to_wire(v)).collect())
            .collect();
        wire.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|c| c.into_iter().map(from_wire).collect())
            .collect())
    }
}
