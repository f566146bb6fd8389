use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Largest magnitude at which every integer still has an exact `f64` form.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Canonical course identifier. Every dedup, lookup and join compares these,
/// never the raw decoded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CourseId(i64);

/// A course id as it may surface from loosely typed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCourseId {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid course identifier: {0}")]
pub struct InvalidIdentifier(pub String);

pub fn normalize(raw: RawCourseId) -> Result<CourseId, InvalidIdentifier> {
    match raw {
        RawCourseId::Int(id) => Ok(CourseId(id)),
        RawCourseId::Float(value) => {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(InvalidIdentifier(value.to_string()));
            }
            // past 2^53 the float may no longer be the integer that was sent
            if value.abs() > MAX_EXACT_FLOAT_INT {
                return Err(InvalidIdentifier(value.to_string()));
            }
            Ok(CourseId(value as i64))
        }
    }
}

impl CourseId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for CourseId {
    fn from(id: i64) -> Self {
        CourseId(id)
    }
}

impl TryFrom<f64> for CourseId {
    type Error = InvalidIdentifier;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        normalize(RawCourseId::Float(value))
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for CourseId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawCourseId::deserialize(deserializer)?;
        normalize(raw).map_err(serde::de::Error::custom)
    }
}
