//! Shared type definitions and newtypes

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spend (in IDR) that earns one loyalty point
pub const IDR_PER_POINT: u64 = 1_000_000;

/// Purchase amount in Indonesian Rupiah (for clarity in function signatures)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Idr(pub u64);

impl Idr {
    pub fn new(amount: u64) -> Self {
        Idr(amount)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Points earned for this purchase, rounded down
    pub fn points(&self) -> u32 {
        u32::try_from(self.0 / IDR_PER_POINT).unwrap_or(u32::MAX)
    }
}

/// Row id as returned by the backend: can be number or string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    /// Normalize to the string form used for user and reward ids
    pub fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }

    /// Convert to a numeric theme id.
    ///
    /// Numbers must fit in `u32`; strings must be a plain decimal number
    /// (surrounding whitespace is ignored). Anything else is rejected.
    pub fn to_u32(&self) -> Result<u32> {
        match self {
            RawId::Number(n) => u32::try_from(*n)
                .map_err(|_| Error::InvalidData(format!("id {} out of range", n))),
            RawId::Text(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::InvalidData(format!("id '{}' is not numeric", s))),
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}
