//! Hash key module
//!
//! Positions on the angular ring. Keys are fixed-point (16 fractional
//! bits) so midpoint virtual keys stay exact under comparison, ordering is
//! total, and keys can index a map — floats would make near-equal ring
//! positions ambiguous.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const FRAC_BITS: u32 = 16;
const SCALE: f64 = (1u64 << FRAC_BITS) as f64;

/// A position on the hash ring, in `[0, hash_max]`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey(u64);

impl HashKey {
    /// The origin of the ring
    pub const ZERO: Self = Self(0);

    /// Convert from a JSON number; rejects negative and non-finite values
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() && value >= 0.0 {
            Some(Self((value * SCALE).round() as u64))
        } else {
            None
        }
    }

    /// Convert from a JSON number, clamping invalid values to the origin.
    ///
    /// Lookup keys wrap anyway, so out-of-domain requests still route
    /// somewhere instead of failing.
    pub fn saturating_from_f64(value: f64) -> Self {
        Self::from_f64(value).unwrap_or(Self::ZERO)
    }

    /// Back to a JSON number
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE
    }

    /// Midpoint of two keys; exact in fixed point
    pub fn midpoint(lo: Self, hi: Self) -> Self {
        Self((lo.0 + hi.0) / 2)
    }
}

impl From<u32> for HashKey {
    fn from(value: u32) -> Self {
        Self(u64::from(value) << FRAC_BITS)
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl Serialize for HashKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for HashKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).ok_or_else(|| {
            serde::de::Error::custom("hash key must be a non-negative finite number")
        })
    }
}
