use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar clamped to `0.0..=1.0`.
///
/// Used for suspicion, congestion, intensity, and reliability so that every
/// write goes through the clamp. Non-finite input collapses to zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct UnitInterval(f64);

impl UnitInterval {
    /// Zero.
    pub const ZERO: Self = Self(0.0);
    /// One.
    pub const ONE: Self = Self(1.0);

    /// Clamp `value` into the unit interval.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::ZERO
        }
    }

    /// The underlying value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Add `amount`, saturating at one.
    pub fn raise(self, amount: f64) -> Self {
        Self::new(self.0 + amount)
    }

    /// Subtract `amount`, saturating at zero.
    pub fn lower(self, amount: f64) -> Self {
        Self::new(self.0 - amount)
    }

    /// Whether the value is exactly zero.
    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }
}

impl From<f64> for UnitInterval {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<UnitInterval> for f64 {
    fn from(value: UnitInterval) -> f64 {
        value.0
    }
}

impl fmt::Display for UnitInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_on_construction() {
        assert_eq!(UnitInterval::new(1.7).get(), 1.0);
        assert_eq!(UnitInterval::new(-0.2).get(), 0.0);
        assert_eq!(UnitInterval::new(f64::NAN).get(), 0.0);
        assert!((UnitInterval::new(0.4).get() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn raise_and_lower_saturate() {
        let v = UnitInterval::new(0.9).raise(0.5);
        assert_eq!(v, UnitInterval::ONE);
        let v = v.lower(3.0);
        assert!(v.is_zero());
    }

    #[test]
    fn deserialize_clamps() {
        let v: UnitInterval = serde_json::from_str("4.0").unwrap();
        assert_eq!(v, UnitInterval::ONE);
    }
}
