//! # Unit Types
//!
//! Type-safe wrappers for the native unit of each discipline. These are
//! lightweight newtypes over `f64` that the reference calculators use to
//! keep their arithmetic honest; load records themselves carry a plain unit
//! label string so that externally produced loads in any unit can be
//! registered.
//!
//! ## Native Units (SI)
//!
//! - Structural: kilonewtons (kN), area pressure in kilopascals (kPa)
//! - Thermal and electrical: kilowatts (kW), densities in W/m²
//! - Plumbing: litres per second (L/s)
//!
//! ## Example
//!
//! ```rust
//! use load_core::units::{Kilopascals, Kilonewtons, SquareMeters, WattsPerSquareMeter, Kilowatts};
//!
//! let dead: Kilonewtons = Kilopascals(4.0) * SquareMeters(250.0);
//! assert_eq!(dead.0, 1000.0);
//!
//! let lighting: Kilowatts = WattsPerSquareMeter(10.0) * SquareMeters(250.0);
//! assert_eq!(lighting.0, 2.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Geometry
// ============================================================================

/// Floor area in square metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl Mul<Meters> for Meters {
    type Output = SquareMeters;
    fn mul(self, rhs: Meters) -> SquareMeters {
        SquareMeters(self.0 * rhs.0)
    }
}

// ============================================================================
// Structural
// ============================================================================

/// Force in kilonewtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilonewtons(pub f64);

/// Area pressure in kilopascals (kN/m²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilopascals(pub f64);

impl Mul<SquareMeters> for Kilopascals {
    type Output = Kilonewtons;
    fn mul(self, rhs: SquareMeters) -> Kilonewtons {
        Kilonewtons(self.0 * rhs.0)
    }
}

/// Wind velocity in metres per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

impl MetersPerSecond {
    /// Velocity pressure q = ½ρv² with ρ = 1.225 kg/m³
    pub fn velocity_pressure(self) -> Kilopascals {
        Kilopascals(0.613 * self.0 * self.0 / 1000.0)
    }
}

// ============================================================================
// Thermal / Electrical
// ============================================================================

/// Power in kilowatts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilowatts(pub f64);

/// Power density in watts per square metre
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WattsPerSquareMeter(pub f64);

impl Mul<SquareMeters> for WattsPerSquareMeter {
    type Output = Kilowatts;
    fn mul(self, rhs: SquareMeters) -> Kilowatts {
        Kilowatts(self.0 * rhs.0 / 1000.0)
    }
}

// ============================================================================
// Plumbing
// ============================================================================

/// Flow rate in litres per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LitersPerSecond(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|v| v.0).sum())
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(SquareMeters);
impl_arithmetic!(Meters);
impl_arithmetic!(Kilonewtons);
impl_arithmetic!(Kilopascals);
impl_arithmetic!(MetersPerSecond);
impl_arithmetic!(Kilowatts);
impl_arithmetic!(WattsPerSquareMeter);
impl_arithmetic!(LitersPerSecond);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_times_area() {
        let force = Kilopascals(2.4) * SquareMeters(100.0);
        assert!((force.0 - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_density_times_area() {
        let power = WattsPerSquareMeter(12.0) * SquareMeters(50.0);
        assert!((power.0 - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_pressure() {
        // 40 m/s -> 0.613 * 1600 / 1000 = 0.9808 kPa
        let q = MetersPerSecond(40.0).velocity_pressure();
        assert!((q.0 - 0.9808).abs() < 1e-9);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Kilowatts(10.0);
        let b = Kilowatts(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
        let total: Kilowatts = vec![a, b, Kilowatts(1.0)].into_iter().sum();
        assert_eq!(total.0, 16.0);
    }

    #[test]
    fn test_serialization() {
        let flow = LitersPerSecond(1.25);
        let json = serde_json::to_string(&flow).unwrap();
        assert_eq!(json, "1.25");

        let roundtrip: LitersPerSecond = serde_json::from_str(&json).unwrap();
        assert_eq!(flow, roundtrip);
    }
}
