//! Compile-time unit safety for depot-energy quantities.
//!
//! Prevents mixing incompatible units like kW and kWh, or km and kWh.
//!
//! All types use `#[repr(transparent)]` so they have the same memory layout
//! as `f64`; the wrappers cost nothing at runtime.
//!
//! ```
//! use chargeplan_core::units::{Kilowatts, KilowattHours};
//!
//! let p = Kilowatts(400.0);
//! let e = p.over_hours(0.25);
//! assert_eq!(e, KilowattHours(100.0));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
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

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Mul<$type> for f64 {
            type Output = $type;
            fn mul(self, rhs: $type) -> Self::Output {
                <$type>::new(self * rhs.0)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.2} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Minimum of two values
            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// Maximum of two values
            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Zero
            pub const ZERO: Self = Self(0.0);
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Electric power in kilowatts (kW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilowatts(pub f64);

impl_unit_ops!(Kilowatts, "kW");

/// Electric energy in kilowatt-hours (kWh)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct KilowattHours(pub f64);

impl_unit_ops!(KilowattHours, "kWh");

/// Driving distance in kilometres (km)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilometers(pub f64);

impl_unit_ops!(Kilometers, "km");

impl Kilowatts {
    /// Energy delivered when this power is sustained for `hours`.
    #[inline]
    pub fn over_hours(self, hours: f64) -> KilowattHours {
        KilowattHours(self.0 * hours)
    }
}

impl KilowattHours {
    /// Average power when this energy is spread over `hours`.
    #[inline]
    pub fn average_power(self, hours: f64) -> Kilowatts {
        Kilowatts(self.0 / hours)
    }
}

impl Kilometers {
    /// Energy drawn to drive this distance at `kwh_per_km`.
    #[inline]
    pub fn energy_at(self, kwh_per_km: f64) -> KilowattHours {
        KilowattHours(self.0 * kwh_per_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kilowatts_arithmetic() {
        let p1 = Kilowatts(150.0);
        let p2 = Kilowatts(50.0);

        assert_eq!((p1 + p2).value(), 200.0);
        assert_eq!((p1 - p2).value(), 100.0);
        assert_eq!((-p1).value(), -150.0);
        assert_eq!((p1 * 2.0).value(), 300.0);
        assert_eq!((2.0 * p1).value(), 300.0);
        assert_eq!((p1 / 2.0).value(), 75.0);
        assert_eq!(p1 / p2, 3.0);
    }

    #[test]
    fn test_power_energy_relationship() {
        let p = Kilowatts(400.0);
        assert_eq!(p.over_hours(0.25), KilowattHours(100.0));
        assert_eq!(KilowattHours(100.0).average_power(0.25), p);
    }

    #[test]
    fn test_distance_energy() {
        let d = Kilometers(250.0);
        assert_eq!(d.energy_at(1.1).value(), 275.0);
    }

    #[test]
    fn test_sum_iterator() {
        let draws = vec![Kilowatts(10.0), Kilowatts(20.0), Kilowatts(30.0)];
        let total: Kilowatts = draws.into_iter().sum();
        assert_eq!(total.value(), 60.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Kilowatts(400.0)), "400.00 kW");
        assert_eq!(format!("{}", KilowattHours(621.0)), "621.00 kWh");
        assert_eq!(format!("{}", Kilometers(285.0)), "285.00 km");
    }
}
