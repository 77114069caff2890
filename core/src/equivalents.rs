//! Conversion of CO2 savings into human-relatable distances.
//!
//! The conversion is a fixed table of emission factors (kilograms of CO2 per
//! passenger-kilometre). [`EquivalenceFactors::equivalents`] is pure, so the
//! same total always produces the same distances.

use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Default car emission factor, kg CO2 per passenger-km.
pub const CAR_KG_PER_KM: f64 = 0.171;
/// Default bus emission factor, kg CO2 per passenger-km.
pub const BUS_KG_PER_KM: f64 = 0.097;
/// Default plane emission factor, kg CO2 per passenger-km.
pub const PLANE_KG_PER_KM: f64 = 0.246;

/// Distances that emit the same amount of CO2 as was saved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Equivalents {
    /// Kilometres driven by car
    pub car_km: f64,
    /// Kilometres travelled by bus
    pub bus_km: f64,
    /// Kilometres flown
    pub plane_km: f64,
}

impl Add for Equivalents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            car_km: self.car_km + rhs.car_km,
            bus_km: self.bus_km + rhs.bus_km,
            plane_km: self.plane_km + rhs.plane_km,
        }
    }
}

/// Emission factors used to compute [`Equivalents`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceFactors {
    /// kg CO2 per car-km
    pub car_kg_per_km: f64,
    /// kg CO2 per bus-km
    pub bus_kg_per_km: f64,
    /// kg CO2 per plane-km
    pub plane_kg_per_km: f64,
}

impl Default for EquivalenceFactors {
    fn default() -> Self {
        Self {
            car_kg_per_km: CAR_KG_PER_KM,
            bus_kg_per_km: BUS_KG_PER_KM,
            plane_kg_per_km: PLANE_KG_PER_KM,
        }
    }
}

impl EquivalenceFactors {
    /// Converts a CO2 total into equivalent distances.
    ///
    /// Negative or non-finite totals are treated as zero.
    #[must_use]
    pub fn equivalents(&self, total_co2: f64) -> Equivalents {
        let total = if total_co2.is_finite() && total_co2 > 0.0 {
            total_co2
        } else {
            0.0
        };

        Equivalents {
            car_km: per_factor(total, self.car_kg_per_km),
            bus_km: per_factor(total, self.bus_kg_per_km),
            plane_km: per_factor(total, self.plane_kg_per_km),
        }
    }
}

fn per_factor(total: f64, factor: f64) -> f64 {
    if factor > 0.0 { total / factor } else { 0.0 }
}

/// Converts a CO2 total using the default factors.
#[must_use]
pub fn equivalents(total_co2: f64) -> Equivalents {
    EquivalenceFactors::default().equivalents(total_co2)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_total_is_all_zero() {
        assert_eq!(equivalents(0.0), Equivalents::default());
    }

    #[test]
    fn test_negative_total_is_clamped() {
        assert_eq!(equivalents(-3.0), Equivalents::default());
        assert_eq!(equivalents(f64::NAN), Equivalents::default());
    }

    #[test]
    fn test_known_factor() {
        let factors = EquivalenceFactors {
            car_kg_per_km: 0.5,
            bus_kg_per_km: 0.25,
            plane_kg_per_km: 2.0,
        };

        let eq = factors.equivalents(6.0);
        assert_eq!(eq.car_km, 12.0);
        assert_eq!(eq.bus_km, 24.0);
        assert_eq!(eq.plane_km, 3.0);
    }

    #[test]
    fn test_add_sums_each_mode() {
        let a = Equivalents {
            car_km: 1.0,
            bus_km: 2.0,
            plane_km: 3.0,
        };
        let sum = a + a;
        assert_eq!(sum.car_km, 2.0);
        assert_eq!(sum.bus_km, 4.0);
        assert_eq!(sum.plane_km, 6.0);
    }

    proptest! {
        #[test]
        fn prop_equivalents_are_monotonic(a in 0.0f64..10_000.0, b in 0.0f64..10_000.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let lo = equivalents(low);
            let hi = equivalents(high);
            prop_assert!(lo.car_km <= hi.car_km);
            prop_assert!(lo.bus_km <= hi.bus_km);
            prop_assert!(lo.plane_km <= hi.plane_km);
        }

        #[test]
        fn prop_equivalents_are_deterministic(total in 0.0f64..10_000.0) {
            prop_assert_eq!(equivalents(total), equivalents(total));
        }
    }
}
