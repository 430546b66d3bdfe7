//! Big-M constants derived from the catalog.
//!
//! Every implication constraint of the form `a <= M · b` uses a constant
//! computed from the maximum physically realizable value of `a`, never a
//! guessed round number. Oversized constants widen the LP relaxation and
//! invite numerical trouble; undersized ones cut off legitimate solutions.

use chargeplan_core::Catalog;

/// The derived constants, computed once per model build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigM {
    /// Upper bound on the number of tours one truck can be assigned;
    /// used to sandwich the truck-used indicator.
    pub tour_count: f64,
    /// Energy ceiling applied to trucks of non-electric types, whose level
    /// is otherwise unconstrained. Sized to the largest electric battery in
    /// the catalog (zero when there is none, pinning idle levels to zero).
    pub idle_energy_ceiling_kwh: f64,
    /// Upper bound on any realizable storage charge or discharge power:
    /// full grid capacity (with upgrade) plus every installable charger
    /// running at rated power.
    pub storage_power_kw: f64,
}

impl BigM {
    /// Derive all constants from catalog data.
    pub fn derive(catalog: &Catalog) -> Self {
        let charger_power: f64 = catalog
            .charger_types
            .iter()
            .map(|l| f64::from(l.max_units) * l.max_power.value())
            .sum();

        Self {
            tour_count: catalog.tours.len() as f64,
            idle_energy_ceiling_kwh: catalog.max_battery().value(),
            storage_power_kw: catalog.grid.base_capacity.value()
                + catalog.grid.upgrade_increment.value()
                + charger_power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargeplan_core::{
        Catalog, ChargerType, ChargerTypeId, Economics, GridConnection, Kilometers, KilowattHours,
        Kilowatts, Powertrain, StorageParams, Tour, TourId, TruckType, TruckTypeId,
    };

    fn catalog() -> Catalog {
        Catalog {
            tours: vec![
                Tour {
                    id: TourId::new(1),
                    name: "a".into(),
                    distance: Kilometers(100.0),
                    toll_distance: Kilometers(0.0),
                    start: 10,
                    end: 20,
                },
                Tour {
                    id: TourId::new(2),
                    name: "b".into(),
                    distance: Kilometers(100.0),
                    toll_distance: Kilometers(0.0),
                    start: 30,
                    end: 40,
                },
            ],
            truck_slots: 2,
            truck_types: vec![TruckType {
                id: TruckTypeId::new(1),
                name: "e".into(),
                capital_eur: 1.0,
                operating_eur: 1.0,
                powertrain: Powertrain::Electric {
                    battery: KilowattHours(621.0),
                    consumption_kwh_per_km: 1.1,
                    max_charge_power: Kilowatts(400.0),
                    emissions_credit_eur: 0.0,
                },
            }],
            charger_types: vec![ChargerType {
                id: ChargerTypeId::new(1),
                name: "c".into(),
                capital_eur: 1.0,
                operating_eur: 1.0,
                max_power: Kilowatts(200.0),
                connection_points: 2,
                max_units: 3,
            }],
            max_total_charger_units: 3,
            grid: GridConnection {
                base_capacity: Kilowatts(500.0),
                upgrade_increment: Kilowatts(500.0),
                upgrade_cost_eur: 10_000.0,
            },
            storage: StorageParams::default(),
            economics: Economics::default(),
        }
    }

    #[test]
    fn test_derivations() {
        let bigm = BigM::derive(&catalog());
        assert_eq!(bigm.tour_count, 2.0);
        assert_eq!(bigm.idle_energy_ceiling_kwh, 621.0);
        // 500 base + 500 upgrade + 3 × 200 charger
        assert_eq!(bigm.storage_power_kw, 1600.0);
    }

    #[test]
    fn test_no_electric_types_pins_idle_energy_to_zero() {
        let mut catalog = catalog();
        catalog.truck_types = vec![TruckType {
            id: TruckTypeId::new(1),
            name: "d".into(),
            capital_eur: 1.0,
            operating_eur: 1.0,
            powertrain: Powertrain::Diesel {
                fuel_litres_per_km: 0.3,
                registration_tax_eur: 0.0,
            },
        }];
        let bigm = BigM::derive(&catalog);
        assert_eq!(bigm.idle_energy_ceiling_kwh, 0.0);
    }
}
