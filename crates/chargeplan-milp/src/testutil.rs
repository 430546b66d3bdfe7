//! Shared fixtures for unit tests.

use chargeplan_core::{
    Catalog, ChargerType, ChargerTypeId, Economics, GridConnection, Kilometers, KilowattHours,
    Kilowatts, Powertrain, StorageParams, TimeGrid, Tour, TourId, TruckType, TruckTypeId,
};

/// A 24-interval day (1 h each) with a 07..=18 day band and one grace
/// interval before day start.
pub fn day24_grid() -> TimeGrid {
    TimeGrid::new(24, 1.0, 7, 18, 1).unwrap()
}

/// Two overlapping day tours, two truck slots, one diesel and one electric
/// type, one charger type. Overlap lies in intervals 14..=15.
pub fn mixed_catalog() -> Catalog {
    Catalog {
        tours: vec![
            Tour {
                id: TourId::new(1),
                name: "am".into(),
                distance: Kilometers(120.0),
                toll_distance: Kilometers(30.0),
                start: 8,
                end: 16,
            },
            Tour {
                id: TourId::new(2),
                name: "pm".into(),
                distance: Kilometers(150.0),
                toll_distance: Kilometers(40.0),
                start: 14,
                end: 18,
            },
        ],
        truck_slots: 2,
        truck_types: vec![
            TruckType {
                id: TruckTypeId::new(1),
                name: "diesel40t".into(),
                capital_eur: 24_000.0,
                operating_eur: 6_000.0,
                powertrain: Powertrain::Diesel {
                    fuel_litres_per_km: 0.26,
                    registration_tax_eur: 556.0,
                },
            },
            TruckType {
                id: TruckTypeId::new(2),
                name: "etruck600".into(),
                capital_eur: 60_000.0,
                operating_eur: 6_000.0,
                powertrain: Powertrain::Electric {
                    battery: KilowattHours(600.0),
                    consumption_kwh_per_km: 1.1,
                    max_charge_power: Kilowatts(400.0),
                    emissions_credit_eur: 1000.0,
                },
            },
        ],
        charger_types: vec![ChargerType {
            id: ChargerTypeId::new(1),
            name: "dc150".into(),
            capital_eur: 10_000.0,
            operating_eur: 1_500.0,
            max_power: Kilowatts(150.0),
            connection_points: 2,
            max_units: 3,
        }],
        max_total_charger_units: 3,
        grid: GridConnection::default(),
        storage: StorageParams::default(),
        economics: Economics::default(),
    }
}
