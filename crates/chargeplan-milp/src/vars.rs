//! Declaration of the model's decision variable space.
//!
//! Every unknown of the formulation is declared here, in one deterministic
//! pass, indexed over tours `r`, truck slots `k`, truck types `t`, charger
//! types `l` and day intervals `z` (1-based). The product auxiliaries of the
//! linearization layer are declared last so their constraint triples sit next
//! to each other in the model.
//!
//! Truck slots are anonymous capacity: a slot that ends up with no tours
//! carries no fixed cost (see the objective assembler).

use crate::linearize::binary_product;
use crate::model::{ModelBuilder, VarId};
use chargeplan_core::{Catalog, Interval, TimeGrid};
use std::collections::HashMap;

/// Typed handles to every declared decision variable.
#[derive(Debug, Clone)]
pub struct FleetVars {
    n_trucks: usize,
    n_types: usize,
    n_tours: usize,
    n_chargers: usize,
    n_intervals: usize,

    type_assignment: Vec<Vec<VarId>>, // [k][t]
    tour_assignment: Vec<Vec<VarId>>, // [r][k]
    truck_used: Vec<VarId>,           // [k]
    depart: Vec<Vec<VarId>>,          // [k][z-1]
    arrive: Vec<Vec<VarId>>,          // [k][z-1]

    // night-interval linkage to the truck's next departure
    has_future: HashMap<(usize, Interval), VarId>, // (k, z) for night z
    next_tour: HashMap<(usize, usize, Interval), VarId>, // (r, k, z), tour starts after z

    plugged: Vec<Vec<Vec<VarId>>>,   // [k][l][z-1]
    drawing: Vec<Vec<Vec<VarId>>>,   // [k][l][z-1]
    charge_kw: Vec<Vec<Vec<VarId>>>, // [k][l][z-1]
    charger_units: Vec<VarId>,       // [l]

    energy: Vec<Vec<VarId>>, // [k][z-1]

    storage_power_kw: VarId,
    storage_capacity_kwh: VarId,
    storage_charge_kw: Vec<VarId>,    // [z-1]
    storage_discharge_kw: Vec<VarId>, // [z-1]
    storage_level_kwh: Vec<VarId>,    // [z-1]
    storage_charging: Vec<VarId>,     // [z-1]

    grid_kw: Vec<VarId>, // [z-1]
    grid_peak_kw: VarId,
    grid_upgrade: VarId,

    // exact product auxiliaries
    tour_type: Vec<Vec<Vec<VarId>>>, // [r][k][t]
    used_type: Vec<Vec<VarId>>,      // [k][t]
}

impl FleetVars {
    /// Declare the full variable space on `builder`.
    pub fn declare(catalog: &Catalog, grid: &TimeGrid, builder: &mut ModelBuilder) -> Self {
        let n_trucks = catalog.truck_slots;
        let n_types = catalog.truck_types.len();
        let n_tours = catalog.tours.len();
        let n_chargers = catalog.charger_types.len();
        let n_intervals = grid.len();

        let type_assignment: Vec<Vec<VarId>> = (0..n_trucks)
            .map(|k| {
                catalog
                    .truck_types
                    .iter()
                    .map(|ty| builder.add_binary(format!("type[k{},{}]", k + 1, ty.name)))
                    .collect()
            })
            .collect();

        let tour_assignment: Vec<Vec<VarId>> = catalog
            .tours
            .iter()
            .map(|tour| {
                (0..n_trucks)
                    .map(|k| builder.add_binary(format!("assign[{},k{}]", tour.name, k + 1)))
                    .collect()
            })
            .collect();

        let truck_used: Vec<VarId> = (0..n_trucks)
            .map(|k| builder.add_binary(format!("used[k{}]", k + 1)))
            .collect();

        let depart: Vec<Vec<VarId>> = (0..n_trucks)
            .map(|k| {
                grid.intervals()
                    .map(|z| builder.add_binary(format!("depart[k{},z{}]", k + 1, z)))
                    .collect()
            })
            .collect();

        let arrive: Vec<Vec<VarId>> = (0..n_trucks)
            .map(|k| {
                grid.intervals()
                    .map(|z| builder.add_binary(format!("arrive[k{},z{}]", k + 1, z)))
                    .collect()
            })
            .collect();

        let mut has_future = HashMap::new();
        let mut next_tour = HashMap::new();
        for k in 0..n_trucks {
            for z in grid.night_intervals() {
                has_future.insert(
                    (k, z),
                    builder.add_binary(format!("has_future[k{},z{}]", k + 1, z)),
                );
            }
        }
        for (r, tour) in catalog.tours.iter().enumerate() {
            for k in 0..n_trucks {
                for z in grid.night_intervals() {
                    // only tours that start strictly after z can be "next"
                    if tour.start > z {
                        next_tour.insert(
                            (r, k, z),
                            builder.add_binary(format!("next[{},k{},z{}]", tour.name, k + 1, z)),
                        );
                    }
                }
            }
        }

        let plugged = Self::per_truck_charger_interval(catalog, grid, |charger, k, z| {
            builder.add_binary(format!("plugged[k{},{},z{}]", k + 1, charger.name, z))
        });
        let drawing = Self::per_truck_charger_interval(catalog, grid, |charger, k, z| {
            builder.add_binary(format!("drawing[k{},{},z{}]", k + 1, charger.name, z))
        });
        let charge_kw = Self::per_truck_charger_interval(catalog, grid, |charger, k, z| {
            builder.add_continuous(
                format!("charge_kw[k{},{},z{}]", k + 1, charger.name, z),
                0.0,
                charger.max_power.value(),
            )
        });

        let charger_units: Vec<VarId> = catalog
            .charger_types
            .iter()
            .map(|l| {
                builder.add_integer(format!("units[{}]", l.name), 0.0, f64::from(l.max_units))
            })
            .collect();

        let energy: Vec<Vec<VarId>> = (0..n_trucks)
            .map(|k| {
                grid.intervals()
                    .map(|z| builder.add_nonneg(format!("energy[k{},z{}]", k + 1, z)))
                    .collect()
            })
            .collect();

        let storage_power_kw = builder.add_nonneg("storage_power_kw");
        let storage_capacity_kwh = builder.add_nonneg("storage_capacity_kwh");
        let storage_charge_kw: Vec<VarId> = grid
            .intervals()
            .map(|z| builder.add_nonneg(format!("storage_charge[z{}]", z)))
            .collect();
        let storage_discharge_kw: Vec<VarId> = grid
            .intervals()
            .map(|z| builder.add_nonneg(format!("storage_discharge[z{}]", z)))
            .collect();
        let storage_level_kwh: Vec<VarId> = grid
            .intervals()
            .map(|z| builder.add_nonneg(format!("storage_level[z{}]", z)))
            .collect();
        let storage_charging: Vec<VarId> = grid
            .intervals()
            .map(|z| builder.add_binary(format!("storage_charging[z{}]", z)))
            .collect();

        let grid_kw: Vec<VarId> = grid
            .intervals()
            .map(|z| builder.add_nonneg(format!("grid_kw[z{}]", z)))
            .collect();
        let grid_peak_kw = builder.add_nonneg("grid_peak_kw");
        let grid_upgrade = builder.add_binary("grid_upgrade");

        let tour_type: Vec<Vec<Vec<VarId>>> = catalog
            .tours
            .iter()
            .enumerate()
            .map(|(r, tour)| {
                (0..n_trucks)
                    .map(|k| {
                        catalog
                            .truck_types
                            .iter()
                            .enumerate()
                            .map(|(t, ty)| {
                                binary_product(
                                    builder,
                                    &format!("tour_type[{},k{},{}]", tour.name, k + 1, ty.name),
                                    tour_assignment[r][k],
                                    type_assignment[k][t],
                                )
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let used_type: Vec<Vec<VarId>> = (0..n_trucks)
            .map(|k| {
                catalog
                    .truck_types
                    .iter()
                    .enumerate()
                    .map(|(t, ty)| {
                        binary_product(
                            builder,
                            &format!("used_type[k{},{}]", k + 1, ty.name),
                            truck_used[k],
                            type_assignment[k][t],
                        )
                    })
                    .collect()
            })
            .collect();

        Self {
            n_trucks,
            n_types,
            n_tours,
            n_chargers,
            n_intervals,
            type_assignment,
            tour_assignment,
            truck_used,
            depart,
            arrive,
            has_future,
            next_tour,
            plugged,
            drawing,
            charge_kw,
            charger_units,
            energy,
            storage_power_kw,
            storage_capacity_kwh,
            storage_charge_kw,
            storage_discharge_kw,
            storage_level_kwh,
            storage_charging,
            grid_kw,
            grid_peak_kw,
            grid_upgrade,
            tour_type,
            used_type,
        }
    }

    fn per_truck_charger_interval<F>(
        catalog: &Catalog,
        grid: &TimeGrid,
        mut declare: F,
    ) -> Vec<Vec<Vec<VarId>>>
    where
        F: FnMut(&chargeplan_core::ChargerType, usize, Interval) -> VarId,
    {
        (0..catalog.truck_slots)
            .map(|k| {
                catalog
                    .charger_types
                    .iter()
                    .map(|charger| {
                        grid.intervals()
                            .map(|z| declare(charger, k, z))
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    pub fn n_trucks(&self) -> usize {
        self.n_trucks
    }

    pub fn n_types(&self) -> usize {
        self.n_types
    }

    pub fn n_tours(&self) -> usize {
        self.n_tours
    }

    pub fn n_chargers(&self) -> usize {
        self.n_chargers
    }

    pub fn n_intervals(&self) -> usize {
        self.n_intervals
    }

    /// Truck `k` is of type `t`.
    pub fn type_assignment(&self, k: usize, t: usize) -> VarId {
        self.type_assignment[k][t]
    }

    /// Tour `r` is run by truck `k`.
    pub fn tour_assignment(&self, r: usize, k: usize) -> VarId {
        self.tour_assignment[r][k]
    }

    /// Truck `k` runs at least one tour.
    pub fn truck_used(&self, k: usize) -> VarId {
        self.truck_used[k]
    }

    /// Truck `k` departs on a tour in interval `z`.
    pub fn depart(&self, k: usize, z: Interval) -> VarId {
        self.depart[k][z - 1]
    }

    /// Truck `k` arrives from a tour in interval `z`.
    pub fn arrive(&self, k: usize, z: Interval) -> VarId {
        self.arrive[k][z - 1]
    }

    /// Truck `k` still has a departure after night interval `z`, if declared.
    pub fn has_future(&self, k: usize, z: Interval) -> Option<VarId> {
        self.has_future.get(&(k, z)).copied()
    }

    /// Tour `r` is truck `k`'s next departure after night interval `z`, if
    /// declared (only for tours starting strictly after `z`).
    pub fn next_tour(&self, r: usize, k: usize, z: Interval) -> Option<VarId> {
        self.next_tour.get(&(r, k, z)).copied()
    }

    /// Truck `k` is physically connected to a unit of charger type `l`.
    pub fn plugged(&self, k: usize, l: usize, z: Interval) -> VarId {
        self.plugged[k][l][z - 1]
    }

    /// Truck `k` is actively drawing current at charger type `l`.
    pub fn drawing(&self, k: usize, l: usize, z: Interval) -> VarId {
        self.drawing[k][l][z - 1]
    }

    /// Power delivered to truck `k` at charger type `l` in interval `z`.
    pub fn charge_kw(&self, k: usize, l: usize, z: Interval) -> VarId {
        self.charge_kw[k][l][z - 1]
    }

    /// Installed units of charger type `l`.
    pub fn charger_units(&self, l: usize) -> VarId {
        self.charger_units[l]
    }

    /// Truck `k`'s onboard energy at the start of interval `z`.
    pub fn energy(&self, k: usize, z: Interval) -> VarId {
        self.energy[k][z - 1]
    }

    pub fn storage_power_kw(&self) -> VarId {
        self.storage_power_kw
    }

    pub fn storage_capacity_kwh(&self) -> VarId {
        self.storage_capacity_kwh
    }

    pub fn storage_charge_kw(&self, z: Interval) -> VarId {
        self.storage_charge_kw[z - 1]
    }

    pub fn storage_discharge_kw(&self, z: Interval) -> VarId {
        self.storage_discharge_kw[z - 1]
    }

    pub fn storage_level_kwh(&self, z: Interval) -> VarId {
        self.storage_level_kwh[z - 1]
    }

    /// Storage mode flag: 1 while charging, 0 while discharging.
    pub fn storage_charging(&self, z: Interval) -> VarId {
        self.storage_charging[z - 1]
    }

    /// Total power drawn from the grid connection in interval `z`.
    pub fn grid_kw(&self, z: Interval) -> VarId {
        self.grid_kw[z - 1]
    }

    pub fn grid_peak_kw(&self) -> VarId {
        self.grid_peak_kw
    }

    pub fn grid_upgrade(&self) -> VarId {
        self.grid_upgrade
    }

    /// Product auxiliary: tour `r` runs on truck `k` of type `t`.
    pub fn tour_type(&self, r: usize, k: usize, t: usize) -> VarId {
        self.tour_type[r][k][t]
    }

    /// Product auxiliary: truck `k` is in service and of type `t`.
    pub fn used_type(&self, k: usize, t: usize) -> VarId {
        self.used_type[k][t]
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
                    name: "am".into(),
                    distance: Kilometers(120.0),
                    toll_distance: Kilometers(30.0),
                    start: 8,
                    end: 12,
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
            truck_types: vec![TruckType {
                id: TruckTypeId::new(1),
                name: "ev".into(),
                capital_eur: 1.0,
                operating_eur: 1.0,
                powertrain: Powertrain::Electric {
                    battery: KilowattHours(500.0),
                    consumption_kwh_per_km: 1.0,
                    max_charge_power: Kilowatts(150.0),
                    emissions_credit_eur: 0.0,
                },
            }],
            charger_types: vec![ChargerType {
                id: ChargerTypeId::new(1),
                name: "dc".into(),
                capital_eur: 1.0,
                operating_eur: 1.0,
                max_power: Kilowatts(150.0),
                connection_points: 2,
                max_units: 1,
            }],
            max_total_charger_units: 1,
            grid: GridConnection::default(),
            storage: StorageParams::default(),
            economics: Economics::default(),
        }
    }

    fn grid() -> TimeGrid {
        TimeGrid::new(24, 1.0, 7, 18, 1).unwrap()
    }

    #[test]
    fn test_declared_counts() {
        let catalog = catalog();
        let grid = grid();
        let mut builder = crate::model::ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);

        assert_eq!(vars.n_trucks(), 2);
        assert_eq!(vars.n_tours(), 2);
        assert_eq!(vars.n_intervals(), 24);

        // night = 12 intervals, has_future per truck per night interval
        let nights = grid.night_intervals().count();
        assert_eq!(nights, 12);
        assert_eq!(vars.has_future.len(), 2 * nights);

        // next_tour only where the tour starts after z: both tours start in
        // the day band, so they are candidates after every early-night
        // interval (1..=6) and after none of the late ones (19..=24)
        assert_eq!(vars.next_tour.len(), 2 * 2 * 6);
        assert!(vars.next_tour(0, 0, 1).is_some());
        assert!(vars.next_tour(0, 0, 19).is_none());
    }

    #[test]
    fn test_charge_power_bounded_by_charger_rating() {
        let catalog = catalog();
        let grid = grid();
        let mut builder = crate::model::ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);
        let model = builder.build().unwrap();

        let def = model.var(vars.charge_kw(0, 0, 5));
        assert_eq!(def.lower, 0.0);
        assert_eq!(def.upper, 150.0);
        assert!(def.name.contains("charge_kw"));
    }

    #[test]
    fn test_interval_indexing_is_one_based() {
        let catalog = catalog();
        let grid = grid();
        let mut builder = crate::model::ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);
        let model = builder.build().unwrap();

        assert!(model.var(vars.energy(1, 1)).name.ends_with("z1]"));
        assert!(model.var(vars.energy(1, 24)).name.ends_with("z24]"));
    }
}
