//! Read-only projections of a solved plan.
//!
//! Everything here is derived from the immutable value assignment the solver
//! returned; deriving the same statistic twice yields bit-identical numbers.
//! [`FleetSolution::verify`] re-audits the values against the structural
//! invariants of the formulation; a failure there means the model itself is
//! defective (wrong big-M, wrong constraint direction), not the solver.

use crate::model::MilpModel;
use crate::objective::{cost_breakdown, CostBreakdown};
use crate::solver::{RawSolution, SolveStatus, FEASIBILITY_TOL};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, PlanError, PlanResult, TimeGrid};

/// Threshold above which a relaxed binary counts as set.
const BINARY_ON: f64 = 0.5;

/// Tolerance for the product-auxiliary exactness audit.
const PRODUCT_TOL: f64 = 1e-4;

/// One tour in a truck's daily itinerary.
#[derive(Debug, Clone)]
pub struct TourStop {
    pub tour_index: usize,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub distance_km: f64,
}

/// One truck slot's share of the plan.
#[derive(Debug, Clone)]
pub struct TruckPlan {
    /// Slot index (0-based; displayed as k1, k2, ...)
    pub slot: usize,
    pub type_index: usize,
    pub type_name: String,
    /// Whether the slot runs at least one tour.
    pub used: bool,
    /// Assigned tours, ordered by departure.
    pub tours: Vec<TourStop>,
}

/// Immutable projections of a solved fleet plan.
#[derive(Debug, Clone)]
pub struct FleetSolution {
    status: SolveStatus,
    objective_eur: f64,
    values: Vec<f64>,
    trucks: Vec<TruckPlan>,
    charger_units: Vec<u32>,
    grid_upgrade: bool,
    grid_peak_kw: f64,
    daily_grid_energy_kwh: f64,
    storage_power_kw: f64,
    storage_capacity_kwh: f64,
    /// Onboard energy per truck and interval, `[k][z-1]`.
    energy_trajectories: Vec<Vec<f64>>,
    /// Plugged-connection count per charger type and interval, `[l][z-1]`.
    plugged_counts: Vec<Vec<u32>>,
    breakdown: CostBreakdown,
}

impl FleetSolution {
    /// Project the raw variable assignment into typed results.
    pub fn from_raw(
        catalog: &Catalog,
        grid: &TimeGrid,
        vars: &FleetVars,
        status: SolveStatus,
        raw: RawSolution,
    ) -> Self {
        let values = raw.values;

        let trucks = (0..vars.n_trucks())
            .map(|k| {
                let type_index = (0..vars.n_types())
                    .max_by(|&a, &b| {
                        let va = values[vars.type_assignment(k, a).index()];
                        let vb = values[vars.type_assignment(k, b).index()];
                        va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .unwrap_or(0);
                let mut tours: Vec<TourStop> = catalog
                    .tours
                    .iter()
                    .enumerate()
                    .filter(|(r, _)| values[vars.tour_assignment(*r, k).index()] > BINARY_ON)
                    .map(|(r, tour)| TourStop {
                        tour_index: r,
                        name: tour.name.clone(),
                        start: tour.start,
                        end: tour.end,
                        distance_km: tour.distance.value(),
                    })
                    .collect();
                tours.sort_by_key(|stop| stop.start);
                TruckPlan {
                    slot: k,
                    type_index,
                    type_name: catalog.truck_types[type_index].name.clone(),
                    used: values[vars.truck_used(k).index()] > BINARY_ON,
                    tours,
                }
            })
            .collect();

        let charger_units = (0..vars.n_chargers())
            .map(|l| values[vars.charger_units(l).index()].round() as u32)
            .collect();

        let daily_grid_energy_kwh = grid
            .intervals()
            .map(|z| values[vars.grid_kw(z).index()] * grid.interval_hours())
            .sum();

        let energy_trajectories = (0..vars.n_trucks())
            .map(|k| {
                grid.intervals()
                    .map(|z| values[vars.energy(k, z).index()])
                    .collect()
            })
            .collect();

        let plugged_counts = (0..vars.n_chargers())
            .map(|l| {
                grid.intervals()
                    .map(|z| {
                        (0..vars.n_trucks())
                            .filter(|&k| values[vars.plugged(k, l, z).index()] > BINARY_ON)
                            .count() as u32
                    })
                    .collect()
            })
            .collect();

        let breakdown = cost_breakdown(catalog, grid, vars, &values);

        Self {
            status,
            objective_eur: raw.objective,
            trucks,
            charger_units,
            grid_upgrade: values[vars.grid_upgrade().index()] > BINARY_ON,
            grid_peak_kw: values[vars.grid_peak_kw().index()],
            daily_grid_energy_kwh,
            storage_power_kw: values[vars.storage_power_kw().index()],
            storage_capacity_kwh: values[vars.storage_capacity_kwh().index()],
            energy_trajectories,
            plugged_counts,
            breakdown,
            values,
        }
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Net annual cost of the plan.
    pub fn objective_eur(&self) -> f64 {
        self.objective_eur
    }

    pub fn breakdown(&self) -> &CostBreakdown {
        &self.breakdown
    }

    pub fn trucks(&self) -> &[TruckPlan] {
        &self.trucks
    }

    /// Trucks that actually run tours.
    pub fn used_trucks(&self) -> impl Iterator<Item = &TruckPlan> {
        self.trucks.iter().filter(|t| t.used)
    }

    /// In-service vehicle count per type name, ordered by type index.
    pub fn fleet_composition(&self, catalog: &Catalog) -> Vec<(String, usize)> {
        catalog
            .truck_types
            .iter()
            .enumerate()
            .map(|(t, ty)| {
                let count = self
                    .used_trucks()
                    .filter(|truck| truck.type_index == t)
                    .count();
                (ty.name.clone(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Installed units per charger type, in catalog order.
    pub fn charger_units(&self) -> &[u32] {
        &self.charger_units
    }

    pub fn grid_upgrade(&self) -> bool {
        self.grid_upgrade
    }

    pub fn grid_peak_kw(&self) -> f64 {
        self.grid_peak_kw
    }

    pub fn daily_grid_energy_kwh(&self) -> f64 {
        self.daily_grid_energy_kwh
    }

    pub fn storage_power_kw(&self) -> f64 {
        self.storage_power_kw
    }

    pub fn storage_capacity_kwh(&self) -> f64 {
        self.storage_capacity_kwh
    }

    /// Onboard energy of truck `k` at the start of every interval.
    pub fn energy_trajectory(&self, k: usize) -> &[f64] {
        &self.energy_trajectories[k]
    }

    /// Number of trucks plugged into charger type `l` in interval `z`.
    pub fn plugged_count(&self, l: usize, z: usize) -> u32 {
        self.plugged_counts[l][z - 1]
    }

    /// The raw assignment, one value per declared variable.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Audit the solved values against the formulation's invariants.
    ///
    /// An error here is an internal modeling defect, not bad input: the
    /// solver accepted the model, so its values must satisfy every row,
    /// every product auxiliary must equal the product of its factors, and
    /// the daily cycles must close.
    pub fn verify(
        &self,
        model: &MilpModel,
        catalog: &Catalog,
        grid: &TimeGrid,
        vars: &FleetVars,
    ) -> PlanResult<()> {
        let values = &self.values;

        // product auxiliaries reproduce their factors exactly; a mismatch
        // is diagnosed before anything else because it points straight at
        // the linearization
        for r in 0..vars.n_tours() {
            for k in 0..vars.n_trucks() {
                for t in 0..vars.n_types() {
                    let x = values[vars.tour_assignment(r, k).index()];
                    let y = values[vars.type_assignment(k, t).index()];
                    let w = values[vars.tour_type(r, k, t).index()];
                    if (w - x * y).abs() > PRODUCT_TOL {
                        return Err(PlanError::Invariant(format!(
                            "tour_type[{r},{k},{t}] = {w} but factors give {}",
                            x * y
                        )));
                    }
                }
            }
        }
        for k in 0..vars.n_trucks() {
            for t in 0..vars.n_types() {
                let x = values[vars.truck_used(k).index()];
                let y = values[vars.type_assignment(k, t).index()];
                let w = values[vars.used_type(k, t).index()];
                if (w - x * y).abs() > PRODUCT_TOL {
                    return Err(PlanError::Invariant(format!(
                        "used_type[{k},{t}] = {w} but factors give {}",
                        x * y
                    )));
                }
            }
        }

        if let Some(row) = model.first_violation(values, FEASIBILITY_TOL) {
            return Err(PlanError::Invariant(format!(
                "solved values violate `{}`",
                row
            )));
        }

        // exactly one truck per tour, exactly one type per truck
        for r in 0..vars.n_tours() {
            let total: f64 = (0..vars.n_trucks())
                .map(|k| values[vars.tour_assignment(r, k).index()])
                .sum();
            if (total - 1.0).abs() > PRODUCT_TOL {
                return Err(PlanError::Invariant(format!(
                    "tour {r} is covered {total} times"
                )));
            }
        }
        for k in 0..vars.n_trucks() {
            let total: f64 = (0..vars.n_types())
                .map(|t| values[vars.type_assignment(k, t).index()])
                .sum();
            if (total - 1.0).abs() > PRODUCT_TOL {
                return Err(PlanError::Invariant(format!(
                    "truck {k} occupies {total} types"
                )));
            }
        }

        // no double-booking: driving, arrivals and connections
        for k in 0..vars.n_trucks() {
            for z in grid.intervals() {
                let driving = catalog
                    .tours
                    .iter()
                    .enumerate()
                    .filter(|(_, tour)| grid.active_during(tour, z))
                    .map(|(r, _)| values[vars.tour_assignment(r, k).index()])
                    .sum::<f64>();
                let plugged = (0..vars.n_chargers())
                    .map(|l| values[vars.plugged(k, l, z).index()])
                    .sum::<f64>();
                if driving > 1.0 + PRODUCT_TOL {
                    return Err(PlanError::Invariant(format!(
                        "truck {k} runs {driving} tours in interval {z}"
                    )));
                }
                if plugged > 1.0 + PRODUCT_TOL {
                    return Err(PlanError::Invariant(format!(
                        "truck {k} holds {plugged} connections in interval {z}"
                    )));
                }
                if driving + plugged > 1.0 + PRODUCT_TOL {
                    return Err(PlanError::Invariant(format!(
                        "truck {k} is both driving and plugged in interval {z}"
                    )));
                }
            }
        }

        // energy stays within the assigned battery and closes cyclically
        for truck in &self.trucks {
            let trajectory = self.energy_trajectory(truck.slot);
            let battery = catalog.truck_types[truck.type_index].battery();
            for (zi, &level) in trajectory.iter().enumerate() {
                if level < -FEASIBILITY_TOL {
                    return Err(PlanError::Invariant(format!(
                        "truck {} energy is negative in interval {}",
                        truck.slot,
                        zi + 1
                    )));
                }
                if let Some(capacity) = battery {
                    if level > capacity.value() + FEASIBILITY_TOL {
                        return Err(PlanError::Invariant(format!(
                            "truck {} energy {level} exceeds its {} battery",
                            truck.slot, capacity
                        )));
                    }
                }
            }
            let first = trajectory[0];
            let last = trajectory[trajectory.len() - 1];
            if (first - last).abs() > FEASIBILITY_TOL {
                return Err(PlanError::Invariant(format!(
                    "truck {} does not close its daily energy cycle ({first} vs {last})",
                    truck.slot
                )));
            }
        }
        let storage_first = values[vars.storage_level_kwh(grid.first()).index()];
        let storage_last = values[vars.storage_level_kwh(grid.last()).index()];
        if (storage_first - storage_last).abs() > FEASIBILITY_TOL {
            return Err(PlanError::Invariant(
                "storage does not close its daily cycle".into(),
            ));
        }

        // shared-resource caps
        for (l, charger) in catalog.charger_types.iter().enumerate() {
            let units = f64::from(self.charger_units[l]);
            for z in grid.intervals() {
                let connections = f64::from(self.plugged_count(l, z));
                if connections > units * f64::from(charger.connection_points) + PRODUCT_TOL {
                    return Err(PlanError::Invariant(format!(
                        "charger `{}` carries {connections} connections in interval {z}",
                        charger.name
                    )));
                }
                let power: f64 = (0..vars.n_trucks())
                    .map(|k| values[vars.charge_kw(k, l, z).index()])
                    .sum();
                if power > units * charger.max_power.value() + FEASIBILITY_TOL {
                    return Err(PlanError::Invariant(format!(
                        "charger `{}` delivers {power} kW in interval {z}",
                        charger.name
                    )));
                }
            }
        }
        let cap = catalog.grid.base_capacity.value()
            + if self.grid_upgrade {
                catalog.grid.upgrade_increment.value()
            } else {
                0.0
            };
        for z in grid.intervals() {
            let draw = values[vars.grid_kw(z).index()];
            if draw > cap + FEASIBILITY_TOL {
                return Err(PlanError::Invariant(format!(
                    "grid draw {draw} kW exceeds the {cap} kW cap in interval {z}"
                )));
            }
            if draw > self.grid_peak_kw + FEASIBILITY_TOL {
                return Err(PlanError::Invariant(format!(
                    "grid draw {draw} kW exceeds the reported peak in interval {z}"
                )));
            }
        }

        Ok(())
    }

    /// Format a human-readable summary.
    pub fn summary(&self, catalog: &Catalog) -> String {
        let mut s = String::new();
        s.push_str(&format!("Fleet Plan Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Annual cost: EUR {:.2}\n", self.objective_eur));
        let b = &self.breakdown;
        s.push_str(&format!("  Trucks:       EUR {:.2}\n", b.fixed_trucks_eur));
        s.push_str(&format!("  Chargers:     EUR {:.2}\n", b.chargers_eur));
        s.push_str(&format!("  Grid upgrade: EUR {:.2}\n", b.grid_upgrade_eur));
        s.push_str(&format!("  Storage:      EUR {:.2}\n", b.storage_eur));
        s.push_str(&format!("  Diesel:       EUR {:.2}\n", b.diesel_eur));
        s.push_str(&format!("  Electricity:  EUR {:.2}\n", b.electricity_eur));
        s.push_str(&format!(
            "  Credits:     -EUR {:.2}\n",
            b.emissions_credit_eur
        ));

        s.push_str("\nFleet composition:\n");
        for (name, count) in self.fleet_composition(catalog) {
            s.push_str(&format!("  {count} x {name}\n"));
        }

        s.push_str("\nTour assignment:\n");
        for truck in self.used_trucks() {
            s.push_str(&format!("  k{} ({}):\n", truck.slot + 1, truck.type_name));
            for stop in &truck.tours {
                s.push_str(&format!(
                    "    {} (z{}..z{}, {:.0} km)\n",
                    stop.name, stop.start, stop.end, stop.distance_km
                ));
            }
        }

        s.push_str("\nInfrastructure:\n");
        for (l, units) in self.charger_units.iter().enumerate() {
            if *units > 0 {
                s.push_str(&format!(
                    "  {} x {}\n",
                    units, catalog.charger_types[l].name
                ));
            }
        }
        s.push_str(&format!(
            "  Grid upgrade: {}\n",
            if self.grid_upgrade { "yes" } else { "no" }
        ));
        s.push_str(&format!("  Peak draw: {:.2} kW\n", self.grid_peak_kw));
        s.push_str(&format!(
            "  Grid energy: {:.1} kWh/day\n",
            self.daily_grid_energy_kwh
        ));
        s.push_str(&format!(
            "  Storage: {:.1} kW / {:.1} kWh\n",
            self.storage_power_kw, self.storage_capacity_kwh
        ));

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_fleet_model;
    use crate::testutil::{day24_grid, mixed_catalog};

    fn synthetic_solution() -> (FleetSolution, crate::build::FleetModel, Catalog, TimeGrid) {
        let catalog = mixed_catalog();
        let grid = day24_grid();
        let model = build_fleet_model(&catalog, &grid).unwrap();

        let mut values = vec![0.0; model.milp().num_vars()];
        let vars = model.vars();
        // truck 1 diesel with both tours; truck 2 idle diesel
        values[vars.type_assignment(0, 0).index()] = 1.0;
        values[vars.type_assignment(1, 0).index()] = 1.0;
        values[vars.tour_assignment(0, 0).index()] = 1.0;
        values[vars.tour_assignment(1, 0).index()] = 1.0;
        values[vars.truck_used(0).index()] = 1.0;
        values[vars.used_type(0, 0).index()] = 1.0;
        values[vars.tour_type(0, 0, 0).index()] = 1.0;
        values[vars.tour_type(1, 0, 0).index()] = 1.0;
        values[vars.grid_peak_kw().index()] = 0.0;

        let objective = model.milp().objective().eval(&values);
        let raw = RawSolution { objective, values };
        let solution =
            FleetSolution::from_raw(&catalog, &grid, model.vars(), SolveStatus::Optimal, raw);
        (solution, model, catalog, grid)
    }

    #[test]
    fn test_projections() {
        let (solution, _, catalog, _) = synthetic_solution();

        assert_eq!(solution.used_trucks().count(), 1);
        let truck = &solution.trucks()[0];
        assert!(truck.used);
        assert_eq!(truck.type_name, "diesel40t");
        assert_eq!(truck.tours.len(), 2);
        // itinerary ordered by departure
        assert_eq!(truck.tours[0].name, "am");
        assert_eq!(truck.tours[1].name, "pm");

        assert_eq!(
            solution.fleet_composition(&catalog),
            vec![("diesel40t".to_string(), 1)]
        );
        assert_eq!(solution.charger_units(), &[0]);
        assert!(!solution.grid_upgrade());
    }

    #[test]
    fn test_summary_is_idempotent() {
        let (solution, _, catalog, _) = synthetic_solution();
        let first = solution.summary(&catalog);
        let second = solution.summary(&catalog);
        assert_eq!(first, second);
        assert!(first.contains("diesel40t"));
        assert!(first.contains("Status: optimal"));
    }

    #[test]
    fn test_verify_audits_every_row() {
        let (solution, model, catalog, grid) = synthetic_solution();

        // the hand-built assignment leaves the depart/arrive indicators at
        // zero while tours are assigned, which violates their definition
        // rows; verification must notice
        let err = solution
            .verify(model.milp(), &catalog, &grid, model.vars())
            .unwrap_err();
        assert!(matches!(err, PlanError::Invariant(_)));
    }

    #[test]
    fn test_verify_checks_linearization() {
        let (mut solution, model, catalog, grid) = synthetic_solution();
        // corrupt a product auxiliary
        let vars = model.vars();
        let idx = vars.used_type(0, 0).index();
        solution.values[idx] = 0.0;

        let err = solution
            .verify(model.milp(), &catalog, &grid, vars)
            .unwrap_err();
        assert!(matches!(err, PlanError::Invariant(_)));
        assert!(err.to_string().contains("used_type"));
    }
}
