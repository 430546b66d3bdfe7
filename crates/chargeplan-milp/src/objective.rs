//! Objective assembly and cost accounting.
//!
//! One scalar, minimized: fixed truck cost + charger investment + grid
//! upgrade + storage + variable diesel cost + electricity - emissions-credit
//! revenue. Fixed truck cost and credit revenue run through the `used_type`
//! product so idle capacity slots are free; diesel and toll cost run through
//! `tour_type` so a tour is priced by the type of the truck that actually
//! runs it.
//!
//! [`cost_breakdown`] recomputes the components from solved values with the
//! same coefficient helpers the assembler uses, so reported numbers always
//! reconcile with the objective the solver saw.

use crate::model::{LinExpr, ModelBuilder, Sense};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, Economics, TimeGrid, Tour, TruckType};
use serde::{Deserialize, Serialize};

/// Annualized toll and fuel cost of running `tour` on a truck of type `ty`.
///
/// Electric types cost nothing here; their energy is priced at the grid
/// connection.
pub fn tour_variable_cost_eur(economics: &Economics, ty: &TruckType, tour: &Tour) -> f64 {
    use chargeplan_core::Powertrain;

    match ty.powertrain {
        Powertrain::Diesel {
            fuel_litres_per_km, ..
        } => {
            let toll = economics.toll_eur_per_km * tour.toll_distance.value();
            let fuel =
                economics.diesel_eur_per_litre * tour.distance.value() * fuel_litres_per_km;
            f64::from(economics.operating_days_per_year) * (toll + fuel)
        }
        Powertrain::Electric { .. } => 0.0,
    }
}

/// Annual cost of one installed charger unit of type `l`.
fn charger_unit_cost_eur(catalog: &Catalog, l: usize) -> f64 {
    let charger = &catalog.charger_types[l];
    charger.capital_eur + charger.operating_eur
}

/// Storage cost per kW of rating and per kWh of capacity, with the
/// proportional operating surcharge folded in.
fn storage_unit_costs_eur(catalog: &Catalog) -> (f64, f64) {
    let s = &catalog.storage;
    let factor = 1.0 + s.operating_cost_fraction;
    (
        factor * s.power_cost_eur_per_kw,
        factor * s.energy_cost_eur_per_kwh,
    )
}

/// Assemble the minimized objective onto `builder`.
pub fn add_objective(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    builder: &mut ModelBuilder,
) {
    let economics = &catalog.economics;
    let days = f64::from(economics.operating_days_per_year);
    let dt = grid.interval_hours();

    // the connection fee is due regardless of how the fleet turns out
    let mut objective = LinExpr::constant(economics.grid_fee_eur);

    for k in 0..vars.n_trucks() {
        for (t, ty) in catalog.truck_types.iter().enumerate() {
            objective.add_term(vars.used_type(k, t), ty.annual_fixed_cost_eur());
            objective.add_term(vars.used_type(k, t), -ty.emissions_credit_eur());
        }
    }

    for l in 0..vars.n_chargers() {
        objective.add_term(vars.charger_units(l), charger_unit_cost_eur(catalog, l));
    }

    objective.add_term(vars.grid_upgrade(), catalog.grid.upgrade_cost_eur);

    let (power_cost, energy_cost) = storage_unit_costs_eur(catalog);
    objective.add_term(vars.storage_power_kw(), power_cost);
    objective.add_term(vars.storage_capacity_kwh(), energy_cost);

    for (r, tour) in catalog.tours.iter().enumerate() {
        for k in 0..vars.n_trucks() {
            for (t, ty) in catalog.truck_types.iter().enumerate() {
                let cost = tour_variable_cost_eur(economics, ty, tour);
                if cost != 0.0 {
                    objective.add_term(vars.tour_type(r, k, t), cost);
                }
            }
        }
    }

    objective.add_term(vars.grid_peak_kw(), economics.peak_eur_per_kw);
    for z in grid.intervals() {
        objective.add_term(
            vars.grid_kw(z),
            days * economics.electricity_eur_per_kwh * dt,
        );
    }

    builder.set_objective(Sense::Minimize, objective);
}

/// Annualized cost components of a solved plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fixed_trucks_eur: f64,
    pub chargers_eur: f64,
    pub grid_upgrade_eur: f64,
    pub storage_eur: f64,
    pub diesel_eur: f64,
    pub electricity_eur: f64,
    pub emissions_credit_eur: f64,
}

impl CostBreakdown {
    /// Net annual cost: all components less the credit revenue.
    pub fn total_eur(&self) -> f64 {
        self.fixed_trucks_eur
            + self.chargers_eur
            + self.grid_upgrade_eur
            + self.storage_eur
            + self.diesel_eur
            + self.electricity_eur
            - self.emissions_credit_eur
    }
}

/// Recompute the cost components from a full variable assignment.
pub fn cost_breakdown(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    values: &[f64],
) -> CostBreakdown {
    let economics = &catalog.economics;
    let days = f64::from(economics.operating_days_per_year);
    let dt = grid.interval_hours();

    let mut fixed_trucks = 0.0;
    let mut credit = 0.0;
    for k in 0..vars.n_trucks() {
        for (t, ty) in catalog.truck_types.iter().enumerate() {
            let used = values[vars.used_type(k, t).index()];
            fixed_trucks += used * ty.annual_fixed_cost_eur();
            credit += used * ty.emissions_credit_eur();
        }
    }

    let mut chargers = 0.0;
    for l in 0..vars.n_chargers() {
        chargers += values[vars.charger_units(l).index()] * charger_unit_cost_eur(catalog, l);
    }

    let grid_upgrade =
        values[vars.grid_upgrade().index()] * catalog.grid.upgrade_cost_eur;

    let (power_cost, energy_cost) = storage_unit_costs_eur(catalog);
    let storage = values[vars.storage_power_kw().index()] * power_cost
        + values[vars.storage_capacity_kwh().index()] * energy_cost;

    let mut diesel = 0.0;
    for (r, tour) in catalog.tours.iter().enumerate() {
        for k in 0..vars.n_trucks() {
            for (t, ty) in catalog.truck_types.iter().enumerate() {
                diesel += values[vars.tour_type(r, k, t).index()]
                    * tour_variable_cost_eur(economics, ty, tour);
            }
        }
    }

    let mut energy_eur = 0.0;
    for z in grid.intervals() {
        energy_eur +=
            values[vars.grid_kw(z).index()] * days * economics.electricity_eur_per_kwh * dt;
    }
    let electricity = economics.grid_fee_eur
        + values[vars.grid_peak_kw().index()] * economics.peak_eur_per_kw
        + energy_eur;

    CostBreakdown {
        fixed_trucks_eur: fixed_trucks,
        chargers_eur: chargers,
        grid_upgrade_eur: grid_upgrade,
        storage_eur: storage,
        diesel_eur: diesel,
        electricity_eur: electricity,
        emissions_credit_eur: credit,
    }
}
