//! Truck state-of-charge dynamics.
//!
//! A tour's energy use is spread uniformly across its active intervals, so
//! the consumption of truck `k` in interval `z` is
//! `Σ_t Σ_r tour_type[r,k,t] · active(r,z) · distance_r · rate_t / duration_r`
//! over the electric types (combustion types draw nothing). The dynamics run
//! from each interval to its successor; the last interval has none, and the
//! day instead closes with an explicit cyclic equality.

use crate::bigm::BigM;
use crate::model::{LinExpr, ModelBuilder};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, Interval, TimeGrid};

/// Energy drawn by truck `k` in interval `z`, as a linear expression over
/// the tour-type product auxiliaries.
fn consumption_expr(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    k: usize,
    z: Interval,
) -> LinExpr {
    let mut expr = LinExpr::new();
    for t in catalog.electric_type_indices() {
        let rate = catalog.truck_types[t].consumption_kwh_per_km();
        for (r, tour) in catalog.tours.iter().enumerate() {
            if grid.active_during(tour, z) {
                let per_interval = tour.distance.value() * rate / tour.duration_intervals() as f64;
                expr.add_term(vars.tour_type(r, k, t), per_interval);
            }
        }
    }
    expr
}

/// Emit the state-of-charge families: interval-to-interval dynamics, the
/// type-dependent capacity ceiling, and the daily cyclic closure.
pub fn add_energy_constraints(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    bigm: &BigM,
    builder: &mut ModelBuilder,
) {
    let dt = grid.interval_hours();

    for k in 0..vars.n_trucks() {
        for z in grid.intervals() {
            if let Some(next) = grid.successor(z) {
                let mut dyn_expr =
                    LinExpr::from(vars.energy(k, next)) - vars.energy(k, z);
                dyn_expr += consumption_expr(catalog, grid, vars, k, z);
                for l in 0..vars.n_chargers() {
                    dyn_expr.add_term(vars.charge_kw(k, l, z), -dt);
                }
                builder.eq(format!("energy_dyn[k{},z{}]", k + 1, z), dyn_expr, 0.0);
            }

            // level never exceeds the assigned type's battery; non-electric
            // types get the derived idle ceiling instead
            let mut cap = LinExpr::from(vars.energy(k, z));
            for (t, ty) in catalog.truck_types.iter().enumerate() {
                let ceiling = ty
                    .battery()
                    .map(|b| b.value())
                    .unwrap_or(bigm.idle_energy_ceiling_kwh);
                cap.add_term(vars.type_assignment(k, t), -ceiling);
            }
            builder.le(format!("energy_cap[k{},z{}]", k + 1, z), cap, 0.0);
        }

        builder.eq(
            format!("energy_cycle[k{}]", k + 1),
            LinExpr::from(vars.energy(k, grid.first())) - vars.energy(k, grid.last()),
            0.0,
        );
    }
}
