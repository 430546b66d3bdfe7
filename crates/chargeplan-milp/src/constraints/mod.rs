//! Constraint generation, grouped by concern.
//!
//! Each family is a function that walks its index tuples once and emits
//! named rows on the builder. Families are predicate-gated rather than
//! branch-riddled: a relation that would be vacuous for a tuple (no
//! successor interval, no candidate tours, fewer than two terms in a
//! mutual-exclusion sum) is skipped by its guard, never emitted as a
//! trivial or contradictory row.
//!
//! The families are independent of each other; generation order only
//! affects row ordering in the final model.

mod assignment;
mod charging;
mod energy;
mod future;
mod site;

pub use assignment::add_assignment_constraints;
pub use charging::add_charging_constraints;
pub use energy::add_energy_constraints;
pub use future::add_future_tour_constraints;
pub use site::add_site_constraints;

use crate::bigm::BigM;
use crate::model::ModelBuilder;
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, TimeGrid};

/// Generate every constraint family of the formulation.
pub fn add_all_constraints(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    bigm: &BigM,
    builder: &mut ModelBuilder,
) {
    add_assignment_constraints(catalog, grid, vars, bigm, builder);
    add_future_tour_constraints(catalog, grid, vars, builder);
    add_energy_constraints(catalog, grid, vars, bigm, builder);
    add_charging_constraints(catalog, grid, vars, builder);
    add_site_constraints(catalog, grid, vars, bigm, builder);
}
