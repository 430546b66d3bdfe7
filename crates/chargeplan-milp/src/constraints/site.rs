//! Grid connection and stationary storage.
//!
//! The grid connection and the storage unit are shared by the whole fleet;
//! they couple every truck and interval through the balance equation. The
//! daily peak is not defined by an explicit maximum: `grid_kw[z] <= peak`
//! plus the demand charge in the objective presses the peak variable down
//! onto the true maximum.

use crate::bigm::BigM;
use crate::model::{LinExpr, ModelBuilder};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, TimeGrid};

/// Emit the grid-balance, grid-capacity, peak, and storage families.
pub fn add_site_constraints(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    bigm: &BigM,
    builder: &mut ModelBuilder,
) {
    let dt = grid.interval_hours();
    let storage = &catalog.storage;

    for z in grid.intervals() {
        // grid draw covers all charging plus storage charging, less
        // whatever the storage discharges back into the chargers
        let mut balance = LinExpr::from(vars.grid_kw(z));
        for k in 0..vars.n_trucks() {
            for l in 0..vars.n_chargers() {
                balance.add_term(vars.charge_kw(k, l, z), -1.0);
            }
        }
        balance.add_term(vars.storage_charge_kw(z), -1.0);
        balance.add_term(vars.storage_discharge_kw(z), 1.0);
        builder.eq(format!("grid_balance[z{}]", z), balance, 0.0);

        builder.le(
            format!("grid_cap[z{}]", z),
            LinExpr::from(vars.grid_kw(z))
                - LinExpr::term(
                    vars.grid_upgrade(),
                    catalog.grid.upgrade_increment.value(),
                ),
            catalog.grid.base_capacity.value(),
        );

        builder.le(
            format!("grid_peak[z{}]", z),
            LinExpr::from(vars.grid_kw(z)) - vars.grid_peak_kw(),
            0.0,
        );

        if let Some(next) = grid.successor(z) {
            // round-trip losses are booked on the discharge side
            let mut dyn_expr =
                LinExpr::from(vars.storage_level_kwh(next)) - vars.storage_level_kwh(z);
            dyn_expr.add_term(vars.storage_charge_kw(z), -dt);
            dyn_expr.add_term(
                vars.storage_discharge_kw(z),
                dt / storage.round_trip_efficiency,
            );
            builder.eq(format!("storage_dyn[z{}]", z), dyn_expr, 0.0);
        }

        builder.le(
            format!("storage_cap[z{}]", z),
            LinExpr::from(vars.storage_level_kwh(z)) - vars.storage_capacity_kwh(),
            0.0,
        );
        builder.ge(
            format!("storage_floor[z{}]", z),
            LinExpr::from(vars.storage_level_kwh(z))
                - LinExpr::term(vars.storage_capacity_kwh(), storage.reserve_fraction),
            0.0,
        );

        builder.le(
            format!("storage_charge_rate[z{}]", z),
            LinExpr::from(vars.storage_charge_kw(z)) - vars.storage_power_kw(),
            0.0,
        );
        builder.le(
            format!("storage_discharge_rate[z{}]", z),
            LinExpr::from(vars.storage_discharge_kw(z)) - vars.storage_power_kw(),
            0.0,
        );

        // the mode binary forbids charging and discharging at once
        builder.le(
            format!("storage_charge_mode[z{}]", z),
            LinExpr::from(vars.storage_charge_kw(z))
                - LinExpr::term(vars.storage_charging(z), bigm.storage_power_kw),
            0.0,
        );
        builder.le(
            format!("storage_discharge_mode[z{}]", z),
            LinExpr::from(vars.storage_discharge_kw(z))
                + LinExpr::term(vars.storage_charging(z), bigm.storage_power_kw),
            bigm.storage_power_kw,
        );
    }

    builder.eq(
        "storage_cycle",
        LinExpr::from(vars.storage_level_kwh(grid.first()))
            - vars.storage_level_kwh(grid.last()),
        0.0,
    );
}
