//! Charging logic and charger capacity.
//!
//! A truck is *plugged* when physically connected and *drawing* when
//! current actually flows; delivered power needs the draw flag, the draw
//! flag needs the connection, and combustion-typed trucks get both forced
//! to zero through the electric share of their type assignment. Unplugging
//! is only possible at policy-approved interval boundaries, and always
//! happens before a departure.

use crate::model::{LinExpr, ModelBuilder};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, TimeGrid};

/// Sum of truck `k`'s electric type-assignment binaries; 1 iff the truck is
/// of an electric type.
fn electric_share(catalog: &Catalog, vars: &FleetVars, k: usize) -> LinExpr {
    let mut expr = LinExpr::new();
    for t in catalog.electric_type_indices() {
        expr.add_term(vars.type_assignment(k, t), 1.0);
    }
    expr
}

/// Emit the per-truck charging families and the per-charger capacity
/// families.
pub fn add_charging_constraints(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    builder: &mut ModelBuilder,
) {
    for k in 0..vars.n_trucks() {
        for (l, charger) in catalog.charger_types.iter().enumerate() {
            for z in grid.intervals() {
                // power flows only while the draw flag is up, bounded by the
                // unit's rating
                builder.le(
                    format!("charge_draw[k{},{},z{}]", k + 1, charger.name, z),
                    LinExpr::from(vars.charge_kw(k, l, z))
                        - LinExpr::term(vars.drawing(k, l, z), charger.max_power.value()),
                    0.0,
                );

                // and never beyond what the assigned truck type accepts
                let mut type_cap = LinExpr::from(vars.charge_kw(k, l, z));
                for (t, ty) in catalog.truck_types.iter().enumerate() {
                    type_cap.add_term(
                        vars.type_assignment(k, t),
                        -ty.max_charge_power().value(),
                    );
                }
                builder.le(
                    format!("charge_type[k{},{},z{}]", k + 1, charger.name, z),
                    type_cap,
                    0.0,
                );

                builder.le(
                    format!("draw_plug[k{},{},z{}]", k + 1, charger.name, z),
                    LinExpr::from(vars.drawing(k, l, z)) - vars.plugged(k, l, z),
                    0.0,
                );

                builder.le(
                    format!("plug_electric[k{},{},z{}]", k + 1, charger.name, z),
                    LinExpr::from(vars.plugged(k, l, z)) - electric_share(catalog, vars, k),
                    0.0,
                );
                builder.le(
                    format!("draw_electric[k{},{},z{}]", k + 1, charger.name, z),
                    LinExpr::from(vars.drawing(k, l, z)) - electric_share(catalog, vars, k),
                    0.0,
                );

                if let Some(next) = grid.successor(z) {
                    // connections are released before a departure
                    builder.le(
                        format!("unplug_depart[k{},{},z{}]", k + 1, charger.name, z),
                        LinExpr::from(vars.plugged(k, l, z)) + vars.depart(k, next),
                        1.0,
                    );

                    // dropping a connection is only possible at approved
                    // boundaries; elsewhere the connection must persist
                    if !grid.unplug_allowed(z) {
                        builder.le(
                            format!("unplug_window[k{},{},z{}]", k + 1, charger.name, z),
                            LinExpr::from(vars.plugged(k, l, z)) - vars.plugged(k, l, next),
                            0.0,
                        );
                    }
                }
            }
        }
    }

    for k in 0..vars.n_trucks() {
        for z in grid.intervals() {
            // at most one connection per truck
            if vars.n_chargers() >= 2 {
                let mut expr = LinExpr::new();
                for l in 0..vars.n_chargers() {
                    expr.add_term(vars.plugged(k, l, z), 1.0);
                }
                builder.le(format!("one_charger[k{},z{}]", k + 1, z), expr, 1.0);
            }

            // never plugged while an assigned tour is underway
            if vars.n_chargers() >= 1 {
                let active: Vec<usize> = (0..vars.n_tours())
                    .filter(|&r| grid.active_during(&catalog.tours[r], z))
                    .collect();
                if !active.is_empty() {
                    let mut expr = LinExpr::new();
                    for l in 0..vars.n_chargers() {
                        expr.add_term(vars.plugged(k, l, z), 1.0);
                    }
                    for &r in &active {
                        expr.add_term(vars.tour_assignment(r, k), 1.0);
                    }
                    builder.le(format!("no_charge_drive[k{},z{}]", k + 1, z), expr, 1.0);
                }
            }
        }
    }

    for (l, charger) in catalog.charger_types.iter().enumerate() {
        let points = f64::from(charger.connection_points);
        for z in grid.intervals() {
            let mut plugged = LinExpr::new();
            let mut drawing = LinExpr::new();
            let mut power = LinExpr::new();
            for k in 0..vars.n_trucks() {
                plugged.add_term(vars.plugged(k, l, z), 1.0);
                drawing.add_term(vars.drawing(k, l, z), 1.0);
                power.add_term(vars.charge_kw(k, l, z), 1.0);
            }
            builder.le(
                format!("charger_points[{},z{}]", charger.name, z),
                plugged - LinExpr::term(vars.charger_units(l), points),
                0.0,
            );
            builder.le(
                format!("charger_draws[{},z{}]", charger.name, z),
                drawing - LinExpr::term(vars.charger_units(l), points),
                0.0,
            );
            builder.le(
                format!("charger_power[{},z{}]", charger.name, z),
                power - LinExpr::term(vars.charger_units(l), charger.max_power.value()),
                0.0,
            );
        }
    }

    if vars.n_chargers() >= 1 {
        let mut total = LinExpr::new();
        for l in 0..vars.n_chargers() {
            total.add_term(vars.charger_units(l), 1.0);
        }
        builder.le(
            "charger_site_cap",
            total,
            f64::from(catalog.max_total_charger_units),
        );
    }
}
