//! Night-time linkage between arrivals and the next departure.
//!
//! After a night interval `z`, `has_future[k,z]` flags whether truck `k`
//! still has an assigned departure ahead, and `next_tour[r,k,z]` selects
//! which tour that is. Candidate sets shrink as the night progresses; once
//! no tour starts after `z` the indicator is pinned to zero and every
//! forward-looking family is vacuously skipped.

use crate::model::{LinExpr, ModelBuilder};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, TimeGrid};

/// Emit the forward-tour families on the night band.
pub fn add_future_tour_constraints(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    builder: &mut ModelBuilder,
) {
    for k in 0..vars.n_trucks() {
        for z in grid.night_intervals() {
            let hf = vars
                .has_future(k, z)
                .expect("has_future declared for every night interval");

            let after: Vec<usize> = (0..vars.n_tours())
                .filter(|&r| catalog.tours[r].start > z)
                .collect();

            if after.is_empty() {
                builder.eq(format!("no_future[k{},z{}]", k + 1, z), LinExpr::from(hf), 0.0);
                continue;
            }

            let mut assigned_after = LinExpr::new();
            for &r in &after {
                assigned_after.add_term(vars.tour_assignment(r, k), 1.0);
            }
            builder.le(
                format!("future_ub[k{},z{}]", k + 1, z),
                LinExpr::from(hf) - assigned_after.clone(),
                0.0,
            );
            builder.le(
                format!("future_lb[k{},z{}]", k + 1, z),
                assigned_after - LinExpr::term(hf, after.len() as f64),
                0.0,
            );

            let mut next_sum = LinExpr::new();
            for &r in &after {
                let next = vars
                    .next_tour(r, k, z)
                    .expect("next_tour declared for tours starting after z");
                next_sum.add_term(next, 1.0);
            }
            builder.le(
                format!("next_arrival[k{},z{}]", k + 1, z),
                next_sum.clone() - vars.arrive(k, z),
                0.0,
            );
            builder.le(
                format!("next_future[k{},z{}]", k + 1, z),
                next_sum.clone() - hf,
                0.0,
            );
            // an arrival with departures still ahead must pick its successor
            builder.ge(
                format!("next_forced[k{},z{}]", k + 1, z),
                next_sum - vars.arrive(k, z) - hf,
                -1.0,
            );

            for &r in &after {
                let next = vars
                    .next_tour(r, k, z)
                    .expect("next_tour declared for tours starting after z");
                builder.le(
                    format!("next_assigned[{},k{},z{}]", catalog.tours[r].name, k + 1, z),
                    LinExpr::from(next) - vars.tour_assignment(r, k),
                    0.0,
                );

                // the successor must be the time-nearest candidate
                let intermediates: Vec<usize> = after
                    .iter()
                    .copied()
                    .filter(|&rp| catalog.tours[rp].start < catalog.tours[r].start)
                    .collect();
                if !intermediates.is_empty() {
                    let mut expr = LinExpr::from(next);
                    for rp in intermediates {
                        let earlier = vars
                            .next_tour(rp, k, z)
                            .expect("next_tour declared for tours starting after z");
                        expr.add_term(earlier, 1.0);
                    }
                    builder.le(
                        format!(
                            "next_nearest[{},k{},z{}]",
                            catalog.tours[r].name,
                            k + 1,
                            z
                        ),
                        expr,
                        1.0,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{day24_grid, mixed_catalog};

    fn build() -> (crate::model::MilpModel, FleetVars) {
        let catalog = mixed_catalog();
        let grid = day24_grid();
        let mut builder = ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);
        add_future_tour_constraints(&catalog, &grid, &vars, &mut builder);
        (builder.build().unwrap(), vars)
    }

    #[test]
    fn test_late_night_has_no_forward_rows() {
        let (model, _) = build();

        // tours start at 8 and 14; after interval 19 nothing remains
        assert!(model
            .constraints()
            .iter()
            .any(|c| c.name == "no_future[k1,z19]"));
        assert!(!model
            .constraints()
            .iter()
            .any(|c| c.name.starts_with("future_ub[k1,z19]")));
        assert!(!model
            .constraints()
            .iter()
            .any(|c| c.name.starts_with("next_arrival[k1,z19]")));

        // early night still sees both candidates
        assert!(model
            .constraints()
            .iter()
            .any(|c| c.name == "future_ub[k1,z3]"));
    }

    #[test]
    fn test_future_flag_tracks_assignments() {
        let (model, vars) = build();
        let ub = model
            .constraints()
            .iter()
            .find(|c| c.name == "future_ub[k1,z3]")
            .unwrap();
        let lb = model
            .constraints()
            .iter()
            .find(|c| c.name == "future_lb[k1,z3]")
            .unwrap();

        let hf = vars.has_future(0, 3).unwrap();
        let mut values = vec![0.0; model.num_vars()];

        // no assignments: flag must stay down
        values[hf.index()] = 1.0;
        assert!(!ub.satisfied(&values, 1e-9));

        // one assignment: flag must come up
        values[hf.index()] = 0.0;
        values[vars.tour_assignment(0, 0).index()] = 1.0;
        assert!(!lb.satisfied(&values, 1e-9));
        values[hf.index()] = 1.0;
        assert!(ub.satisfied(&values, 1e-9) && lb.satisfied(&values, 1e-9));
    }

    #[test]
    fn test_nearest_tour_precedence() {
        let (model, vars) = build();
        // tour "pm" (starts 14) may only be next if "am" (starts 8) is not
        let row = model
            .constraints()
            .iter()
            .find(|c| c.name == "next_nearest[pm,k1,z3]")
            .unwrap();

        let mut values = vec![0.0; model.num_vars()];
        values[vars.next_tour(1, 0, 3).unwrap().index()] = 1.0;
        assert!(row.satisfied(&values, 1e-9));
        values[vars.next_tour(0, 0, 3).unwrap().index()] = 1.0;
        assert!(!row.satisfied(&values, 1e-9));

        // and "am" itself has no earlier candidate
        assert!(!model
            .constraints()
            .iter()
            .any(|c| c.name == "next_nearest[am,k1,z3]"));
    }
}
