//! Type assignment, tour coverage and movement exclusivity.

use crate::bigm::BigM;
use crate::model::{LinExpr, ModelBuilder};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, TimeGrid};

/// Emit the assignment families:
///
/// - every truck slot occupies exactly one type for the whole day,
/// - every tour is covered by exactly one truck,
/// - the truck-used indicator is sandwiched between zero and the number of
///   tours the truck actually runs,
/// - no truck runs two tours at once or takes two arrivals in the same
///   interval,
/// - the depart/arrive indicators equal the assignment-weighted start/end
///   flags (they are defined, not free).
pub fn add_assignment_constraints(
    catalog: &Catalog,
    grid: &TimeGrid,
    vars: &FleetVars,
    bigm: &BigM,
    builder: &mut ModelBuilder,
) {
    for k in 0..vars.n_trucks() {
        let mut one_type = LinExpr::new();
        for t in 0..vars.n_types() {
            one_type.add_term(vars.type_assignment(k, t), 1.0);
        }
        builder.eq(format!("one_type[k{}]", k + 1), one_type, 1.0);
    }

    for (r, tour) in catalog.tours.iter().enumerate() {
        let mut cover = LinExpr::new();
        for k in 0..vars.n_trucks() {
            cover.add_term(vars.tour_assignment(r, k), 1.0);
        }
        builder.eq(format!("cover[{}]", tour.name), cover, 1.0);
    }

    for k in 0..vars.n_trucks() {
        let mut assigned = LinExpr::new();
        for r in 0..vars.n_tours() {
            assigned.add_term(vars.tour_assignment(r, k), 1.0);
        }
        builder.le(
            format!("used_lb[k{}]", k + 1),
            LinExpr::from(vars.truck_used(k)) - assigned.clone(),
            0.0,
        );
        builder.le(
            format!("used_ub[k{}]", k + 1),
            assigned - LinExpr::term(vars.truck_used(k), bigm.tour_count),
            0.0,
        );
    }

    for k in 0..vars.n_trucks() {
        for z in grid.intervals() {
            let active: Vec<usize> = (0..vars.n_tours())
                .filter(|&r| grid.active_during(&catalog.tours[r], z))
                .collect();
            // a single active candidate cannot overlap with anything
            if active.len() >= 2 {
                let mut expr = LinExpr::new();
                for &r in &active {
                    expr.add_term(vars.tour_assignment(r, k), 1.0);
                }
                builder.le(format!("no_overlap[k{},z{}]", k + 1, z), expr, 1.0);
            }

            let ending: Vec<usize> = (0..vars.n_tours())
                .filter(|&r| grid.ends_at(&catalog.tours[r], z))
                .collect();
            if ending.len() >= 2 {
                let mut expr = LinExpr::new();
                for &r in &ending {
                    expr.add_term(vars.tour_assignment(r, k), 1.0);
                }
                builder.le(format!("single_arrival[k{},z{}]", k + 1, z), expr, 1.0);
            }
        }
    }

    for k in 0..vars.n_trucks() {
        for z in grid.intervals() {
            let mut depart_def = LinExpr::from(vars.depart(k, z));
            let mut arrive_def = LinExpr::from(vars.arrive(k, z));
            for (r, tour) in catalog.tours.iter().enumerate() {
                if grid.starts_at(tour, z) {
                    depart_def.add_term(vars.tour_assignment(r, k), -1.0);
                }
                if grid.ends_at(tour, z) {
                    arrive_def.add_term(vars.tour_assignment(r, k), -1.0);
                }
            }
            builder.eq(format!("depart_def[k{},z{}]", k + 1, z), depart_def, 0.0);
            builder.eq(format!("arrive_def[k{},z{}]", k + 1, z), arrive_def, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{day24_grid, mixed_catalog};

    #[test]
    fn test_family_row_counts() {
        let catalog = mixed_catalog();
        let grid = day24_grid();
        let mut builder = ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);
        let bigm = BigM::derive(&catalog);
        let before = builder.num_constraints();
        add_assignment_constraints(&catalog, &grid, &vars, &bigm, &mut builder);
        let model = builder.build().unwrap();

        let count = |prefix: &str| {
            model
                .constraints()
                .iter()
                .filter(|c| c.name.starts_with(prefix))
                .count()
        };
        assert_eq!(count("one_type["), catalog.truck_slots);
        assert_eq!(count("cover["), catalog.tours.len());
        assert_eq!(count("used_lb["), catalog.truck_slots);
        assert_eq!(count("used_ub["), catalog.truck_slots);
        // depart/arrive are defined for every truck and interval
        assert_eq!(count("depart_def["), catalog.truck_slots * grid.len());
        assert_eq!(count("arrive_def["), catalog.truck_slots * grid.len());
        // the two test tours overlap in 14..=15, two intervals per truck
        assert_eq!(count("no_overlap["), catalog.truck_slots * 2);
        // they end in different intervals, so the arrival family is vacuous
        assert_eq!(count("single_arrival["), 0);
        assert!(model.constraints().len() > before);
    }

    #[test]
    fn test_double_booking_is_cut_off() {
        let catalog = mixed_catalog();
        let grid = day24_grid();
        let mut builder = ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);
        let bigm = BigM::derive(&catalog);
        add_assignment_constraints(&catalog, &grid, &vars, &bigm, &mut builder);
        let model = builder.build().unwrap();

        let mut values = vec![0.0; model.num_vars()];
        // both overlapping tours on truck 1
        values[vars.tour_assignment(0, 0).index()] = 1.0;
        values[vars.tour_assignment(1, 0).index()] = 1.0;

        let overlap = model
            .constraints()
            .iter()
            .find(|c| c.name.starts_with("no_overlap[k1"))
            .unwrap();
        assert!(!overlap.satisfied(&values, 1e-9));

        // moving the second tour to truck 2 resolves it
        values[vars.tour_assignment(1, 0).index()] = 0.0;
        values[vars.tour_assignment(1, 1).index()] = 1.0;
        assert!(overlap.satisfied(&values, 1e-9));
    }

    #[test]
    fn test_depart_definition_forces_indicator() {
        let catalog = mixed_catalog();
        let grid = day24_grid();
        let mut builder = ModelBuilder::new();
        let vars = FleetVars::declare(&catalog, &grid, &mut builder);
        let bigm = BigM::derive(&catalog);
        add_assignment_constraints(&catalog, &grid, &vars, &bigm, &mut builder);
        let model = builder.build().unwrap();

        let start = catalog.tours[0].start;
        let mut values = vec![0.0; model.num_vars()];
        values[vars.tour_assignment(0, 0).index()] = 1.0;

        let def = model
            .constraints()
            .iter()
            .find(|c| c.name == format!("depart_def[k1,z{start}]"))
            .unwrap();
        // indicator off while the tour is assigned: definition violated
        assert!(!def.satisfied(&values, 1e-9));
        values[vars.depart(0, start).index()] = 1.0;
        assert!(def.satisfied(&values, 1e-9));
    }
}
