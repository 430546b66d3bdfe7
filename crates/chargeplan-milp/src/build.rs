//! Model assembly and the one-call planning entry point.
//!
//! Building is a single pure pass over the catalog and grid: declare the
//! variable space (including the product auxiliaries), generate every
//! constraint family, assemble the objective, freeze. The frozen model pairs
//! the generic MILP with the typed variable handles needed to read a
//! solution back.

use crate::bigm::BigM;
use crate::constraints::add_all_constraints;
use crate::model::{MilpModel, ModelBuilder, ModelStats};
use crate::objective::add_objective;
use crate::solution::FleetSolution;
use crate::solver::{solve_milp, SolveOptions, SolveStatus};
use crate::vars::FleetVars;
use chargeplan_core::{Catalog, PlanResult, TimeGrid};
use tracing::debug;

/// The frozen fleet model: the MILP artifact plus the variable handles to
/// interpret its solution.
#[derive(Debug, Clone)]
pub struct FleetModel {
    milp: MilpModel,
    vars: FleetVars,
}

impl FleetModel {
    pub fn milp(&self) -> &MilpModel {
        &self.milp
    }

    pub fn vars(&self) -> &FleetVars {
        &self.vars
    }

    pub fn stats(&self) -> ModelStats {
        self.milp.stats()
    }
}

/// Build the day-ahead fleet model from validated inputs.
///
/// Fails fast on an inconsistent catalog; no constraint is generated from
/// unvalidated data.
pub fn build_fleet_model(catalog: &Catalog, grid: &TimeGrid) -> PlanResult<FleetModel> {
    catalog.validate(grid)?;
    let bigm = BigM::derive(catalog);

    let mut builder = ModelBuilder::new();
    let vars = FleetVars::declare(catalog, grid, &mut builder);
    add_all_constraints(catalog, grid, &vars, &bigm, &mut builder);
    add_objective(catalog, grid, &vars, &mut builder);

    debug!(
        "assembled fleet model: {} variables, {} constraints",
        builder.num_vars(),
        builder.num_constraints()
    );

    let milp = builder.build()?;
    Ok(FleetModel { milp, vars })
}

/// Result of planning one day.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub status: SolveStatus,
    /// Present for optimal solves and for time-limited solves that still
    /// produced a feasible incumbent.
    pub solution: Option<FleetSolution>,
    pub solve_time: std::time::Duration,
    pub message: Option<String>,
}

/// Solve an already-built model and project the result.
pub fn solve_fleet_model(
    model: &FleetModel,
    catalog: &Catalog,
    grid: &TimeGrid,
    options: &SolveOptions,
) -> PlanResult<PlanOutcome> {
    let outcome = solve_milp(&model.milp, options)?;
    let solution = outcome.solution.map(|raw| {
        FleetSolution::from_raw(catalog, grid, &model.vars, outcome.status, raw)
    });
    Ok(PlanOutcome {
        status: outcome.status,
        solution,
        solve_time: outcome.solve_time,
        message: outcome.message,
    })
}

/// Build and solve in one call.
pub fn plan(
    catalog: &Catalog,
    grid: &TimeGrid,
    options: &SolveOptions,
) -> PlanResult<PlanOutcome> {
    let model = build_fleet_model(catalog, grid)?;
    solve_fleet_model(&model, catalog, grid, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{day24_grid, mixed_catalog};
    use chargeplan_core::PlanError;

    #[test]
    fn test_build_produces_consistent_model() {
        let catalog = mixed_catalog();
        let grid = day24_grid();
        let model = build_fleet_model(&catalog, &grid).unwrap();

        let stats = model.stats();
        assert!(stats.binaries > 0);
        // one integer install count per charger type
        assert_eq!(stats.integers, catalog.charger_types.len());
        assert!(stats.constraints > 0);

        // every tour has exactly one coverage row
        let covers = model
            .milp()
            .constraints()
            .iter()
            .filter(|c| c.name.starts_with("cover["))
            .count();
        assert_eq!(covers, catalog.tours.len());
    }

    #[test]
    fn test_invalid_catalog_fails_before_generation() {
        let mut catalog = mixed_catalog();
        catalog.tours[0].end = catalog.tours[0].start;
        let grid = day24_grid();

        assert!(matches!(
            build_fleet_model(&catalog, &grid),
            Err(PlanError::Catalog(_))
        ));
    }
}
