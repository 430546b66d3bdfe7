//! # chargeplan-milp: Day-Ahead Fleet & Charging MILP
//!
//! Formulates the day-ahead fleet-composition, tour-assignment and
//! charging-schedule problem for a mixed diesel/electric truck fleet that
//! shares charging infrastructure, a stationary storage unit and a
//! capacity-limited grid connection, then hands the frozen model to HiGHS
//! and projects the solution back into typed results.
//!
//! ## Structure
//!
//! - [`model`]: the solver-agnostic MILP artifact: variables, bounds,
//!   linear constraints, objective. Built once, immutable afterwards.
//! - [`vars`]: the typed decision variable space over tours, trucks,
//!   types, chargers and intervals.
//! - [`linearize`]: exact binary-product auxiliaries keeping the coupled
//!   cost and energy terms linear.
//! - [`constraints`]: predicate-gated constraint families: coverage,
//!   movement exclusivity, forward-tour linkage, energy dynamics, charging
//!   logic, charger capacity, grid and storage balance.
//! - [`objective`]: the annualized cost assembly and its read-side
//!   [`objective::CostBreakdown`] twin.
//! - [`solver`]: the HiGHS adapter with status fidelity (optimal /
//!   feasible / infeasible / time limit).
//! - [`solution`]: read-only projections, the human-readable summary and
//!   the post-solve invariant audit.
//!
//! ## Quick start
//!
//! ```no_run
//! use chargeplan_core::{Catalog, TimeGrid};
//! use chargeplan_milp::{plan, SolveOptions, SolveStatus};
//!
//! # fn run(catalog: Catalog) -> chargeplan_core::PlanResult<()> {
//! let grid = TimeGrid::quarter_hourly();
//! let outcome = plan(&catalog, &grid, &SolveOptions::default())?;
//! match outcome.status {
//!     SolveStatus::Infeasible => println!("inputs are over-constrained"),
//!     _ => {
//!         if let Some(solution) = &outcome.solution {
//!             println!("{}", solution.summary(&catalog));
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bigm;
pub mod build;
pub mod constraints;
pub mod linearize;
pub mod model;
pub mod objective;
pub mod solution;
pub mod solver;
pub mod vars;

#[cfg(test)]
pub(crate) mod testutil;

pub use bigm::BigM;
pub use build::{build_fleet_model, plan, solve_fleet_model, FleetModel, PlanOutcome};
pub use model::{CmpOp, LinConstraint, LinExpr, MilpModel, ModelBuilder, Sense, VarDomain, VarId};
pub use objective::CostBreakdown;
pub use solution::{FleetSolution, TourStop, TruckPlan};
pub use solver::{SolveOptions, SolveStatus};
pub use vars::FleetVars;
