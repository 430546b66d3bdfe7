//! HiGHS adapter: feeds a frozen [`MilpModel`] to the solver and maps the
//! result back.
//!
//! The solver is a black box to the rest of the crate. It enforces the
//! wall-clock budget itself; the adapter's job is to translate the model
//! faithfully, to distinguish the termination statuses callers react to
//! differently (infeasible: relax inputs; time limit: wait longer or accept
//! the incumbent), and never to report a time-limited incumbent as proven
//! optimal.

use crate::model::{CmpOp, MilpModel, Sense, VarDomain};
use chargeplan_core::{PlanError, PlanResult};
use highs::{HighsModelStatus, RowProblem, Sense as HighsSense};
use serde::{Deserialize, Serialize};
use std::ops::Bound;
use std::time::Instant;
use tracing::{debug, info};

/// Feasibility tolerance used when auditing returned values. Wider than the
/// solver's own primal tolerance so legitimate solutions are never rejected
/// over accumulated floating-point residue.
pub const FEASIBILITY_TOL: f64 = 1e-4;

/// Knobs passed through to the solver.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Wall-clock budget in seconds; `None` lets the solver run to proof.
    pub time_limit_seconds: Option<f64>,
    /// Relative MIP gap at which the solver may stop.
    pub mip_rel_gap: Option<f64>,
    /// Forward solver output to the console.
    pub verbose: bool,
}

/// Termination status of a solve, as the caller should react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal solution.
    Optimal,
    /// Feasible incumbent, optimality unproven (e.g. stopped at the time
    /// limit with a solution in hand).
    Feasible,
    /// The constraints are jointly unsatisfiable. A legitimate outcome,
    /// not a defect.
    Infeasible,
    /// Stopped at the time limit with no incumbent.
    TimeLimit,
    /// The solver gave up for another reason; see the outcome message.
    Error,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Feasible => write!(f, "feasible (not proven optimal)"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::TimeLimit => write!(f, "time limit reached"),
            SolveStatus::Error => write!(f, "error"),
        }
    }
}

/// A value for every declared variable, plus the objective they induce.
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub objective: f64,
    pub values: Vec<f64>,
}

/// What came back from the solver.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Populated only when the solver produced usable values; never assume
    /// it is present for non-optimal statuses.
    pub solution: Option<RawSolution>,
    pub solve_time: std::time::Duration,
    pub message: Option<String>,
}

fn column_bounds(lower: f64, upper: f64) -> (Bound<f64>, Bound<f64>) {
    let low = if lower.is_finite() {
        Bound::Included(lower)
    } else {
        Bound::Unbounded
    };
    let high = if upper.is_finite() {
        Bound::Included(upper)
    } else {
        Bound::Unbounded
    };
    (low, high)
}

/// Solve `model` with HiGHS.
pub fn solve_milp(model: &MilpModel, options: &SolveOptions) -> PlanResult<SolveOutcome> {
    let start = Instant::now();
    let mut problem = RowProblem::default();

    // objective coefficients are attached at column creation
    let mut objective_coeffs = vec![0.0; model.num_vars()];
    for (var, coeff) in model.objective().compressed() {
        objective_coeffs[var.index()] = coeff;
    }

    let mut cols = Vec::with_capacity(model.num_vars());
    for (i, var) in model.vars().iter().enumerate() {
        let bounds = column_bounds(var.lower, var.upper);
        let col = match var.domain {
            VarDomain::Continuous => problem.add_column(objective_coeffs[i], bounds),
            VarDomain::Integer | VarDomain::Binary => {
                problem.add_integer_column(objective_coeffs[i], bounds)
            }
        };
        cols.push(col);
    }

    for constraint in model.constraints() {
        let terms: Vec<_> = constraint
            .expr
            .compressed()
            .into_iter()
            .map(|(var, coeff)| (cols[var.index()], coeff))
            .collect();
        // fold any constant part of the expression into the row bounds
        let rhs = constraint.rhs - constraint.expr.constant_part();
        let range = match constraint.op {
            CmpOp::Le => (Bound::Unbounded, Bound::Included(rhs)),
            CmpOp::Ge => (Bound::Included(rhs), Bound::Unbounded),
            CmpOp::Eq => (Bound::Included(rhs), Bound::Included(rhs)),
        };
        problem.add_row(range, terms);
    }

    let sense = match model.sense() {
        Sense::Minimize => HighsSense::Minimise,
        Sense::Maximize => HighsSense::Maximise,
    };

    let mut solver = problem.optimise(sense);
    solver.set_option("output_flag", options.verbose);
    if let Some(limit) = options.time_limit_seconds {
        solver.set_option("time_limit", limit);
    }
    if let Some(gap) = options.mip_rel_gap {
        solver.set_option("mip_rel_gap", gap);
    }

    let stats = model.stats();
    info!(
        "solving MILP: {} vars ({} binary, {} integer), {} rows",
        model.num_vars(),
        stats.binaries,
        stats.integers,
        stats.constraints
    );

    let solved = solver.solve();
    let status = solved.status();
    let solve_time = start.elapsed();
    debug!("solver finished with status {:?} in {:?}", status, solve_time);

    let outcome = |status, solution, message| SolveOutcome {
        status,
        solution,
        solve_time,
        message,
    };

    match status {
        HighsModelStatus::Optimal => {
            let values = solved.get_solution().columns().to_vec();
            let solution = accept_values(model, values)?;
            Ok(outcome(SolveStatus::Optimal, Some(solution), None))
        }
        HighsModelStatus::Infeasible => Ok(outcome(
            SolveStatus::Infeasible,
            None,
            Some("constraints are jointly unsatisfiable".into()),
        )),
        other => {
            // Status names differ across HiGHS releases; classify on the
            // debug label instead of enumerating every variant.
            let label = format!("{:?}", other);
            if label.contains("TimeLimit") {
                // salvage the incumbent if the returned point is actually
                // feasible for the model we sent
                let values = solved.get_solution().columns().to_vec();
                match accept_values(model, values) {
                    Ok(solution) => Ok(outcome(
                        SolveStatus::Feasible,
                        Some(solution),
                        Some("time limit reached; best known solution returned".into()),
                    )),
                    Err(_) => Ok(outcome(
                        SolveStatus::TimeLimit,
                        None,
                        Some("time limit reached before any feasible solution".into()),
                    )),
                }
            } else if label.contains("Unbounded") {
                // an unbounded fleet model is a formulation defect
                Err(PlanError::Solver(format!(
                    "model is unbounded or ill-posed (HiGHS status {})",
                    label
                )))
            } else {
                Ok(outcome(
                    SolveStatus::Error,
                    None,
                    Some(format!("solver stopped with status {}", label)),
                ))
            }
        }
    }
}

/// Validate solver output before handing it to callers: one finite value
/// per declared variable, satisfying every row and bound.
fn accept_values(model: &MilpModel, values: Vec<f64>) -> PlanResult<RawSolution> {
    if values.len() != model.num_vars() {
        return Err(PlanError::Solver(format!(
            "solver returned {} values for {} variables",
            values.len(),
            model.num_vars()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PlanError::Solver("solver returned non-finite values".into()));
    }
    if let Some(row) = model.first_violation(&values, FEASIBILITY_TOL) {
        return Err(PlanError::Solver(format!(
            "solver values violate `{}`",
            row
        )));
    }
    let objective = model.objective().eval(&values);
    Ok(RawSolution { objective, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinExpr, ModelBuilder};

    #[test]
    fn test_solves_small_integer_program() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_integer("x", 0.0, 10.0);
        builder.ge("floor", LinExpr::from(x), 2.5);
        builder.set_objective(Sense::Minimize, LinExpr::from(x));
        let model = builder.build().unwrap();

        let outcome = solve_milp(&model, &SolveOptions::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        let solution = outcome.solution.unwrap();
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.objective - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_objective_constant_is_reported() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous("x", 1.0, 5.0);
        builder.set_objective(Sense::Minimize, LinExpr::from(x) + 100.0);
        let model = builder.build().unwrap();

        let outcome = solve_milp(&model, &SolveOptions::default()).unwrap();
        let solution = outcome.solution.unwrap();
        assert!((solution.objective - 101.0).abs() < 1e-6);
    }

    #[test]
    fn test_reports_infeasibility_distinctly() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous("x", 0.0, 10.0);
        builder.le("cap", LinExpr::from(x), 1.0);
        builder.ge("floor", LinExpr::from(x), 2.0);
        builder.set_objective(Sense::Minimize, LinExpr::from(x));
        let model = builder.build().unwrap();

        let outcome = solve_milp(&model, &SolveOptions::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.solution.is_none());
    }

    #[test]
    fn test_unbounded_model_is_an_error() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous("x", 0.0, f64::INFINITY);
        builder.set_objective(Sense::Maximize, LinExpr::from(x));
        let model = builder.build().unwrap();

        assert!(solve_milp(&model, &SolveOptions::default()).is_err());
    }

    #[test]
    fn test_binary_domain_is_integral() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_binary("x");
        let y = builder.add_binary("y");
        builder.le("pick", LinExpr::from(x) + y, 1.0);
        builder.set_objective(
            Sense::Maximize,
            LinExpr::term(x, 1.0) + LinExpr::term(y, 0.6),
        );
        let model = builder.build().unwrap();

        let outcome = solve_milp(&model, &SolveOptions::default()).unwrap();
        let solution = outcome.solution.unwrap();
        assert!((solution.values[0] - 1.0).abs() < 1e-6);
        assert!(solution.values[1].abs() < 1e-6);
    }
}
