//! Solver-agnostic mixed-integer linear model representation.
//!
//! The formulation is assembled through a [`ModelBuilder`] and frozen into an
//! immutable [`MilpModel`] (variables with domains and bounds, linear
//! constraints, one linear objective). The artifact is consumed exactly once
//! by the solver adapter; nothing mutates it after construction, which also
//! makes it cheap to audit a solution against the very constraints that were
//! sent to the solver.

use chargeplan_core::{PlanError, PlanResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Handle to a declared decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarDomain {
    Continuous,
    Integer,
    Binary,
}

/// A declared decision variable with its bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    pub domain: VarDomain,
    pub lower: f64,
    pub upper: f64,
}

/// A sparse linear expression `Σ cᵢ·xᵢ + constant`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    /// The empty expression (zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(c: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    /// A single-term expression `coeff · var`.
    pub fn term(var: VarId, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    /// Append `coeff · var` to this expression.
    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_part(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Terms with coefficients merged per variable, ascending by id.
    pub fn compressed(&self) -> Vec<(VarId, f64)> {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for &(var, coeff) in &self.terms {
            *merged.entry(var).or_insert(0.0) += coeff;
        }
        merged.into_iter().collect()
    }

    /// Merged coefficient of `var` in this expression.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    /// Evaluate against a full assignment (indexed by variable id).
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(var, coeff)| coeff * values[var.index()])
                .sum::<f64>()
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::term(var, 1.0)
    }
}

impl From<f64> for LinExpr {
    fn from(c: f64) -> Self {
        LinExpr::constant(c)
    }
}

impl Add for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Add<VarId> for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: VarId) -> LinExpr {
        self.terms.push((rhs, 1.0));
        self
    }
}

impl Add<f64> for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: f64) -> LinExpr {
        self.constant += rhs;
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: LinExpr) -> LinExpr {
        self.terms
            .extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
        self
    }
}

impl Sub<VarId> for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: VarId) -> LinExpr {
        self.terms.push((rhs, -1.0));
        self
    }
}

impl Sub<f64> for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: f64) -> LinExpr {
        self.constant -= rhs;
        self
    }
}

impl AddAssign for LinExpr {
    fn add_assign(&mut self, rhs: LinExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl AddAssign<VarId> for LinExpr {
    fn add_assign(&mut self, rhs: VarId) {
        self.terms.push((rhs, 1.0));
    }
}

impl SubAssign for LinExpr {
    fn sub_assign(&mut self, rhs: LinExpr) {
        self.terms
            .extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;
    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, c) in &mut self.terms {
            *c *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;
    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs * self
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;
    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl std::iter::Sum for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> LinExpr {
        iter.fold(LinExpr::new(), |acc, e| acc + e)
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Le,
    Ge,
    Eq,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmpOp::Le => write!(f, "<="),
            CmpOp::Ge => write!(f, ">="),
            CmpOp::Eq => write!(f, "="),
        }
    }
}

/// A named linear constraint `expr <= rhs`, `expr >= rhs` or `expr = rhs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinConstraint {
    pub name: String,
    pub expr: LinExpr,
    pub op: CmpOp,
    pub rhs: f64,
}

impl LinConstraint {
    /// Signed violation of this constraint at `values`; non-positive means
    /// satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.eval(values);
        match self.op {
            CmpOp::Le => lhs - self.rhs,
            CmpOp::Ge => self.rhs - lhs,
            CmpOp::Eq => (lhs - self.rhs).abs(),
        }
    }

    /// Whether `values` satisfies this constraint up to `tol`.
    pub fn satisfied(&self, values: &[f64], tol: f64) -> bool {
        self.violation(values) <= tol
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Default for Sense {
    fn default() -> Self {
        Sense::Minimize
    }
}

/// Variable-count summary of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    pub binaries: usize,
    pub integers: usize,
    pub continuous: usize,
    pub constraints: usize,
}

/// The frozen model artifact handed to the solver adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilpModel {
    vars: Vec<VarDef>,
    constraints: Vec<LinConstraint>,
    objective: LinExpr,
    sense: Sense,
}

impl MilpModel {
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.index()]
    }

    pub fn constraints(&self) -> &[LinConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// Serialize the artifact, e.g. to archive the exact model a plan was
    /// produced from.
    pub fn to_json_string(&self) -> PlanResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats {
            binaries: 0,
            integers: 0,
            continuous: 0,
            constraints: self.constraints.len(),
        };
        for var in &self.vars {
            match var.domain {
                VarDomain::Binary => stats.binaries += 1,
                VarDomain::Integer => stats.integers += 1,
                VarDomain::Continuous => stats.continuous += 1,
            }
        }
        stats
    }

    /// Check every constraint and variable bound against an assignment.
    /// Returns the name of the first violated row, if any.
    pub fn first_violation(&self, values: &[f64], tol: f64) -> Option<String> {
        for (i, var) in self.vars.iter().enumerate() {
            let v = values[i];
            if v < var.lower - tol || v > var.upper + tol {
                return Some(format!("bound on {}", var.name));
            }
        }
        self.constraints
            .iter()
            .find(|c| !c.satisfied(values, tol))
            .map(|c| c.name.clone())
    }
}

/// Accumulates variables and constraints, then freezes them into a
/// [`MilpModel`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    vars: Vec<VarDef>,
    constraints: Vec<LinConstraint>,
    objective: LinExpr,
    sense: Sense,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_var(&mut self, name: String, domain: VarDomain, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name,
            domain,
            lower,
            upper,
        });
        id
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name.into(), VarDomain::Binary, 0.0, 1.0)
    }

    pub fn add_integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name.into(), VarDomain::Integer, lower, upper)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name.into(), VarDomain::Continuous, lower, upper)
    }

    /// A continuous variable bounded below by zero.
    pub fn add_nonneg(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name.into(), VarDomain::Continuous, 0.0, f64::INFINITY)
    }

    pub fn le(&mut self, name: impl Into<String>, expr: LinExpr, rhs: f64) {
        self.constraints.push(LinConstraint {
            name: name.into(),
            expr,
            op: CmpOp::Le,
            rhs,
        });
    }

    pub fn ge(&mut self, name: impl Into<String>, expr: LinExpr, rhs: f64) {
        self.constraints.push(LinConstraint {
            name: name.into(),
            expr,
            op: CmpOp::Ge,
            rhs,
        });
    }

    pub fn eq(&mut self, name: impl Into<String>, expr: LinExpr, rhs: f64) {
        self.constraints.push(LinConstraint {
            name: name.into(),
            expr,
            op: CmpOp::Eq,
            rhs,
        });
    }

    pub fn set_objective(&mut self, sense: Sense, objective: LinExpr) {
        self.sense = sense;
        self.objective = objective;
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Freeze the accumulated formulation.
    ///
    /// Rejects inconsistent bounds up front so the solver is never handed a
    /// row that is contradictory by construction.
    pub fn build(self) -> PlanResult<MilpModel> {
        for var in &self.vars {
            if var.lower > var.upper {
                return Err(PlanError::Model(format!(
                    "variable {} has crossed bounds [{}, {}]",
                    var.name, var.lower, var.upper
                )));
            }
            if var.lower.is_nan() || var.upper.is_nan() {
                return Err(PlanError::Model(format!(
                    "variable {} has NaN bounds",
                    var.name
                )));
            }
        }
        for c in &self.constraints {
            if c.rhs.is_nan() || c.expr.constant_part().is_nan() {
                return Err(PlanError::Model(format!("constraint {} has NaN data", c.name)));
            }
            if let Some((var, _)) = c
                .expr
                .terms()
                .iter()
                .find(|(v, _)| v.index() >= self.vars.len())
            {
                return Err(PlanError::Model(format!(
                    "constraint {} references undeclared variable #{}",
                    c.name,
                    var.index()
                )));
            }
        }
        Ok(MilpModel {
            vars: self.vars,
            constraints: self.constraints,
            objective: self.objective,
            sense: self.sense,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_expr_arithmetic() {
        let x = VarId(0);
        let y = VarId(1);
        let expr = (LinExpr::from(x) + y) * 2.0 - LinExpr::term(y, 1.0) + 3.0;

        let values = [5.0, 7.0];
        // 2x + 2y - y + 3 = 10 + 7 + 3
        assert_eq!(expr.eval(&values), 20.0);
    }

    #[test]
    fn test_compressed_merges_duplicates() {
        let x = VarId(0);
        let mut expr = LinExpr::term(x, 1.0);
        expr.add_term(x, 2.5);
        expr.add_term(VarId(1), -1.0);

        let compressed = expr.compressed();
        assert_eq!(compressed, vec![(VarId(0), 3.5), (VarId(1), -1.0)]);
        assert_eq!(expr.coefficient(x), 3.5);
    }

    #[test]
    fn test_constraint_violation() {
        let x = VarId(0);
        let le = LinConstraint {
            name: "cap".into(),
            expr: LinExpr::term(x, 2.0),
            op: CmpOp::Le,
            rhs: 10.0,
        };
        assert!(le.satisfied(&[4.0], 1e-9));
        assert!(!le.satisfied(&[6.0], 1e-9));
        assert_eq!(le.violation(&[6.0]), 2.0);

        let eq = LinConstraint {
            name: "bal".into(),
            expr: LinExpr::from(x),
            op: CmpOp::Eq,
            rhs: 1.0,
        };
        assert!(eq.satisfied(&[1.0 + 1e-10], 1e-9));
        assert!(!eq.satisfied(&[0.9], 1e-9));
    }

    #[test]
    fn test_builder_freezes_model() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_binary("x");
        let y = builder.add_continuous("y", 0.0, 100.0);
        builder.le("link", LinExpr::from(y) - LinExpr::term(x, 100.0), 0.0);
        builder.set_objective(Sense::Minimize, LinExpr::from(y));

        let model = builder.build().unwrap();
        assert_eq!(model.num_vars(), 2);
        assert_eq!(model.constraints().len(), 1);
        let stats = model.stats();
        assert_eq!(stats.binaries, 1);
        assert_eq!(stats.continuous, 1);
    }

    #[test]
    fn test_model_serializes() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_binary("pick");
        builder.le("cap", LinExpr::from(x), 1.0);
        builder.set_objective(Sense::Minimize, LinExpr::from(x));
        let model = builder.build().unwrap();

        let json = model.to_json_string().unwrap();
        assert!(json.contains("\"pick\""));
        assert!(json.contains("\"cap\""));
    }

    #[test]
    fn test_builder_rejects_crossed_bounds() {
        let mut builder = ModelBuilder::new();
        builder.add_continuous("bad", 2.0, 1.0);
        assert!(matches!(builder.build(), Err(PlanError::Model(_))));
    }

    #[test]
    fn test_first_violation_checks_bounds_and_rows() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_binary("x");
        builder.ge("floor", LinExpr::from(x), 1.0);
        let model = builder.build().unwrap();

        assert_eq!(model.first_violation(&[1.0], 1e-6), None);
        assert_eq!(
            model.first_violation(&[0.0], 1e-6),
            Some("floor".to_string())
        );
        assert_eq!(
            model.first_violation(&[2.0], 1e-6),
            Some("bound on x".to_string())
        );
    }

    proptest! {
        /// eval is linear: eval(a·e1 + e2) = a·eval(e1) + eval(e2)
        #[test]
        fn prop_eval_is_linear(
            coeffs1 in proptest::collection::vec(-50.0f64..50.0, 4),
            coeffs2 in proptest::collection::vec(-50.0f64..50.0, 4),
            values in proptest::collection::vec(-10.0f64..10.0, 4),
            a in -5.0f64..5.0,
        ) {
            let mut e1 = LinExpr::new();
            let mut e2 = LinExpr::new();
            for (i, (&c1, &c2)) in coeffs1.iter().zip(&coeffs2).enumerate() {
                e1.add_term(VarId(i), c1);
                e2.add_term(VarId(i), c2);
            }
            let combined = e1.clone() * a + e2.clone();
            let lhs = combined.eval(&values);
            let rhs = a * e1.eval(&values) + e2.eval(&values);
            prop_assert!((lhs - rhs).abs() < 1e-8);
        }
    }
}
