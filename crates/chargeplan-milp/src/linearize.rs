//! Exact linearization of binary-variable products.
//!
//! The formulation needs terms like "this tour's diesel cost counts only if
//! truck k runs the tour *and* truck k is a diesel", a product of two
//! binaries. The model must stay linear, so each product gets a dedicated
//! auxiliary binary `w` tied to its factors by three inequalities:
//!
//! ```text
//! w <= x        w <= y        w >= x + y - 1
//! ```
//!
//! Together with `w ∈ [0, 1]` these force `w = x·y` for every feasible
//! assignment of the factors. The same pattern covers any future coupling
//! (e.g. type × charger-type restrictions) without touching the solver.

use crate::model::{LinExpr, ModelBuilder, VarId};

/// Declare a binary auxiliary equal to the product `x·y` of two binary
/// variables.
pub fn binary_product(builder: &mut ModelBuilder, name: &str, x: VarId, y: VarId) -> VarId {
    let w = builder.add_binary(name);
    builder.le(format!("{name}/le_first"), LinExpr::from(w) - x, 0.0);
    builder.le(format!("{name}/le_second"), LinExpr::from(w) - y, 0.0);
    builder.ge(format!("{name}/ge_both"), LinExpr::from(w) - x - y, -1.0);
    w
}
