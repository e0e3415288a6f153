//! Solver-agnostic mixed-integer model building blocks.
//!
//! The rescheduling model is constructed against this small IR (variables,
//! linear constraints, objective, solve with a time limit) so solver
//! back-ends can be substituted without touching constraint construction.

/// Index of a decision variable within a [`MilpProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub usize);

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarDomain {
    Continuous { lower: f64, upper: f64 },
    Binary,
}

/// A linear combination of variables plus a constant.
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        LinearExpr::default()
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        LinearExpr { terms: vec![(var, coeff)], constant: 0.0 }
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Evaluates the expression against a variable assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(var, coeff)| coeff * values[var.0]).sum::<f64>() + self.constant
    }
}

/// Comparison sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Leq,
    Geq,
    Eq,
}

/// `expr <sense> rhs`.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// A complete minimization problem handed to a [`MilpBackend`].
#[derive(Debug, Clone, Default)]
pub struct MilpProblem {
    variables: Vec<(String, VarDomain)>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl MilpProblem {
    pub fn new() -> Self {
        MilpProblem::default()
    }

    pub fn add_variable(&mut self, name: String, domain: VarDomain) -> VarId {
        self.variables.push((name, domain));
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.constraints.push(LinearConstraint { expr, sense, rhs });
    }

    /// Sets the objective to minimize.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[(String, VarDomain)] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

/// Variable assignment returned by a successful solve.
#[derive(Debug, Clone)]
pub struct MilpSolution {
    /// One value per variable, indexed by [`VarId`].
    pub values: Vec<f64>,
    pub objective_value: f64,
}

impl MilpSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }
}

/// A solve that produced no usable assignment: infeasible, unbounded, timed
/// out or a backend fault. Carries the backend's status string.
#[derive(Debug, Clone)]
pub struct SolveFailure {
    pub status: String,
}

/// The external MILP solver seam. Implementations solve to optimality within
/// the given wall-clock budget or report failure; partial solutions are not
/// returned.
pub trait MilpBackend {
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &MilpProblem, time_limit_secs: f64) -> std::result::Result<MilpSolution, SolveFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_evaluation() {
        let mut problem = MilpProblem::new();
        let x = problem.add_variable("x".to_string(), VarDomain::Continuous { lower: 0.0, upper: 10.0 });
        let y = problem.add_variable("y".to_string(), VarDomain::Binary);

        let mut expr = LinearExpr::new();
        expr.add_term(x, 2.0).add_term(y, -1.0).add_constant(3.0);

        assert_eq!(expr.evaluate(&[4.0, 1.0]), 10.0);
        assert_eq!(problem.variable_count(), 2);
    }
}
