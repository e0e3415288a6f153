use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, microlp, variable};

use crate::domain::optimizer::lp::{LinearExpr, MilpBackend, MilpProblem, MilpSolution, Sense, SolveFailure, VarDomain};

/// Pure-Rust MILP backend built on `good_lp`'s microlp solver.
///
/// microlp solves synchronously and cannot be interrupted mid-solve, so the
/// time limit is not enforced inside the solver; the solve protocol rejects
/// any solution whose measured wall time overran the budget.
#[derive(Debug, Default)]
pub struct MicrolpBackend;

impl MicrolpBackend {
    pub fn new() -> Self {
        MicrolpBackend
    }

    fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
        let linear: Expression = expr.terms.iter().map(|(var, coeff)| *coeff * handles[var.0]).sum();
        linear + expr.constant
    }
}

impl MilpBackend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &MilpProblem, _time_limit_secs: f64) -> std::result::Result<MilpSolution, SolveFailure> {
        let mut variables = ProblemVariables::new();

        let handles: Vec<Variable> = problem
            .variables()
            .iter()
            .map(|(name, domain)| {
                let definition = match domain {
                    VarDomain::Continuous { lower, upper } => variable().min(*lower).max(*upper),
                    VarDomain::Binary => variable().binary(),
                };

                variables.add(definition.name(name.clone()))
            })
            .collect();

        let objective = Self::to_expression(problem.objective(), &handles);

        let mut model = variables.minimise(objective).using(microlp);

        for linear_constraint in problem.constraints() {
            let lhs = Self::to_expression(&linear_constraint.expr, &handles);
            let rhs = linear_constraint.rhs;

            let built = match linear_constraint.sense {
                Sense::Leq => constraint!(lhs <= rhs),
                Sense::Geq => constraint!(lhs >= rhs),
                Sense::Eq => constraint!(lhs == rhs),
            };

            model = model.with(built);
        }

        match model.solve() {
            Ok(solution) => {
                let values: Vec<f64> = handles.iter().map(|handle| solution.value(*handle)).collect();
                let objective_value = problem.objective().evaluate(&values);

                Ok(MilpSolution { values, objective_value })
            }
            Err(error) => Err(SolveFailure { status: error.to_string() }),
        }
    }
}
