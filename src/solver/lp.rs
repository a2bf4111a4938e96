//! Solves a model with the `good_lp` backend selected by the crate features
//! (`microlp` by default, `highs` or `coin_cbc`).

use good_lp::{default_solver, Expression, ResolutionError, Solution as _, SolverModel};
use log::{debug, info};

use super::{Solution, Solver, Status};
use crate::error::{Error, Result};
use crate::models::milp::{evaluate, Model, ModelSense, Values};

#[derive(Debug, Clone, Copy, Default)]
pub struct LpSolver;

impl LpSolver {
    pub fn new() -> LpSolver {
        LpSolver
    }
}

impl Solver for LpSolver {
    fn solve(&mut self, model: &Model) -> Result<Solution> {
        if model.has_pending_changes() {
            return Err(Error::Uncommitted);
        }
        let (objective, sense) = match model.objective() {
            Some((expr, sense)) => (expr.clone(), *sense),
            None => (Expression::from(0.0), ModelSense::Minimize),
        };

        let variables = model.problem();
        let unsolved = match sense {
            ModelSense::Minimize => variables.minimise(objective.clone()),
            ModelSense::Maximize => variables.maximise(objective.clone()),
        };
        let mut problem = unsolved.using(default_solver);
        for (_, constr) in model.constrs() {
            problem = problem.with(constr.to_good_lp());
        }

        info!(
            "Optimizing {} with {} variables and {} constraints",
            model.name(),
            model.num_vars(),
            model.num_constrs()
        );
        match problem.solve() {
            Ok(solved) => {
                let values: Values = model
                    .vars()
                    .iter()
                    .map(|data| (data.var, solved.value(data.var)))
                    .collect();
                let objective = evaluate(&objective, &values);
                debug!("Optimal objective {}", objective);
                Ok(Solution::optimal(objective, values))
            }
            Err(ResolutionError::Infeasible) => Ok(Solution::without_values(Status::Infeasible)),
            Err(ResolutionError::Unbounded) => Ok(Solution::without_values(Status::Unbounded)),
            Err(err) => Err(Error::Solver {
                status: None,
                message: err.to_string(),
            }),
        }
    }
}
