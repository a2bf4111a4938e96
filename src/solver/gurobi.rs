use std::collections::HashMap;

use good_lp::IntoAffineExpression;
use grb::expr::LinExpr;
use grb::prelude::*;
use log::{debug, info};

use super::{Solution, Solver, Status};
use crate::error::{Error, Result};
use crate::models::milp::{self, ConstrSense as Sense, ModelSense as Direction, Values};

/// Solves a model with Gurobi.
#[derive(Debug, Clone, Default)]
pub struct GurobiSolver {
    /// Time limit in seconds
    pub time_limit: Option<f64>,
    /// Whether to let Gurobi log to the console
    pub verbose: bool,
}

fn solver_error(err: grb::Error) -> Error {
    Error::Solver {
        status: None,
        message: format!("{:?}", err),
    }
}

impl GurobiSolver {
    pub fn new(time_limit: Option<f64>, verbose: bool) -> GurobiSolver {
        GurobiSolver {
            time_limit,
            verbose,
        }
    }

    /// Replays the model into a Gurobi model
    fn replay(
        &self,
        source: &milp::Model,
    ) -> grb::Result<(Model, HashMap<good_lp::Variable, Var>, Vec<Constr>)> {
        let mut model = Model::new(source.name())?;
        if !self.verbose {
            model.set_param(param::OutputFlag, 0)?;
        }
        if let Some(limit) = self.time_limit {
            model.set_param(param::TimeLimit, limit)?;
        }

        let mut vars = HashMap::with_capacity(source.num_vars());
        for data in source.vars() {
            let vtype = match data.vtype {
                milp::VarType::Binary => VarType::Binary,
                milp::VarType::Continuous => VarType::Continuous,
            };
            let var = model.add_var(&data.name, vtype, 0.0, data.lb, data.ub, std::iter::empty())?;
            vars.insert(data.var, var);
        }
        model.update()?;

        let linear = |expr: &good_lp::Expression| {
            let mut lin = LinExpr::new();
            for (var, coeff) in milp::terms(expr) {
                lin.add_term(coeff, vars[&var]);
            }
            lin.add_constant(expr.constant());
            lin
        };

        let mut constrs = Vec::with_capacity(source.num_constrs());
        for (name, constr) in source.constrs() {
            let sense = match constr.sense {
                Sense::Less => ConstrSense::Less,
                Sense::Greater => ConstrSense::Greater,
                Sense::Equal => ConstrSense::Equal,
            };
            let ineq = grb::constr::IneqExpr {
                lhs: Expr::from(linear(&constr.lhs)),
                sense,
                rhs: Expr::Constant(constr.rhs),
            };
            constrs.push(model.add_constr(name, ineq)?);
        }

        if let Some((expr, direction)) = source.objective() {
            let sense = match direction {
                Direction::Minimize => ModelSense::Minimize,
                Direction::Maximize => ModelSense::Maximize,
            };
            model.set_objective(linear(expr), sense)?;
        }
        model.update()?;

        Ok((model, vars, constrs))
    }

    fn run(&self, source: &milp::Model) -> grb::Result<Solution> {
        let (mut model, vars, constrs) = self.replay(source)?;
        info!("Optimizing {} with Gurobi", source.name());
        model.optimize()?;

        let status = match model.status()? {
            grb::Status::Optimal => Status::Optimal,
            grb::Status::Infeasible => Status::Infeasible,
            grb::Status::Unbounded => Status::Unbounded,
            grb::Status::InfOrUnbd => Status::InfeasibleOrUnbounded,
            grb::Status::TimeLimit => Status::TimeLimit,
            other => Status::Other(other as i32),
        };
        debug!("Gurobi finished with status {}", status);

        match status {
            Status::Optimal => {
                let objective = model.get_attr(attr::ObjVal)?;
                let values = vars
                    .iter()
                    .map(|(handle, var)| Ok((*handle, model.get_obj_attr(attr::X, var)?)))
                    .collect::<grb::Result<Values>>()?;
                Ok(Solution::optimal(objective, values))
            }
            Status::Infeasible => {
                // the infeasibility witness
                model.compute_iis()?;
                let mut solution = Solution::without_values(status);
                for ((name, _), constr) in source.constrs().iter().zip(&constrs) {
                    if model.get_obj_attr(attr::IISConstr, constr)? > 0 {
                        solution.iis.push(name.clone());
                    }
                }
                Ok(solution)
            }
            _ => Ok(Solution::without_values(status)),
        }
    }
}

impl Solver for GurobiSolver {
    fn solve(&mut self, model: &milp::Model) -> Result<Solution> {
        if model.has_pending_changes() {
            return Err(Error::Uncommitted);
        }
        self.run(model).map_err(solver_error)
    }
}
