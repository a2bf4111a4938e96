//! The boundary to the external MIP solver.

#[cfg(feature = "gurobi")]
pub mod gurobi;
#[cfg(any(feature = "microlp", feature = "highs", feature = "coin_cbc"))]
pub mod lp;

use derive_more::Display;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::milp::{Model, Values};

/// Termination status reported by a solver
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    InfeasibleOrUnbounded,
    TimeLimit,
    /// Any other solver specific status code
    #[display(fmt = "Other({})", _0)]
    Other(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: Status,
    /// Objective value of the incumbent, if any
    pub objective: Option<f64>,
    /// Variable values, present when optimal
    pub values: Option<Values>,
    /// Names of the constraints in an irreducible infeasible subsystem, when the
    /// solver could compute one
    pub iis: Vec<String>,
}

impl Solution {
    pub fn optimal(objective: f64, values: Values) -> Solution {
        Solution {
            status: Status::Optimal,
            objective: Some(objective),
            values: Some(values),
            iis: Vec::new(),
        }
    }

    pub fn without_values(status: Status) -> Solution {
        Solution {
            status,
            objective: None,
            values: None,
            iis: Vec::new(),
        }
    }

    /// The variable values, or the status as an error when the model was not solved to optimality
    pub fn values(&self) -> Result<&Values> {
        match (&self.status, &self.values) {
            (Status::Optimal, Some(values)) => Ok(values),
            (status, _) => Err(Error::Solver {
                status: Some(*status),
                message: if self.iis.is_empty() {
                    format!("no optimal solution ({})", status)
                } else {
                    format!(
                        "no optimal solution ({}), irreducible subsystem: {}",
                        status,
                        self.iis.join(", ")
                    )
                },
            }),
        }
    }
}

/// A mixed-integer programming solver the committed model is handed to.
pub trait Solver {
    fn solve(&mut self, model: &Model) -> Result<Solution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_optimal_solutions_surface_the_status() {
        let mut solution = Solution::without_values(Status::Infeasible);
        solution.iis = vec!["horizon_demand".to_string()];

        match solution.values() {
            Err(Error::Solver { status, message }) => {
                assert_eq!(status, Some(Status::Infeasible));
                assert!(message.contains("horizon_demand"));
            }
            other => panic!("expected a solver error, got {:?}", other),
        }

        let mut model = Model::new("test");
        let x = model.add_binvar("x");
        let values: Values = [(x, 1.0)].into_iter().collect();
        let solution = Solution::optimal(3.0, values.clone());
        assert_eq!(solution.values(), Ok(&values));
    }
}
