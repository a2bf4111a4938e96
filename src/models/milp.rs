//! The planning model as a record of named constraints over `good_lp` expressions.
//!
//! Variables are issued by a `good_lp::ProblemVariables`, so every [`Variable`] handle is
//! valid in the `good_lp` problem built from the model. Constraints keep their names,
//! which lets a built model be inspected, checked against an assignment and replayed
//! into any backend (see [`crate::solver`]).

use std::collections::HashMap;
use std::fmt;

use good_lp::{variable, Expression, IntoAffineExpression, ProblemVariables, Variable, VariableDefinition};
use serde::Serialize;

use crate::error::{Error, Result};

/// Tolerance used when checking constraints against an assignment
pub const FEASIBILITY_TOL: f64 = 1e-6;

/// Values of the variables of a model, as returned by a solver
pub type Values = HashMap<Variable, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarType {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarData {
    pub var: Variable,
    pub name: String,
    pub vtype: VarType,
    pub lb: f64,
    pub ub: f64,
}

impl VarData {
    /// How the variable is declared in a `good_lp` problem
    pub fn definition(&self) -> VariableDefinition {
        definition(&self.name, self.vtype, self.lb, self.ub)
    }
}

fn definition(name: &str, vtype: VarType, lb: f64, ub: f64) -> VariableDefinition {
    let declared = variable().name(name);
    match vtype {
        VarType::Binary => declared.binary(),
        VarType::Continuous if ub.is_finite() => declared.min(lb).max(ub),
        VarType::Continuous => declared.min(lb),
    }
}

/// The linear terms of an expression, in no particular order
pub fn terms(expr: &Expression) -> Vec<(Variable, f64)> {
    expr.clone().linear_coefficients().collect()
}

/// Coefficient of `var` in `expr`, zero when it does not appear
pub fn coefficient(expr: &Expression, var: Variable) -> f64 {
    expr.clone()
        .linear_coefficients()
        .filter(|(v, _)| *v == var)
        .map(|(_, coeff)| coeff)
        .sum()
}

/// Value of the expression, reading missing variables as zero
pub fn evaluate(expr: &Expression, values: &Values) -> f64 {
    let constant = expr.constant();
    expr.clone()
        .linear_coefficients()
        .map(|(var, coeff)| coeff * values.get(&var).copied().unwrap_or_default())
        .sum::<f64>()
        + constant
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstrSense {
    Less,
    Greater,
    Equal,
}

/// A linear constraint `lhs sense rhs`, with every variable on the left and the
/// constant on the right.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub lhs: Expression,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(lhs: impl Into<Expression>, sense: ConstrSense, rhs: impl Into<Expression>) -> Constraint {
        let difference = lhs.into() - rhs.into();
        let rhs = -difference.constant();
        Constraint {
            lhs: difference + rhs,
            sense,
            rhs,
        }
    }

    pub fn coefficient(&self, var: Variable) -> f64 {
        coefficient(&self.lhs, var)
    }

    /// Number of variables in the left-hand side
    pub fn len(&self) -> usize {
        self.lhs.clone().linear_coefficients().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_satisfied(&self, values: &Values) -> bool {
        let lhs = evaluate(&self.lhs, values);
        match self.sense {
            ConstrSense::Less => lhs <= self.rhs + FEASIBILITY_TOL,
            ConstrSense::Greater => lhs >= self.rhs - FEASIBILITY_TOL,
            ConstrSense::Equal => (lhs - self.rhs).abs() <= FEASIBILITY_TOL,
        }
    }

    /// The constraint as `good_lp` hands it to a solver
    pub fn to_good_lp(&self) -> good_lp::Constraint {
        let lhs = self.lhs.clone();
        match self.sense {
            ConstrSense::Less => lhs.leq(self.rhs),
            ConstrSense::Greater => lhs.geq(self.rhs),
            ConstrSense::Equal => lhs.eq(self.rhs),
        }
    }
}

pub fn leq(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Constraint {
    Constraint::new(lhs, ConstrSense::Less, rhs)
}

pub fn geq(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Constraint {
    Constraint::new(lhs, ConstrSense::Greater, rhs)
}

pub fn equals(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Constraint {
    Constraint::new(lhs, ConstrSense::Equal, rhs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelSense {
    Minimize,
    Maximize,
}

/// Variables and named constraints of a mixed-integer program.
///
/// Variables and constraints are pending until [`Model::commit`] is called, and the
/// objective can only be set on a committed model.
pub struct Model {
    name: String,
    problem: ProblemVariables,
    vars: Vec<VarData>,
    positions: HashMap<Variable, usize>,
    constrs: Vec<(String, Constraint)>,
    objective: Option<(Expression, ModelSense)>,
    committed_vars: usize,
    committed_constrs: usize,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("vars", &self.vars.len())
            .field("constrs", &self.constrs.len())
            .field("objective", &self.objective.is_some())
            .finish()
    }
}

impl Model {
    pub fn new(name: &str) -> Model {
        Model {
            name: name.to_string(),
            problem: ProblemVariables::new(),
            vars: Vec::new(),
            positions: HashMap::new(),
            constrs: Vec::new(),
            objective: None,
            committed_vars: 0,
            committed_constrs: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_var(&mut self, name: &str, vtype: VarType, lb: f64, ub: f64) -> Variable {
        let (lb, ub) = match vtype {
            VarType::Binary => (0.0, 1.0),
            VarType::Continuous => (lb, ub),
        };
        let var = self.problem.add(definition(name, vtype, lb, ub));
        self.positions.insert(var, self.vars.len());
        self.vars.push(VarData {
            var,
            name: name.to_string(),
            vtype,
            lb,
            ub,
        });
        var
    }

    pub fn add_binvar(&mut self, name: &str) -> Variable {
        self.add_var(name, VarType::Binary, 0.0, 1.0)
    }

    /// A continuous non-negative variable
    pub fn add_ctsvar(&mut self, name: &str) -> Variable {
        self.add_var(name, VarType::Continuous, 0.0, f64::INFINITY)
    }

    pub fn add_constr(&mut self, name: &str, constr: Constraint) {
        self.constrs.push((name.to_string(), constr));
    }

    /// Integrates every pending variable and constraint into the model
    pub fn commit(&mut self) {
        self.committed_vars = self.vars.len();
        self.committed_constrs = self.constrs.len();
    }

    pub fn has_pending_changes(&self) -> bool {
        self.committed_vars != self.vars.len() || self.committed_constrs != self.constrs.len()
    }

    pub fn set_objective(&mut self, expr: impl Into<Expression>, sense: ModelSense) -> Result<()> {
        if self.has_pending_changes() {
            return Err(Error::Uncommitted);
        }
        self.objective = Some((expr.into(), sense));
        Ok(())
    }

    pub fn objective(&self) -> Option<&(Expression, ModelSense)> {
        self.objective.as_ref()
    }

    pub fn vars(&self) -> &[VarData] {
        &self.vars
    }

    /// Panics if the variable was not created by this model
    pub fn var(&self, var: Variable) -> &VarData {
        &self.vars[self.positions[&var]]
    }

    pub fn contains(&self, var: Variable) -> bool {
        self.positions.contains_key(&var)
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_binary(&self) -> usize {
        self.vars
            .iter()
            .filter(|v| v.vtype == VarType::Binary)
            .count()
    }

    pub fn constrs(&self) -> &[(String, Constraint)] {
        &self.constrs
    }

    pub fn num_constrs(&self) -> usize {
        self.constrs.len()
    }

    pub fn constr_by_name(&self, name: &str) -> Option<&Constraint> {
        self.constrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn constrs_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a (String, Constraint)> + 'a {
        self.constrs.iter().filter(move |(n, _)| n.starts_with(prefix))
    }

    /// A fresh `good_lp` problem declaring the variables of the model in order, so the
    /// handles of the model are valid in it
    pub fn problem(&self) -> ProblemVariables {
        let mut problem = ProblemVariables::new();
        for data in &self.vars {
            problem.add(data.definition());
        }
        problem
    }

    /// The terms of an expression by variable name, sorted by name
    pub fn named_terms(&self, expr: &Expression) -> Vec<(&str, f64)> {
        let mut named = terms(expr)
            .into_iter()
            .map(|(var, coeff)| (self.var(var).name.as_str(), coeff))
            .collect::<Vec<_>>();
        named.sort_by(|a, b| a.0.cmp(b.0));
        named
    }

    /// Names of the constraints the assignment violates
    pub fn violated(&self, values: &Values) -> Vec<&str> {
        self.constrs
            .iter()
            .filter(|(_, c)| !c.is_satisfied(values))
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(Variable, f64)]) -> Values {
        pairs.iter().copied().collect()
    }

    #[test]
    fn constraint_moves_variables_left_and_constants_right() {
        let mut model = Model::new("test");
        let x = model.add_binvar("x");
        let y = model.add_binvar("y");

        // x <= M (1 - y) with M = 10
        let constr = leq(x, 10.0 - 10.0 * y);

        assert_eq!(constr.coefficient(x), 1.0);
        assert_eq!(constr.coefficient(y), 10.0);
        assert_eq!(constr.len(), 2);
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(constr.rhs, 10.0);
        assert!(constr.is_satisfied(&values(&[(x, 1.0)])));
        assert!(!constr.is_satisfied(&values(&[(x, 1.0), (y, 1.0)])));
    }

    #[test]
    fn objective_requires_commit() {
        let mut model = Model::new("test");
        let x = model.add_ctsvar("x");
        assert_eq!(
            model.set_objective(2.0 * x, ModelSense::Minimize),
            Err(Error::Uncommitted)
        );

        model.commit();
        assert!(model.set_objective(2.0 * x, ModelSense::Minimize).is_ok());

        model.add_constr("c", geq(x, 1.0));
        assert!(model.has_pending_changes());
        assert_eq!(
            model.set_objective(x, ModelSense::Minimize),
            Err(Error::Uncommitted)
        );
    }

    #[test]
    fn replayed_problems_share_the_handles() {
        let mut model = Model::new("test");
        let x = model.add_binvar("x");
        let q = model.add_var("q", VarType::Continuous, 1.0, 4.0);

        let mut problem = model.problem();
        assert_eq!(model.var(q).name, "q");
        assert_eq!((model.var(q).lb, model.var(q).ub), (1.0, 4.0));
        // the next handle follows the replayed ones
        let extra = problem.add(variable());
        assert!(!model.contains(extra));
        assert!(model.contains(x));
    }

    #[test]
    fn names_order_the_terms() {
        let mut model = Model::new("test");
        let b = model.add_binvar("b");
        let a = model.add_binvar("a");
        let expr = 2.0 * b + 3.0 * a - 1.0;
        assert_eq!(model.named_terms(&expr), vec![("a", 3.0), ("b", 2.0)]);
        assert_eq!(evaluate(&expr, &values(&[(a, 1.0), (b, 1.0)])), 4.0);
    }
}
