use good_lp::{Expression, Variable};
use log::{debug, info};
use serde::Serialize;
use typed_index_collections::TiVec;

use super::config::{Config, Family, ObjectiveKind, VarSet};
use super::constraints::{BigM, Context};
use super::sets_and_parameters::{Parameters, ProcessIndex, Sets};
use crate::error::{Error, Result};
use crate::models::milp::{Model, ModelSense};
use crate::models::utils::{AddVars, ConvertVars};
use crate::problem::Sizes;
use crate::solver::{Solution, Solver};

/// The decision variables of a planning model. Groups that the configuration does not
/// declare are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variables {
    /// x(i,h): technology h is acquired for process i
    pub x: Vec<Vec<Variable>>,
    /// y(i,h,t): process i runs with technology h in month t
    pub y: Vec<Vec<Vec<Variable>>>,
    /// z(i,t): process i completes in month t
    pub z: Option<Vec<Vec<Variable>>>,
    /// v(i,t): process i starts in month t
    pub v: Option<Vec<Vec<Variable>>>,
    /// q_ag(p,t): water drawn from plant p in month t
    pub q_ag: Option<Vec<Vec<Variable>>>,
    /// q_ag_s: water drawn from the reservoir over the horizon
    pub q_ag_s: Option<Variable>,
    /// start(i,h): the month process i starts with technology h. Declared for the water
    /// network variants, and only constrained when start precedence is enabled
    pub start: Option<Vec<Vec<Variable>>>,
    /// tr(p,m): transport method m moves water from plant p
    pub transport: Option<Vec<Vec<Variable>>>,
    /// w(i): process i is used with any technology
    pub w: Option<TiVec<ProcessIndex, Variable>>,
}

fn declared<'a, T>(vars: &'a Option<T>, family: &'static str, set: VarSet) -> Result<&'a T> {
    vars.as_ref().ok_or(Error::MissingVariables {
        family,
        set: set.name(),
    })
}

impl Variables {
    /// Declares `x`, `y` and every optional group of the configuration, in a fixed order
    pub fn new(model: &mut Model, sizes: &Sizes, config: &Config) -> Variables {
        let (n_ex, n_tec, t_mes) = (sizes.processes, sizes.technologies, sizes.periods);
        let groups = config.variables;

        let x = (n_ex, n_tec).binary(model, "x");
        let y = (n_ex, n_tec, t_mes).binary(model, "y");

        let (z, v) = match groups.completion {
            true => (
                Some((n_ex, t_mes).binary(model, "z")),
                Some((n_ex, t_mes).binary(model, "v")),
            ),
            false => (None, None),
        };

        let (q_ag, q_ag_s, transport) = match groups.water_network {
            true => (
                Some((sizes.plants, t_mes).cont(model, "q_ag")),
                Some(model.add_ctsvar("q_ag_s")),
                Some((sizes.plants, sizes.transports).binary(model, "tr")),
            ),
            false => (None, None, None),
        };

        let start = groups.start.then(|| (n_ex, n_tec).cont(model, "start"));
        let w: Option<TiVec<ProcessIndex, Variable>> =
            groups.selection.then(|| n_ex.binary(model, "w").into());

        Variables {
            x,
            y,
            z,
            v,
            q_ag,
            q_ag_s,
            start,
            transport,
            w,
        }
    }

    pub fn completion(&self, family: &'static str) -> Result<&Vec<Vec<Variable>>> {
        declared(&self.z, family, VarSet::Completion)
    }

    pub fn start_period(&self, family: &'static str) -> Result<&Vec<Vec<Variable>>> {
        declared(&self.v, family, VarSet::Completion)
    }

    pub fn plant_draw(&self, family: &'static str) -> Result<&Vec<Vec<Variable>>> {
        declared(&self.q_ag, family, VarSet::WaterNetwork)
    }

    pub fn reservoir_draw(&self, family: &'static str) -> Result<Variable> {
        declared(&self.q_ag_s, family, VarSet::WaterNetwork).copied()
    }

    pub fn transport(&self, family: &'static str) -> Result<&Vec<Vec<Variable>>> {
        declared(&self.transport, family, VarSet::WaterNetwork)
    }

    pub fn start(&self, family: &'static str) -> Result<&Vec<Vec<Variable>>> {
        declared(&self.start, family, VarSet::Start)
    }

    pub fn selection(&self, family: &'static str) -> Result<&TiVec<ProcessIndex, Variable>> {
        declared(&self.w, family, VarSet::Selection)
    }
}

/// A built planning model: the handle, its variables, the objective to minimize and
/// the number of constraints each family emitted.
#[derive(Debug)]
pub struct Built {
    pub model: Model,
    pub variables: Variables,
    pub objective: Expression,
    pub counts: Vec<(Family, usize)>,
}

impl Built {
    /// Commits the model and sets the objective to be minimized
    pub fn finalize(&mut self) -> Result<()> {
        self.model.commit();
        self.model
            .set_objective(self.objective.clone(), ModelSense::Minimize)
    }

    /// Number of constraints emitted by the given family
    pub fn count(&self, family: Family) -> Option<usize> {
        self.counts
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, n)| *n)
    }
}

pub struct LithiumModel {}

impl LithiumModel {
    /// Builds the planning model for the given sizes, parameters and configuration.
    ///
    /// Everything is validated before the first variable is declared: the sizes, the
    /// configuration, and that the parameters cover every key read by the active
    /// families and the objective.
    pub fn build(sizes: &Sizes, parameters: &Parameters, config: &Config) -> Result<Built> {
        let sets = Sets::new(sizes)?;
        config.validate()?;

        let ctx = Context {
            sets: &sets,
            parameters,
            big_m: BigM::new(sizes, parameters),
        };
        for family in &config.families {
            family.strategy().check(&ctx)?;
        }
        check_objective(config.objective, &ctx)?;

        info!("Building {} model for {:?}", config.variant, sizes);
        let mut model = Model::new(&format!("lithium_{}", config.variant));

        //*************CREATE VARIABLES*************//
        let variables = Variables::new(&mut model, sizes, config);
        model.commit();

        // ******************** ADD CONSTRAINTS ********************
        let mut counts = Vec::with_capacity(config.families.len());
        for family in &config.families {
            let before = model.num_constrs();
            family.strategy().emit(&ctx, &variables, &mut model)?;
            let emitted = model.num_constrs() - before;
            debug!("{}: {} constraints", family.name(), emitted);
            counts.push((*family, emitted));
        }

        // ******************** OBJECTIVE ********************
        let objective = objective(config.objective, &ctx, &variables)?;

        info!(
            "Successfully built {} model with {} variables ({} binary) and {} constraints",
            config.variant,
            model.num_vars(),
            model.num_binary(),
            model.num_constrs()
        );

        Ok(Built {
            model,
            variables,
            objective,
            counts,
        })
    }

    /// Builds, finalizes and solves the model, returning the values of the variables
    pub fn solve<S: Solver>(
        solver: &mut S,
        sizes: &Sizes,
        parameters: &Parameters,
        config: &Config,
    ) -> Result<(Built, Solution)> {
        let mut built = LithiumModel::build(sizes, parameters, config)?;
        built.finalize()?;
        let solution = solver.solve(&built.model)?;
        Ok((built, solution))
    }
}

fn check_objective(kind: ObjectiveKind, ctx: &Context) -> Result<()> {
    let (sets, p) = (ctx.sets, ctx.parameters);
    match kind {
        ObjectiveKind::NetWater => {
            p.period_water_use.require(sets.process_tech_period())?;
            p.period_water_return.require(sets.process_tech_period())
        }
        ObjectiveKind::TotalCost => {
            p.plant_cost.require(sets.P.iter().copied())?;
            p.transport_cost.require(sets.plant_transport())?;
            p.acquisition_cost.require(sets.process_tech())?;
            p.usage_cost.require(sets.process_tech_period())
        }
    }
}

fn objective(kind: ObjectiveKind, ctx: &Context, vars: &Variables) -> Result<Expression> {
    let (sets, p) = (ctx.sets, ctx.parameters);
    let mut obj = Expression::from(0.0);
    match kind {
        ObjectiveKind::NetWater => {
            for (i, h, t) in sets.process_tech_period() {
                let net = p.period_water_use.get((i, h, t))? - p.period_water_return.get((i, h, t))?;
                obj += net * vars.y[*i][*h][*t];
            }
        }
        ObjectiveKind::TotalCost => {
            let q_ag = vars.plant_draw("objective")?;
            let transport = vars.transport("objective")?;

            for (pl, t) in sets.plant_period() {
                obj += p.plant_cost.get(pl)? * q_ag[*pl][*t];
            }
            for (pl, m) in sets.plant_transport() {
                obj += p.transport_cost.get((pl, m))? * transport[*pl][*m];
            }
            for (i, h) in sets.process_tech() {
                obj += p.acquisition_cost.get((i, h))? * vars.x[*i][*h];
            }
            for (i, h, t) in sets.process_tech_period() {
                obj += p.usage_cost.get((i, h, t))? * vars.y[*i][*h][*t];
            }
        }
    }
    Ok(obj)
}

/// The values of the decision variables in an optimal solution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LithiumResults {
    pub objective: f64,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<Vec<f64>>>,
    pub z: Option<Vec<Vec<f64>>>,
    pub v: Option<Vec<Vec<f64>>>,
    pub q_ag: Option<Vec<Vec<f64>>>,
    pub q_ag_s: Option<f64>,
    pub start: Option<Vec<Vec<f64>>>,
    pub transport: Option<Vec<Vec<f64>>>,
    pub w: Option<Vec<f64>>,
}

impl LithiumResults {
    /// Reads the values of every variable of the built model. Fails when the solution
    /// is not optimal, or when it lacks a value for any variable of the model.
    pub fn new(built: &Built, solution: &Solution) -> Result<LithiumResults> {
        let values = solution.values()?;
        let missing = built
            .model
            .vars()
            .iter()
            .filter(|data| !values.contains_key(&data.var))
            .count();
        if missing > 0 {
            return Err(Error::Solver {
                status: Some(solution.status),
                message: format!(
                    "the solution has no value for {} of the {} variables",
                    missing,
                    built.model.num_vars()
                ),
            });
        }

        let variables = &built.variables;
        Ok(LithiumResults {
            objective: solution.objective.unwrap_or_default(),
            x: variables.x.convert(values),
            y: variables.y.convert(values),
            z: variables.z.convert(values),
            v: variables.v.convert(values),
            q_ag: variables.q_ag.convert(values),
            q_ag_s: variables.q_ag_s.convert(values),
            start: variables.start.convert(values),
            transport: variables.transport.convert(values),
            w: variables.w.convert(values),
        })
    }
}
