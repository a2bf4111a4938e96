//! The constraint families of the planning model.
//!
//! Every family is a unit struct implementing [`ConstraintFamily`]. A variant is a
//! list of families (see [`Config`](super::config::Config)); the builder first asks
//! each family to `check` that the parameters cover every key it reads, and only
//! then declares variables and lets the families `emit` their constraints.

use good_lp::Expression;
use itertools::iproduct;
use log::{trace, warn};

use super::config::VarSet;
use super::model::Variables;
use super::sets_and_parameters::{scalar, Parameters, Sets};
use crate::error::Result;
use crate::models::milp::{equals, geq, leq, Model};
use crate::problem::Sizes;

/// Big-M constants derived from the instance size instead of fixed literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigM {
    /// `n_ex * n_tec * t_mes`: the number of `y` variables, so it bounds every sum of
    /// `y` that a big-M constraint switches off (activation and process ordering)
    pub activation: f64,
    /// `t_mes + max duration`: start periods lie in `[0, t_mes]` and a precedence gap
    /// never exceeds the longest duration
    pub precedence: f64,
}

impl BigM {
    pub fn new(sizes: &Sizes, parameters: &Parameters) -> BigM {
        let big_m = BigM {
            activation: (sizes.processes * sizes.technologies * sizes.periods) as f64,
            precedence: sizes.periods as f64 + parameters.max_duration(),
        };
        trace!("{:?}", big_m);
        big_m
    }
}

/// What a family needs to check and emit its constraints
pub struct Context<'a> {
    pub sets: &'a Sets,
    pub parameters: &'a Parameters,
    pub big_m: BigM,
}

pub trait ConstraintFamily {
    /// Prefix of the names of the emitted constraints
    fn name(&self) -> &'static str;

    /// The optional variable groups the family is written over
    fn variables(&self) -> &'static [VarSet] {
        &[]
    }

    /// Checks that the parameters cover every key the family reads
    fn check(&self, ctx: &Context) -> Result<()>;

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()>;
}

// ******************** V1 ********************

/// R1: revenue from produced lithium minus acquisition and usage costs keeps the margin, every month
pub struct ProfitFloor;

impl ConstraintFamily for ProfitFloor {
    fn name(&self) -> &'static str {
        "profit_floor"
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        p.process_yield.require(sets.I.iter().copied())?;
        p.price.require(sets.T.iter().copied())?;
        p.usage_cost.require(sets.process_tech_period())?;
        p.acquisition_cost.require(sets.process_tech())?;
        scalar(p.margin, "margin")?;
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let margin = scalar(p.margin, "margin")?;
        for t in &sets.T {
            let mut lhs = Expression::from(0.0);
            for (i, h) in sets.process_tech() {
                let revenue = p.process_yield.get(i)? * p.price.get(*t)?;
                let usage = p.usage_cost.get((i, h, *t))?;
                lhs += (revenue - usage) * vars.y[*i][*h][**t];
                lhs -= p.acquisition_cost.get((i, h))? * vars.x[*i][*h];
            }
            model.add_constr(&format!("profit_floor_{t}"), geq(lhs, margin));
        }
        Ok(())
    }
}

/// R2: the lithium produced in a month covers the demand of that month whenever a process completes
pub struct PeriodDemand;

impl ConstraintFamily for PeriodDemand {
    fn name(&self) -> &'static str {
        "period_demand"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::Completion]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        p.process_yield.require(sets.I.iter().copied())?;
        p.period_demand.require(sets.T.iter().copied())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let z = vars.completion(self.name())?;
        for t in &sets.T {
            let mut produced = Expression::from(0.0);
            for (i, h) in sets.process_tech() {
                produced += p.process_yield.get(i)? * vars.y[*i][*h][**t];
            }
            let completed = sets.I.iter().map(|k| z[**k][**t]).sum::<Expression>();
            let demand = p.period_demand.get(*t)? * completed;
            model.add_constr(&format!("period_demand_{t}"), geq(produced, demand));
        }
        Ok(())
    }
}

/// R3: the environmental footprint of a month stays below the monthly limit
pub struct PeriodFootprint;

impl ConstraintFamily for PeriodFootprint {
    fn name(&self) -> &'static str {
        "period_footprint"
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        p.footprint.require(sets.process_tech())?;
        scalar(p.period_footprint_limit, "period_footprint_limit")?;
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let limit = scalar(p.period_footprint_limit, "period_footprint_limit")?;
        for t in &sets.T {
            let mut lhs = Expression::from(0.0);
            for (i, h) in sets.process_tech() {
                lhs += p.footprint.get((i, h))? * vars.y[*i][*h][**t];
            }
            model.add_constr(&format!("period_footprint_{t}"), leq(lhs, limit));
        }
        Ok(())
    }
}

/// R4 (V1) / R7 (V2, V3): at most one technology per process in every month
pub struct OneTechnologyPerPeriod;

impl ConstraintFamily for OneTechnologyPerPeriod {
    fn name(&self) -> &'static str {
        "one_technology"
    }

    fn check(&self, _: &Context) -> Result<()> {
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let sets = ctx.sets;
        for (i, t) in iproduct!(&sets.I, &sets.T) {
            let lhs = sets.H.iter().map(|h| vars.y[**i][**h][**t]).sum::<Expression>();
            model.add_constr(&format!("one_technology_{i}_{t}"), leq(lhs, 1.0));
        }
        Ok(())
    }
}

/// R5: the months spent completing iterations of a process fit in the horizon
pub struct DurationBudget;

impl ConstraintFamily for DurationBudget {
    fn name(&self) -> &'static str {
        "duration_budget"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::Completion]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        ctx.parameters
            .process_duration
            .require(ctx.sets.I.iter().copied())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let z = vars.completion(self.name())?;
        let horizon = sets.horizon() as f64;
        for i in &sets.I {
            let a = p.process_duration.get(*i)?;
            let lhs = sets.T.iter().map(|t| a * z[**i][**t]).sum::<Expression>();
            model.add_constr(&format!("duration_budget_{i}"), leq(lhs, horizon));
        }
        Ok(())
    }
}

/// R6: a lower indexed process may not use technology h in month t+1 while a higher
/// indexed process uses it in month t
pub struct ProcessOrdering;

impl ConstraintFamily for ProcessOrdering {
    fn name(&self) -> &'static str {
        "process_ordering"
    }

    fn check(&self, _: &Context) -> Result<()> {
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let sets = ctx.sets;
        let big_m = ctx.big_m.activation;
        let y = &vars.y;
        for (t, h, i, k) in iproduct!(&sets.T[..sets.horizon() - 1], &sets.H, &sets.I, &sets.I) {
            if i >= k {
                continue;
            }
            let rhs = big_m - big_m * y[**k][**h][**t];
            model.add_constr(
                &format!("process_ordering_{t}_{h}_{i}_{k}"),
                leq(y[**i][**h][**t + 1], rhs),
            );
        }
        Ok(())
    }
}

/// R7: using a technology in any month requires acquiring it
pub struct Activation;

impl ConstraintFamily for Activation {
    fn name(&self) -> &'static str {
        "activation"
    }

    fn check(&self, _: &Context) -> Result<()> {
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let sets = ctx.sets;
        for (i, h) in sets.process_tech() {
            let used = sets.T.iter().map(|t| vars.y[*i][*h][**t]).sum::<Expression>();
            let rhs = ctx.big_m.activation * vars.x[*i][*h];
            model.add_constr(&format!("activation_{i}_{h}"), leq(used, rhs));
        }
        Ok(())
    }
}

/// R8: a process that starts in month t completes `duration` months later
pub struct DurationOffset;

impl ConstraintFamily for DurationOffset {
    fn name(&self) -> &'static str {
        "duration_offset"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::Completion]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        ctx.parameters
            .process_duration
            .require(ctx.sets.I.iter().copied())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let z = vars.completion(self.name())?;
        let v = vars.start_period(self.name())?;
        for (i, t) in iproduct!(&sets.I, &sets.T) {
            let a = p.process_duration.get(*i)? as usize;
            let end = **t + a;
            if end < sets.horizon() {
                model.add_constr(
                    &format!("duration_offset_{i}_{t}"),
                    equals(v[**i][**t], z[**i][end]),
                );
            }
        }
        Ok(())
    }
}

// ******************** V2 ********************

/// R1: the water drawn from a plant in a month is within its capacity
pub struct PlantCapacity;

impl ConstraintFamily for PlantCapacity {
    fn name(&self) -> &'static str {
        "plant_capacity"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::WaterNetwork]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        ctx.parameters
            .plant_capacity
            .require(ctx.sets.P.iter().copied())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let q_ag = vars.plant_draw(self.name())?;
        for (pl, t) in sets.plant_period() {
            let capacity = p.plant_capacity.get(pl)?;
            model.add_constr(
                &format!("plant_capacity_{pl}_{t}"),
                leq(q_ag[*pl][*t], capacity),
            );
        }
        Ok(())
    }
}

/// R2: the reservoir can give back at most the water the processes returned over the horizon
pub struct ReservoirBalance;

impl ConstraintFamily for ReservoirBalance {
    fn name(&self) -> &'static str {
        "reservoir_balance"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::WaterNetwork]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        ctx.parameters
            .water_return
            .require(ctx.sets.process_tech())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let q_ag_s = vars.reservoir_draw(self.name())?;
        let mut returned = Expression::from(0.0);
        for (i, h, t) in sets.process_tech_period() {
            returned += p.water_return.get((i, h))? * vars.y[*i][*h][*t];
        }
        model.add_constr("reservoir_balance", leq(q_ag_s, returned));
        Ok(())
    }
}

/// R3: the environmental footprint over the horizon stays below the limit
pub struct HorizonFootprint;

impl ConstraintFamily for HorizonFootprint {
    fn name(&self) -> &'static str {
        "horizon_footprint"
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let p = ctx.parameters;
        p.footprint.require(ctx.sets.process_tech())?;
        scalar(p.footprint_limit, "footprint_limit")?;
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let mut lhs = Expression::from(0.0);
        for (i, h, t) in sets.process_tech_period() {
            lhs += p.footprint.get((i, h))? * vars.y[*i][*h][*t];
        }
        let limit = scalar(p.footprint_limit, "footprint_limit")?;
        model.add_constr("horizon_footprint", leq(lhs, limit));
        Ok(())
    }
}

/// R4: the lithium produced over the horizon covers the total demand
pub struct HorizonDemand;

impl ConstraintFamily for HorizonDemand {
    fn name(&self) -> &'static str {
        "horizon_demand"
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let p = ctx.parameters;
        p.yield_.require(ctx.sets.process_tech())?;
        scalar(p.demand, "demand")?;
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let mut produced = Expression::from(0.0);
        for (i, h, t) in sets.process_tech_period() {
            produced += p.yield_.get((i, h))? * vars.y[*i][*h][*t];
        }
        let demand = scalar(p.demand, "demand")?;
        model.add_constr("horizon_demand", geq(produced, demand));
        Ok(())
    }
}

/// R5: plants and reservoir supply at least the water the active processes use
pub struct WaterSupply;

impl ConstraintFamily for WaterSupply {
    fn name(&self) -> &'static str {
        "water_supply"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::WaterNetwork]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        ctx.parameters.water_use.require(ctx.sets.process_tech())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let q_ag = vars.plant_draw(self.name())?;
        let q_ag_s = vars.reservoir_draw(self.name())?;

        let supplied = sets
            .plant_period()
            .map(|(pl, t)| q_ag[*pl][*t])
            .sum::<Expression>()
            + q_ag_s;
        let mut required = Expression::from(0.0);
        for (i, h, t) in sets.process_tech_period() {
            required += p.water_use.get((i, h))? * vars.y[*i][*h][*t];
        }
        model.add_constr("water_supply", geq(supplied, required));
        Ok(())
    }
}

/// R6: water can only leave a plant if a transport method is chosen for it
pub struct TransportLink;

impl ConstraintFamily for TransportLink {
    fn name(&self) -> &'static str {
        "transport_link"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::WaterNetwork]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        ctx.parameters
            .plant_capacity
            .require(ctx.sets.P.iter().copied())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let q_ag = vars.plant_draw(self.name())?;
        let transport = vars.transport(self.name())?;
        let horizon = sets.horizon() as f64;
        for pl in &sets.P {
            // the most a plant can deliver over the horizon
            let bound = p.plant_capacity.get(*pl)? * horizon;
            let drawn = sets.T.iter().map(|t| q_ag[**pl][**t]).sum::<Expression>();
            let chosen = sets.M.iter().map(|m| transport[**pl][**m]).sum::<Expression>();
            model.add_constr(&format!("transport_link_{pl}"), leq(drawn, bound * chosen));
        }
        Ok(())
    }
}

/// R8: only one process and technology may be active in any month
pub struct OneProcessPerPeriod;

impl ConstraintFamily for OneProcessPerPeriod {
    fn name(&self) -> &'static str {
        "one_process"
    }

    fn check(&self, _: &Context) -> Result<()> {
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let sets = ctx.sets;
        for t in &sets.T {
            let lhs = sets
                .process_tech()
                .map(|(i, h)| vars.y[*i][*h][**t])
                .sum::<Expression>();
            model.add_constr(&format!("one_process_{t}"), leq(lhs, 1.0));
        }
        Ok(())
    }
}

/// R9: a technology is acquired if and only if it is used in some month
pub struct TwoSidedActivation;

impl ConstraintFamily for TwoSidedActivation {
    fn name(&self) -> &'static str {
        "two_sided_activation"
    }

    fn check(&self, _: &Context) -> Result<()> {
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let sets = ctx.sets;
        for (i, h) in sets.process_tech() {
            let used = sets.T.iter().map(|t| vars.y[*i][*h][**t]).sum::<Expression>();
            let x = vars.x[*i][*h];
            model.add_constr(
                &format!("activation_upper_{i}_{h}"),
                leq(used.clone(), ctx.big_m.activation * x),
            );
            model.add_constr(&format!("activation_lower_{i}_{h}"), leq(x, used));
        }
        Ok(())
    }
}

/// Optional: a process that must precede another finishes before the other starts,
/// when both are acquired. The start of an acquired technology is pinned to the first
/// month it is used.
pub struct StartPrecedence;

impl ConstraintFamily for StartPrecedence {
    fn name(&self) -> &'static str {
        "start_precedence"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::Start]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        p.order.require(sets.process_pairs())?;
        p.duration.require(sets.process_tech())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let start = vars.start(self.name())?;
        let big_m = ctx.big_m.precedence;

        for (i, j) in sets.process_pairs() {
            if i == j || p.order.get((i, j))? < 0.5 {
                continue;
            }
            for (h, k) in iproduct!(&sets.H, &sets.H) {
                let a = p.duration.get((i, *h))?;
                let lhs = start[*j][**k] - start[*i][**h]
                    - big_m * vars.x[*i][**h]
                    - big_m * vars.x[*j][**k];
                model.add_constr(
                    &format!("start_precedence_{i}_{h}_{j}_{k}"),
                    geq(lhs, a - 2.0 * big_m),
                );
            }
        }

        // an acquired technology starts in the first month it runs
        for (i, h, t) in sets.process_tech_period() {
            let y = &vars.y[*i][*h];
            let period = *t as f64;
            // no later than any month it runs in
            model.add_constr(
                &format!("start_upper_{i}_{h}_{t}"),
                leq(start[*i][*h] + big_m * y[*t], period + big_m),
            );
            // no earlier than t unless it ran before t
            let earlier = y[..*t].iter().copied().sum::<Expression>();
            model.add_constr(
                &format!("start_lower_{i}_{h}_{t}"),
                geq(
                    start[*i][*h] + big_m * earlier,
                    big_m * vars.x[*i][*h] + (period - big_m),
                ),
            );
        }
        Ok(())
    }
}

// ******************** V3 ********************

/// R10: in every month the plants supply the water used and returned by the active processes
pub struct MassBalance;

impl ConstraintFamily for MassBalance {
    fn name(&self) -> &'static str {
        "mass_balance"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::WaterNetwork]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        p.water_use.require(sets.process_tech())?;
        p.water_return.require(sets.process_tech())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let (sets, p) = (ctx.sets, ctx.parameters);
        let q_ag = vars.plant_draw(self.name())?;
        for t in &sets.T {
            let sourced = sets.P.iter().map(|pl| q_ag[**pl][**t]).sum::<Expression>();
            let mut outflow = Expression::from(0.0);
            for (i, h) in sets.process_tech() {
                let water = p.water_use.get((i, h))? + p.water_return.get((i, h))?;
                outflow += water * vars.y[*i][*h][**t];
            }
            model.add_constr(&format!("mass_balance_{t}"), geq(sourced, outflow));
        }
        Ok(())
    }
}

/// R11: at least two processes are used, and a process is used exactly when one of its
/// technologies is acquired
pub struct ProcessSelection;

/// Fewest processes a plan must use
pub const MIN_PROCESSES: f64 = 2.0;

impl ConstraintFamily for ProcessSelection {
    fn name(&self) -> &'static str {
        "process_selection"
    }

    fn variables(&self) -> &'static [VarSet] {
        &[VarSet::Selection]
    }

    fn check(&self, ctx: &Context) -> Result<()> {
        if (ctx.sets.I.len() as f64) < MIN_PROCESSES {
            warn!(
                "Only {} process(es), the process selection constraint makes the model infeasible",
                ctx.sets.I.len()
            );
        }
        Ok(())
    }

    fn emit(&self, ctx: &Context, vars: &Variables, model: &mut Model) -> Result<()> {
        let sets = ctx.sets;
        let w = vars.selection(self.name())?;

        let selected = w.iter().copied().sum::<Expression>();
        model.add_constr("process_selection", geq(selected, MIN_PROCESSES));

        for i in &sets.I {
            let acquired = sets.H.iter().map(|h| vars.x[**i][**h]).sum::<Expression>();
            model.add_constr(
                &format!("process_used_{i}"),
                equals(w[*i], acquired),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use good_lp::Variable;

    use super::*;
    use crate::error::Error;
    use crate::models::lithium::config::Config;
    use crate::models::lithium::sets_and_parameters::Table;
    use crate::models::lithium::synthesis::synthesize;
    use crate::models::milp::{ConstrSense, Values};
    use crate::problem::Variant;

    struct Emitted {
        sets: Sets,
        parameters: Parameters,
        model: Model,
        vars: Variables,
    }

    fn setup(sizes: Sizes, variant: Variant) -> (Sets, Parameters, Model, Variables) {
        let sets = Sets::new(&sizes).unwrap();
        let parameters = synthesize(&sizes, variant, 9).unwrap();
        let mut model = Model::new("families");
        let vars = Variables::new(&mut model, &sizes, &Config::for_variant(variant));
        (sets, parameters, model, vars)
    }

    /// A model holding only the constraints of `family`
    fn emit(family: &dyn ConstraintFamily, sizes: Sizes, variant: Variant) -> Emitted {
        let (sets, parameters, mut model, vars) = setup(sizes, variant);
        let ctx = Context {
            sets: &sets,
            parameters: &parameters,
            big_m: BigM::new(&sizes, &parameters),
        };
        family.check(&ctx).unwrap();
        family.emit(&ctx, &vars, &mut model).unwrap();
        Emitted {
            sets,
            parameters,
            model,
            vars,
        }
    }

    fn ones(vars: &[Variable]) -> Values {
        vars.iter().map(|var| (*var, 1.0)).collect()
    }

    #[test]
    fn big_m_follows_the_instance() {
        let sizes = Sizes::new(2, 3, 4, 1, 1);
        let mut parameters = synthesize(&sizes, Variant::V2, 1).unwrap();
        for (i, h) in Sets::new(&sizes).unwrap().process_tech() {
            parameters.duration.insert((i, h), 6.0);
        }
        let big_m = BigM::new(&sizes, &parameters);
        assert_eq!(big_m.activation, 24.0);
        assert_eq!(big_m.precedence, 10.0);
    }

    #[test]
    fn profit_floor_weighs_revenue_against_costs() {
        let e = emit(&ProfitFloor, Sizes::new(2, 2, 2, 1, 1), Variant::V1);
        let p = &e.parameters;
        assert_eq!(e.model.num_constrs(), 2);

        let t = e.sets.T[1];
        let constr = e.model.constr_by_name("profit_floor_1").unwrap();
        for (i, h) in e.sets.process_tech() {
            let revenue = p.process_yield.get(i).unwrap() * p.price.get(t).unwrap();
            let usage = p.usage_cost.get((i, h, t)).unwrap();
            assert_eq!(constr.coefficient(e.vars.y[*i][*h][*t]), revenue - usage);
            assert_eq!(constr.coefficient(e.vars.y[*i][*h][0]), 0.0);
            assert_eq!(
                constr.coefficient(e.vars.x[*i][*h]),
                -p.acquisition_cost.get((i, h)).unwrap()
            );
        }
        assert_eq!(constr.sense, ConstrSense::Greater);
        assert_eq!(Some(constr.rhs), p.margin);
    }

    #[test]
    fn period_demand_is_due_when_processes_complete() {
        let e = emit(&PeriodDemand, Sizes::new(2, 1, 2, 1, 1), Variant::V1);
        let p = &e.parameters;
        let z = e.vars.z.as_ref().unwrap();

        let t = e.sets.T[0];
        let constr = e.model.constr_by_name("period_demand_0").unwrap();
        let demand = p.period_demand.get(t).unwrap();
        for i in &e.sets.I {
            let produced = p.process_yield.get(*i).unwrap();
            assert_eq!(constr.coefficient(e.vars.y[**i][0][0]), produced);
            assert_eq!(constr.coefficient(z[**i][0]), -demand);
        }
        assert_eq!(constr.sense, ConstrSense::Greater);
        assert_eq!(constr.rhs, 0.0);

        // nothing completes, nothing is due
        assert!(constr.is_satisfied(&Values::new()));
        assert!(!constr.is_satisfied(&ones(&[z[1][0]])));
    }

    #[test]
    fn period_footprint_is_capped() {
        let e = emit(&PeriodFootprint, Sizes::new(2, 2, 3, 1, 1), Variant::V1);
        let p = &e.parameters;
        assert_eq!(e.model.num_constrs(), 3);

        let constr = e.model.constr_by_name("period_footprint_2").unwrap();
        assert_eq!(constr.len(), 2 * 2);
        for (i, h) in e.sets.process_tech() {
            assert_eq!(
                constr.coefficient(e.vars.y[*i][*h][2]),
                p.footprint.get((i, h)).unwrap()
            );
        }
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(Some(constr.rhs), p.period_footprint_limit);
    }

    #[test]
    fn duration_budget_weighs_completions() {
        let e = emit(&DurationBudget, Sizes::new(2, 1, 4, 1, 1), Variant::V1);
        let z = e.vars.z.as_ref().unwrap();
        assert_eq!(e.model.num_constrs(), 2);

        let constr = e.model.constr_by_name("duration_budget_1").unwrap();
        let a = e.parameters.process_duration.get(e.sets.I[1]).unwrap();
        assert_eq!(constr.len(), 4);
        for t in 0..4 {
            assert_eq!(constr.coefficient(z[1][t]), a);
            assert_eq!(constr.coefficient(z[0][t]), 0.0);
        }
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(constr.rhs, 4.0);
    }

    #[test]
    fn ordering_blocks_a_lower_process_after_a_higher_one() {
        let e = emit(&ProcessOrdering, Sizes::new(2, 1, 3, 1, 1), Variant::V1);
        assert_eq!(e.model.num_constrs(), 2);

        let constr = e.model.constr_by_name("process_ordering_0_0_0_1").unwrap();
        let y = &e.vars.y;
        assert!(constr.is_satisfied(&ones(&[y[1][0][0]])));
        assert!(!constr.is_satisfied(&ones(&[y[1][0][0], y[0][0][1]])));
    }

    #[test]
    fn reservoir_gives_back_what_was_returned() {
        let e = emit(&ReservoirBalance, Sizes::new(2, 1, 2, 1, 1), Variant::V2);
        let q_ag_s = e.vars.q_ag_s.unwrap();

        let constr = e.model.constr_by_name("reservoir_balance").unwrap();
        assert_eq!(constr.coefficient(q_ag_s), 1.0);
        for (i, h, t) in e.sets.process_tech_period() {
            let returned = e.parameters.water_return.get((i, h)).unwrap();
            assert_eq!(constr.coefficient(e.vars.y[*i][*h][*t]), -returned);
        }
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(constr.rhs, 0.0);
    }

    #[test]
    fn horizon_totals_bound_footprint_and_demand() {
        let sizes = Sizes::new(2, 2, 2, 1, 1);
        let e = emit(&HorizonFootprint, sizes, Variant::V2);
        let p = &e.parameters;
        let constr = e.model.constr_by_name("horizon_footprint").unwrap();
        assert_eq!(constr.len(), 2 * 2 * 2);
        for (i, h, t) in e.sets.process_tech_period() {
            assert_eq!(
                constr.coefficient(e.vars.y[*i][*h][*t]),
                p.footprint.get((i, h)).unwrap()
            );
        }
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(Some(constr.rhs), p.footprint_limit);

        let e = emit(&HorizonDemand, sizes, Variant::V2);
        let p = &e.parameters;
        let constr = e.model.constr_by_name("horizon_demand").unwrap();
        for (i, h, t) in e.sets.process_tech_period() {
            assert_eq!(
                constr.coefficient(e.vars.y[*i][*h][*t]),
                p.yield_.get((i, h)).unwrap()
            );
        }
        assert_eq!(constr.sense, ConstrSense::Greater);
        assert_eq!(Some(constr.rhs), p.demand);
        // producing nothing never meets the demand
        assert!(!constr.is_satisfied(&Values::new()));
    }

    #[test]
    fn water_is_supplied_by_plants_and_reservoir() {
        let e = emit(&WaterSupply, Sizes::new(2, 1, 2, 2, 1), Variant::V2);
        let q_ag = e.vars.q_ag.as_ref().unwrap();
        let q_ag_s = e.vars.q_ag_s.unwrap();

        let constr = e.model.constr_by_name("water_supply").unwrap();
        assert_eq!(constr.coefficient(q_ag_s), 1.0);
        for (pl, t) in e.sets.plant_period() {
            assert_eq!(constr.coefficient(q_ag[*pl][*t]), 1.0);
        }
        for (i, h, t) in e.sets.process_tech_period() {
            let used = e.parameters.water_use.get((i, h)).unwrap();
            assert_eq!(constr.coefficient(e.vars.y[*i][*h][*t]), -used);
        }
        assert_eq!(constr.sense, ConstrSense::Greater);
        assert_eq!(constr.rhs, 0.0);
    }

    #[test]
    fn plants_deliver_only_through_a_transport() {
        let e = emit(&TransportLink, Sizes::new(1, 1, 3, 2, 2), Variant::V2);
        let q_ag = e.vars.q_ag.as_ref().unwrap();
        let transport = e.vars.transport.as_ref().unwrap();
        assert_eq!(e.model.num_constrs(), 2);

        let constr = e.model.constr_by_name("transport_link_1").unwrap();
        let bound = e.parameters.plant_capacity.get(e.sets.P[1]).unwrap() * 3.0;
        for t in 0..3 {
            assert_eq!(constr.coefficient(q_ag[1][t]), 1.0);
            assert_eq!(constr.coefficient(q_ag[0][t]), 0.0);
        }
        for m in 0..2 {
            assert_eq!(constr.coefficient(transport[1][m]), -bound);
        }
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(constr.rhs, 0.0);

        let mut values = Values::new();
        values.insert(q_ag[1][0], 1.0);
        assert!(!constr.is_satisfied(&values));
        values.insert(transport[1][1], 1.0);
        assert!(constr.is_satisfied(&values));
    }

    #[test]
    fn one_process_runs_at_a_time() {
        let e = emit(&OneProcessPerPeriod, Sizes::new(2, 2, 2, 1, 1), Variant::V2);
        let y = &e.vars.y;
        assert_eq!(e.model.num_constrs(), 2);

        let constr = e.model.constr_by_name("one_process_1").unwrap();
        assert_eq!(constr.len(), 2 * 2);
        assert_eq!(constr.sense, ConstrSense::Less);
        assert_eq!(constr.rhs, 1.0);

        assert!(constr.is_satisfied(&ones(&[y[1][0][1], y[0][1][0]])));
        assert!(!constr.is_satisfied(&ones(&[y[1][0][1], y[0][1][1]])));
    }

    #[test]
    fn mass_balance_covers_use_and_return() {
        let e = emit(&MassBalance, Sizes::new(2, 2, 2, 2, 1), Variant::V3);
        let p = &e.parameters;
        let q_ag = e.vars.q_ag.as_ref().unwrap();
        assert_eq!(e.model.num_constrs(), 2);

        let constr = e.model.constr_by_name("mass_balance_0").unwrap();
        for pl in 0..2 {
            assert_eq!(constr.coefficient(q_ag[pl][0]), 1.0);
            assert_eq!(constr.coefficient(q_ag[pl][1]), 0.0);
        }
        for (i, h) in e.sets.process_tech() {
            let water = p.water_use.get((i, h)).unwrap() + p.water_return.get((i, h)).unwrap();
            assert_eq!(constr.coefficient(e.vars.y[*i][*h][0]), -water);
        }
        assert_eq!(constr.sense, ConstrSense::Greater);
        assert_eq!(constr.rhs, 0.0);
    }

    #[test]
    fn families_fail_on_missing_parameters() {
        let sizes = Sizes::new(2, 1, 3, 1, 1);
        let (sets, mut parameters, _, _) = setup(sizes, Variant::V3);
        parameters.water_return = Table::new("water_return");
        let ctx = Context {
            sets: &sets,
            parameters: &parameters,
            big_m: BigM::new(&sizes, &parameters),
        };
        assert!(matches!(
            MassBalance.check(&ctx),
            Err(Error::DimensionMismatch {
                parameter: "water_return",
                ..
            })
        ));
        assert!(PlantCapacity.check(&ctx).is_ok());
    }

    #[test]
    fn families_need_their_variables() {
        let sizes = Sizes::new(1, 1, 2, 1, 1);
        let (sets, parameters, mut model, vars) = setup(sizes, Variant::V1);
        let ctx = Context {
            sets: &sets,
            parameters: &parameters,
            big_m: BigM::new(&sizes, &parameters),
        };
        assert!(matches!(
            WaterSupply.emit(&ctx, &vars, &mut model),
            Err(Error::MissingVariables {
                family: "water_supply",
                ..
            })
        ));
    }
}
