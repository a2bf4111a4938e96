use serde::Serialize;

use super::constraints::{self, ConstraintFamily};
use crate::error::{Error, Result};
use crate::problem::Variant;

/// The optional groups of decision variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarSet {
    /// completion `z(i,t)` and start `v(i,t)` indicators
    Completion,
    /// plant draws `q_ag(p,t)`, the reservoir draw `q_ag_s` and transport choices `tr(p,m)`
    WaterNetwork,
    /// start periods `start(i,h)`
    Start,
    /// process selection `w(i)`
    Selection,
}

impl VarSet {
    pub fn name(&self) -> &'static str {
        match self {
            VarSet::Completion => "completion",
            VarSet::WaterNetwork => "water network",
            VarSet::Start => "start",
            VarSet::Selection => "selection",
        }
    }
}

/// Which optional variable groups the model declares. `x` and `y` always exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VariableSets {
    pub completion: bool,
    pub water_network: bool,
    pub start: bool,
    pub selection: bool,
}

impl VariableSets {
    pub fn contains(&self, set: VarSet) -> bool {
        match set {
            VarSet::Completion => self.completion,
            VarSet::WaterNetwork => self.water_network,
            VarSet::Start => self.start,
            VarSet::Selection => self.selection,
        }
    }

    fn insert(&mut self, set: VarSet) {
        match set {
            VarSet::Completion => self.completion = true,
            VarSet::WaterNetwork => self.water_network = true,
            VarSet::Start => self.start = true,
            VarSet::Selection => self.selection = true,
        }
    }
}

/// The constraint families a model can be composed of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Family {
    ProfitFloor,
    PeriodDemand,
    PeriodFootprint,
    OneTechnologyPerPeriod,
    DurationBudget,
    ProcessOrdering,
    Activation,
    DurationOffset,
    PlantCapacity,
    ReservoirBalance,
    HorizonFootprint,
    HorizonDemand,
    WaterSupply,
    TransportLink,
    OneProcessPerPeriod,
    TwoSidedActivation,
    StartPrecedence,
    MassBalance,
    ProcessSelection,
}

impl Family {
    pub fn strategy(&self) -> &'static dyn ConstraintFamily {
        use constraints::*;
        match self {
            Family::ProfitFloor => &ProfitFloor,
            Family::PeriodDemand => &PeriodDemand,
            Family::PeriodFootprint => &PeriodFootprint,
            Family::OneTechnologyPerPeriod => &OneTechnologyPerPeriod,
            Family::DurationBudget => &DurationBudget,
            Family::ProcessOrdering => &ProcessOrdering,
            Family::Activation => &Activation,
            Family::DurationOffset => &DurationOffset,
            Family::PlantCapacity => &PlantCapacity,
            Family::ReservoirBalance => &ReservoirBalance,
            Family::HorizonFootprint => &HorizonFootprint,
            Family::HorizonDemand => &HorizonDemand,
            Family::WaterSupply => &WaterSupply,
            Family::TransportLink => &TransportLink,
            Family::OneProcessPerPeriod => &OneProcessPerPeriod,
            Family::TwoSidedActivation => &TwoSidedActivation,
            Family::StartPrecedence => &StartPrecedence,
            Family::MassBalance => &MassBalance,
            Family::ProcessSelection => &ProcessSelection,
        }
    }

    pub fn name(&self) -> &'static str {
        self.strategy().name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectiveKind {
    /// water consumed minus water returned, over every active process month
    NetWater,
    /// water extraction, transport, acquisition and usage costs
    TotalCost,
}

impl ObjectiveKind {
    pub fn variables(&self) -> &'static [VarSet] {
        match self {
            ObjectiveKind::NetWater => &[],
            ObjectiveKind::TotalCost => &[VarSet::WaterNetwork],
        }
    }
}

/// The composition of a model: variables, constraint families (emitted in order) and objective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub variant: Variant,
    pub variables: VariableSets,
    pub families: Vec<Family>,
    pub objective: ObjectiveKind,
}

impl Config {
    pub fn for_variant(variant: Variant) -> Config {
        use Family::*;
        match variant {
            Variant::V1 => Config {
                variant,
                variables: VariableSets {
                    completion: true,
                    ..Default::default()
                },
                families: vec![
                    ProfitFloor,
                    PeriodDemand,
                    PeriodFootprint,
                    OneTechnologyPerPeriod,
                    DurationBudget,
                    ProcessOrdering,
                    Activation,
                    DurationOffset,
                ],
                objective: ObjectiveKind::NetWater,
            },
            Variant::V2 => Config {
                variant,
                variables: VariableSets {
                    water_network: true,
                    start: true,
                    ..Default::default()
                },
                families: vec![
                    PlantCapacity,
                    ReservoirBalance,
                    HorizonFootprint,
                    HorizonDemand,
                    WaterSupply,
                    TransportLink,
                    OneTechnologyPerPeriod,
                    OneProcessPerPeriod,
                    TwoSidedActivation,
                ],
                objective: ObjectiveKind::TotalCost,
            },
            Variant::V3 => {
                let mut config = Config::for_variant(Variant::V2);
                config.variant = variant;
                config.variables.selection = true;
                config.families.extend([MassBalance, ProcessSelection]);
                config
            }
        }
    }

    /// Adds a family, together with the variables it is written over
    pub fn with_family(mut self, family: Family) -> Config {
        if !self.families.contains(&family) {
            for set in family.strategy().variables() {
                self.variables.insert(*set);
            }
            self.families.push(family);
        }
        self
    }

    /// Checks that every family and the objective have their variables declared
    pub fn validate(&self) -> Result<()> {
        for family in &self.families {
            let strategy = family.strategy();
            for set in strategy.variables() {
                if !self.variables.contains(*set) {
                    return Err(Error::MissingVariables {
                        family: strategy.name(),
                        set: set.name(),
                    });
                }
            }
        }
        for set in self.objective.variables() {
            if !self.variables.contains(*set) {
                return Err(Error::MissingVariables {
                    family: "objective",
                    set: set.name(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_are_valid_compositions() {
        for variant in [Variant::V1, Variant::V2, Variant::V3] {
            assert!(Config::for_variant(variant).validate().is_ok());
        }

        let v2 = Config::for_variant(Variant::V2);
        let v3 = Config::for_variant(Variant::V3);
        assert!(v2.families.iter().all(|f| v3.families.contains(f)));
        assert!(v3.variables.selection && !v2.variables.selection);
    }

    #[test]
    fn activation_families_have_distinct_names() {
        assert_eq!(Family::Activation.name(), "activation");
        assert_eq!(Family::TwoSidedActivation.name(), "two_sided_activation");

        let mut config = Config::for_variant(Variant::V3);
        config.families.push(Family::StartPrecedence);
        let mut names = config.families.iter().map(|f| f.name()).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), config.families.len());
    }

    #[test]
    fn families_without_their_variables_are_rejected() {
        let mut config = Config::for_variant(Variant::V2);
        config.families.push(Family::DurationOffset);
        assert_eq!(
            config.validate(),
            Err(Error::MissingVariables {
                family: "duration_offset",
                set: "completion",
            })
        );
    }

    #[test]
    fn precedence_brings_the_start_variables() {
        assert!(!Config::for_variant(Variant::V1).variables.start);
        let v1 = Config::for_variant(Variant::V1).with_family(Family::StartPrecedence);
        assert!(v1.variables.start);

        // the water network variants declare start periods without constraining them
        let v2 = Config::for_variant(Variant::V2);
        assert!(v2.variables.start);
        assert!(!v2.families.contains(&Family::StartPrecedence));

        let config = v2.with_family(Family::StartPrecedence);
        assert!(config.validate().is_ok());
        assert_eq!(config.families.last(), Some(&Family::StartPrecedence));

        let again = config.clone().with_family(Family::StartPrecedence);
        assert_eq!(again, config);
    }
}
