use std::collections::BTreeMap;
use std::fmt::Debug;

use derive_more::{Deref, Display, From, Into};
use itertools::iproduct;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::problem::{Sizes, Variant};

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct ProcessIndex(usize);

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct TechnologyIndex(usize);

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct PeriodIndex(usize);

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct PlantIndex(usize);

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct TransportIndex(usize);

/// (process, technology)
pub type IH = (ProcessIndex, TechnologyIndex);
/// (process, technology, month)
pub type IHT = (ProcessIndex, TechnologyIndex, PeriodIndex);

/// sets for the lithium planning model
#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of extraction processes
    pub I: Vec<ProcessIndex>,
    /// Set of technologies
    pub H: Vec<TechnologyIndex>,
    /// Set of months in the horizon
    pub T: Vec<PeriodIndex>,
    /// Set of water plants
    pub P: Vec<PlantIndex>,
    /// Set of transport methods
    pub M: Vec<TransportIndex>,
}

impl Sets {
    pub fn new(sizes: &Sizes) -> Result<Sets> {
        macro_rules! set {
            ($type:ident, $n:expr) => {
                (0..$n).map(|i| $type(i)).collect::<Vec<_>>()
            };
        }

        sizes.validate()?;
        Ok(Sets {
            I: set!(ProcessIndex, sizes.processes),
            H: set!(TechnologyIndex, sizes.technologies),
            T: set!(PeriodIndex, sizes.periods),
            P: set!(PlantIndex, sizes.plants),
            M: set!(TransportIndex, sizes.transports),
        })
    }

    /// Length of the horizon
    pub fn horizon(&self) -> usize {
        self.T.len()
    }

    /// I x H
    pub fn process_tech(&self) -> impl Iterator<Item = IH> + Clone + '_ {
        iproduct!(self.I.iter().copied(), self.H.iter().copied())
    }

    /// I x H x T
    pub fn process_tech_period(&self) -> impl Iterator<Item = IHT> + Clone + '_ {
        iproduct!(
            self.I.iter().copied(),
            self.H.iter().copied(),
            self.T.iter().copied()
        )
    }

    /// P x T
    pub fn plant_period(&self) -> impl Iterator<Item = (PlantIndex, PeriodIndex)> + Clone + '_ {
        iproduct!(self.P.iter().copied(), self.T.iter().copied())
    }

    /// P x M
    pub fn plant_transport(
        &self,
    ) -> impl Iterator<Item = (PlantIndex, TransportIndex)> + Clone + '_ {
        iproduct!(self.P.iter().copied(), self.M.iter().copied())
    }

    /// I x I
    pub fn process_pairs(&self) -> impl Iterator<Item = (ProcessIndex, ProcessIndex)> + Clone + '_ {
        iproduct!(self.I.iter().copied(), self.I.iter().copied())
    }
}

/// A parameter indexed by a composite key.
///
/// Lookups of keys the table does not cover fail with [`Error::DimensionMismatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table<K: Ord> {
    name: &'static str,
    values: BTreeMap<K, f64>,
}

impl<K: Ord + Copy + Debug> Table<K> {
    pub fn new(name: &'static str) -> Table<K> {
        Table {
            name,
            values: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn insert(&mut self, key: K, value: f64) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: K) -> Result<f64> {
        self.values
            .get(&key)
            .copied()
            .ok_or_else(|| Error::DimensionMismatch {
                parameter: self.name,
                key: format!("{:?}", key),
            })
    }

    /// Checks that every key is covered
    pub fn require(&self, keys: impl IntoIterator<Item = K>) -> Result<()> {
        for key in keys {
            self.get(key)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

impl<K: Ord + Serialize> Serialize for Table<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.values.iter())
    }
}

/// A scalar parameter, missing when the variant does not use it
pub fn scalar(value: Option<f64>, name: &'static str) -> Result<f64> {
    value.ok_or(Error::DimensionMismatch {
        parameter: name,
        key: "()".to_string(),
    })
}


/// parameters for the lithium planning model.
///
/// Which tables are populated depends on the variant the parameters were synthesized for;
/// the remaining tables are empty and scalars are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameters {
    /// The sizes the parameters were synthesized for
    pub sizes: Sizes,
    /// The variant the parameters were synthesized for
    pub variant: Variant,
    /// The seed of the random stream
    pub seed: u64,
    /// cost of acquiring technology h for process i
    pub acquisition_cost: Table<IH>,
    /// cost of using technology h for process i in month t
    pub usage_cost: Table<IHT>,
    /// tons of lithium carbonate produced by process i
    pub process_yield: Table<ProcessIndex>,
    /// tons of lithium carbonate produced by process i with technology h
    pub yield_: Table<IH>,
    /// water used by process i with technology h in month t
    pub period_water_use: Table<IHT>,
    /// water used by process i with technology h
    pub water_use: Table<IH>,
    /// water returned to the environment by process i with technology h in month t
    pub period_water_return: Table<IHT>,
    /// water returned to the environment by process i with technology h
    pub water_return: Table<IH>,
    /// environmental footprint of process i with technology h
    pub footprint: Table<IH>,
    /// months one iteration of process i takes
    pub process_duration: Table<ProcessIndex>,
    /// months process i takes with technology h
    pub duration: Table<IH>,
    /// lithium demand in month t
    pub period_demand: Table<PeriodIndex>,
    /// lithium demand over the horizon
    pub demand: Option<f64>,
    /// environmental limit per month
    pub period_footprint_limit: Option<f64>,
    /// environmental limit over the horizon
    pub footprint_limit: Option<f64>,
    /// price of a ton of lithium carbonate in month t
    pub price: Table<PeriodIndex>,
    /// profit margin to keep in every month
    pub margin: Option<f64>,
    /// cost per unit of water extracted at plant p
    pub plant_cost: Table<PlantIndex>,
    /// water that can be extracted at plant p in one month
    pub plant_capacity: Table<PlantIndex>,
    /// cost of moving water from plant p with transport method m
    pub transport_cost: Table<(PlantIndex, TransportIndex)>,
    /// 1 if process i must precede process j
    pub order: Table<(ProcessIndex, ProcessIndex)>,
    /// number of technologies process i can take before acquisition gets expensive
    pub max_technologies: Table<ProcessIndex>,
}

impl Parameters {
    /// Parameters with every table empty
    pub fn empty(sizes: Sizes, variant: Variant, seed: u64) -> Parameters {
        Parameters {
            sizes,
            variant,
            seed,
            acquisition_cost: Table::new("acquisition_cost"),
            usage_cost: Table::new("usage_cost"),
            process_yield: Table::new("process_yield"),
            yield_: Table::new("yield"),
            period_water_use: Table::new("period_water_use"),
            water_use: Table::new("water_use"),
            period_water_return: Table::new("period_water_return"),
            water_return: Table::new("water_return"),
            footprint: Table::new("footprint"),
            process_duration: Table::new("process_duration"),
            duration: Table::new("duration"),
            period_demand: Table::new("period_demand"),
            demand: None,
            period_footprint_limit: None,
            footprint_limit: None,
            price: Table::new("price"),
            margin: None,
            plant_cost: Table::new("plant_cost"),
            plant_capacity: Table::new("plant_capacity"),
            transport_cost: Table::new("transport_cost"),
            order: Table::new("order"),
            max_technologies: Table::new("max_technologies"),
        }
    }

    /// The longest duration of any process, over both duration tables
    pub fn max_duration(&self) -> f64 {
        self.process_duration
            .values()
            .chain(self.duration.values())
            .fold(0.0, f64::max)
    }
}
