//! Seeded generation of every coefficient of the planning model.
//!
//! All draws come from one `StdRng` seeded with the caller's seed and are taken in a
//! fixed order (table by table, keys in lexicographic order), so the same sizes,
//! variant and seed always give the same parameters.

use std::fmt::Debug;

use log::{info, trace};
use rand::prelude::*;
use rand_distr::Normal;

use super::sets_and_parameters::{Parameters, Sets, Table};
use crate::error::Result;
use crate::problem::{Sizes, Variant};

/// Relative standard deviation of the normally distributed parameters
pub const RELATIVE_SPREAD: f64 = 0.05;
/// Profit margin to keep in every month (V1)
pub const MARGIN: f64 = 500_000.0;
/// Environmental limit, per month in V1 and over the horizon otherwise
pub const FOOTPRINT_LIMIT: f64 = 500_000.0;
/// Probability that using a technology in a month costs anything
pub const USAGE_COST_PROBABILITY: f64 = 0.3;

/// Mean acquisition cost of a technology within the process' technology count (V3)
pub const ACQUISITION_MEAN: f64 = 750.0;
/// Mean acquisition cost of a technology beyond the process' technology count (V3)
pub const ACQUISITION_PREMIUM_MEAN: f64 = 1500.0;
pub const YIELD_MEAN: f64 = 4500.0;
pub const FOOTPRINT_MEAN: f64 = 500.0;
pub const PLANT_COST_MEAN: f64 = 30.0;
pub const PLANT_CAPACITY_MEAN: f64 = 8000.0;

/// Synthesizes the parameters of the given variant.
pub fn synthesize(sizes: &Sizes, variant: Variant, seed: u64) -> Result<Parameters> {
    let sets = Sets::new(sizes)?;
    info!(
        "Synthesizing {} parameters for {:?} with seed {}",
        variant, sizes, seed
    );

    let mut synthesizer = Synthesizer::new(&sets, *sizes, seed);
    let parameters = match variant {
        Variant::V1 => synthesizer.single_resource(),
        Variant::V2 => synthesizer.water_network(),
        Variant::V3 => synthesizer.selection(),
    };

    trace!("{:?}", parameters);
    Ok(parameters)
}

struct Synthesizer<'a> {
    sets: &'a Sets,
    sizes: Sizes,
    seed: u64,
    rng: StdRng,
}

impl<'a> Synthesizer<'a> {
    fn new(sets: &'a Sets, sizes: Sizes, seed: u64) -> Self {
        Synthesizer {
            sets,
            sizes,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// An integer drawn uniformly from `low..=high`
    fn uniform(&mut self, low: i64, high: i64) -> f64 {
        self.rng.gen_range(low..=high) as f64
    }

    /// 1 with probability `p`, 0 otherwise
    fn indicator(&mut self, p: f64) -> f64 {
        if self.rng.gen_bool(p) {
            1.0
        } else {
            0.0
        }
    }

    /// A draw from N(mean, (0.05 mean)^2), clamped at zero. A mean without a valid
    /// spread (zero, negative or not finite) is returned as is.
    fn normal(&mut self, mean: f64) -> f64 {
        match Normal::new(mean, RELATIVE_SPREAD * mean) {
            Ok(normal) => normal.sample(&mut self.rng).max(0.0),
            Err(_) => mean.max(0.0),
        }
    }

    fn table<K, I, F>(&mut self, name: &'static str, keys: I, mut draw: F) -> Table<K>
    where
        K: Ord + Copy + Debug,
        I: IntoIterator<Item = K>,
        F: FnMut(&mut Self, K) -> f64,
    {
        let mut table = Table::new(name);
        for key in keys {
            let value = draw(self, key);
            table.insert(key, value);
        }
        table
    }

    /// V1: fixed constants and uniform integers, water and prices per month
    fn single_resource(&mut self) -> Parameters {
        let sets = self.sets;
        let mut p = Parameters::empty(self.sizes, Variant::V1, self.seed);

        p.acquisition_cost = self.table(
            "acquisition_cost",
            sets.process_tech(),
            |s, _| s.uniform(500, 1000),
        );
        p.usage_cost = self.table(
            "usage_cost",
            sets.process_tech_period(),
            |s, _| s.indicator(USAGE_COST_PROBABILITY),
        );
        p.process_yield = self.table("process_yield", sets.I.iter().copied(), |s, _| {
            s.uniform(4000, 5000)
        });
        p.period_water_use = self.table(
            "period_water_use",
            sets.process_tech_period(),
            |s, _| s.uniform(1000, 2000),
        );
        p.process_duration = self.table("process_duration", sets.I.iter().copied(), |s, _| {
            s.uniform(5, 24)
        });
        p.footprint = self.table(
            "footprint",
            sets.process_tech(),
            |s, _| s.uniform(0, 1000),
        );
        p.period_demand = self.table("period_demand", sets.T.iter().copied(), |s, _| {
            s.uniform(4000, 40000)
        });
        p.period_water_return = self.table(
            "period_water_return",
            sets.process_tech_period(),
            |s, _| s.uniform(0, 1000),
        );
        p.margin = Some(MARGIN);
        p.price = self.table("price", sets.T.iter().copied(), |s, _| {
            s.uniform(1000, 10000)
        });
        p.period_footprint_limit = Some(FOOTPRINT_LIMIT);

        p
    }

    /// V2: per technology yields and water, plus the water supply network
    fn water_network(&mut self) -> Parameters {
        let sets = self.sets;
        let mut p = Parameters::empty(self.sizes, Variant::V2, self.seed);

        p.acquisition_cost = self.table(
            "acquisition_cost",
            sets.process_tech(),
            |s, _| s.uniform(500, 1000),
        );
        self.process_tables(&mut p);
        p.yield_ = self.table(
            "yield",
            sets.process_tech(),
            |s, _| s.uniform(4000, 5000),
        );
        p.footprint = self.table(
            "footprint",
            sets.process_tech(),
            |s, _| s.uniform(0, 1000),
        );
        p.plant_cost = self.table("plant_cost", sets.P.iter().copied(), |s, _| {
            s.uniform(10, 50)
        });
        p.plant_capacity = self.table("plant_capacity", sets.P.iter().copied(), |s, _| {
            s.uniform(5000, 10000)
        });
        self.network_tables(&mut p);

        p
    }

    /// V3: like V2, but costs, capacities, yields and footprints are normally distributed
    fn selection(&mut self) -> Parameters {
        let sets = self.sets;
        let mut p = Parameters::empty(self.sizes, Variant::V3, self.seed);
        let n_tec = sets.H.len() as i64;

        p.max_technologies = self.table("max_technologies", sets.I.iter().copied(), |s, _| {
            s.uniform(1, n_tec)
        });
        let max_technologies = p.max_technologies.clone();
        p.acquisition_cost = self.table(
            "acquisition_cost",
            sets.process_tech(),
            |s, (i, h)| {
                // technologies beyond the count of process i are drawn around a higher mean
                let count = max_technologies.get(i).unwrap_or(f64::INFINITY);
                if (*h + 1) as f64 > count {
                    s.normal(ACQUISITION_PREMIUM_MEAN)
                } else {
                    s.normal(ACQUISITION_MEAN)
                }
            },
        );
        self.process_tables(&mut p);
        p.yield_ = self.table(
            "yield",
            sets.process_tech(),
            |s, _| s.normal(YIELD_MEAN),
        );
        p.footprint = self.table(
            "footprint",
            sets.process_tech(),
            |s, _| s.normal(FOOTPRINT_MEAN),
        );
        p.plant_cost = self.table("plant_cost", sets.P.iter().copied(), |s, _| {
            s.normal(PLANT_COST_MEAN)
        });
        p.plant_capacity = self.table("plant_capacity", sets.P.iter().copied(), |s, _| {
            s.normal(PLANT_CAPACITY_MEAN)
        });
        self.network_tables(&mut p);

        p
    }

    /// Usage cost, water and duration per process and technology (V2 and V3)
    fn process_tables(&mut self, p: &mut Parameters) {
        let sets = self.sets;
        p.usage_cost = self.table(
            "usage_cost",
            sets.process_tech_period(),
            |s, _| s.indicator(USAGE_COST_PROBABILITY),
        );
        p.water_use = self.table(
            "water_use",
            sets.process_tech(),
            |s, _| s.uniform(1000, 2000),
        );
        p.water_return = self.table(
            "water_return",
            sets.process_tech(),
            |s, _| s.uniform(0, 1000),
        );
        p.duration = self.table(
            "duration",
            sets.process_tech(),
            |s, _| s.uniform(5, 24),
        );
    }

    /// Horizon totals, transport costs and the precedence flags (V2 and V3)
    fn network_tables(&mut self, p: &mut Parameters) {
        let sets = self.sets;
        p.demand = Some(self.uniform(4000, 40000));
        p.footprint_limit = Some(FOOTPRINT_LIMIT);
        p.transport_cost = self.table(
            "transport_cost",
            sets.plant_transport(),
            |s, _| s.uniform(100, 500),
        );
        // only lower indexed processes may precede, which keeps the order acyclic
        p.order = self.table(
            "order",
            sets.process_pairs(),
            |s, (i, j)| if i < j { s.indicator(0.5) } else { 0.0 },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lithium::sets_and_parameters::{ProcessIndex, TechnologyIndex};

    fn sizes() -> Sizes {
        Sizes::new(3, 4, 12, 2, 2)
    }

    #[test]
    fn same_seed_gives_identical_parameters() {
        for variant in [Variant::V1, Variant::V2, Variant::V3] {
            let a = synthesize(&sizes(), variant, 42).unwrap();
            let b = synthesize(&sizes(), variant, 42).unwrap();
            assert_eq!(a, b);

            let c = synthesize(&sizes(), variant, 43).unwrap();
            assert_ne!(a, c);
        }
    }

    #[test]
    fn uniform_draws_stay_within_their_support() {
        let p = synthesize(&sizes(), Variant::V1, 7).unwrap();

        assert_eq!(p.acquisition_cost.len(), 3 * 4);
        assert!(p
            .acquisition_cost
            .values()
            .all(|c| (500.0..=1000.0).contains(&c) && c.fract() == 0.0));
        assert!(p.usage_cost.values().all(|c| c == 0.0 || c == 1.0));
        assert!(p.process_duration.values().all(|a| (5.0..=24.0).contains(&a)));
        assert!(p.period_demand.values().all(|d| (4000.0..=40000.0).contains(&d)));
        assert!(p.price.values().all(|pl| (1000.0..=10000.0).contains(&pl)));
        assert_eq!(p.margin, Some(MARGIN));
        assert_eq!(p.period_footprint_limit, Some(FOOTPRINT_LIMIT));
        // the network is not part of V1
        assert!(p.plant_capacity.is_empty());

        let p = synthesize(&sizes(), Variant::V2, 7).unwrap();
        assert!(p
            .acquisition_cost
            .values()
            .all(|c| (500.0..=1000.0).contains(&c)));
        assert!(p.plant_cost.values().all(|c| (10.0..=50.0).contains(&c)));
        assert!(p
            .plant_capacity
            .values()
            .all(|c| (5000.0..=10000.0).contains(&c)));
        assert!(p.transport_cost.values().all(|c| (100.0..=500.0).contains(&c)));
        assert!(p
            .demand
            .map_or(false, |d| (4000.0..=40000.0).contains(&d)));
    }

    #[test]
    fn normal_draws_are_non_negative() {
        for seed in 0..20 {
            let p = synthesize(&sizes(), Variant::V3, seed).unwrap();
            for table in [&p.acquisition_cost, &p.yield_, &p.footprint] {
                assert!(table.values().all(|v| v >= 0.0));
            }
            assert!(p.plant_cost.values().all(|v| v >= 0.0));
            assert!(p.plant_capacity.values().all(|v| v >= 0.0));
        }
    }

    #[test]
    fn normal_draws_spread_around_the_mean() {
        let sizes = sizes();
        let sets = Sets::new(&sizes).unwrap();
        let mut synthesizer = Synthesizer::new(&sets, sizes, 17);
        let draws = (0..2000).map(|_| synthesizer.normal(1000.0)).collect::<Vec<_>>();

        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let sd = (draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / draws.len() as f64).sqrt();
        assert!((mean - 1000.0).abs() < 5.0, "mean {}", mean);
        assert!((40.0..60.0).contains(&sd), "sd {}", sd);

        assert_eq!(synthesizer.normal(0.0), 0.0);
    }

    #[test]
    fn precedence_only_points_forward() {
        let p = synthesize(&sizes(), Variant::V2, 3).unwrap();
        assert_eq!(p.order.len(), 9);
        for ((i, j), flag) in p.order.iter() {
            assert!(flag == 0.0 || flag == 1.0);
            if i >= j {
                assert_eq!(flag, 0.0);
            }
        }
    }

    #[test]
    fn premium_technologies_cost_more_on_average() {
        let sizes = Sizes::new(1, 2, 1, 1, 1);
        // with two technologies, a count of one puts technology 1 in the premium range
        for seed in 0..50 {
            let p = synthesize(&sizes, Variant::V3, seed).unwrap();
            if p.max_technologies.get(ProcessIndex::from(0)) == Ok(1.0) {
                let premium = p
                    .acquisition_cost
                    .get((ProcessIndex::from(0), TechnologyIndex::from(1)))
                    .unwrap();
                // five standard deviations apart
                assert!(premium > ACQUISITION_MEAN * (1.0 + 5.0 * RELATIVE_SPREAD));
            }
        }
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(synthesize(&Sizes::new(1, 1, 1, 0, 1), Variant::V1, 0).is_err());
    }
}
