use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The sizes of the index sets of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sizes {
    /// Number of extraction processes (n_ex)
    pub processes: usize,
    /// Number of technologies (n_tec)
    pub technologies: usize,
    /// Length of the planning horizon in months (t_mes)
    pub periods: usize,
    /// Number of water plants (n_pl)
    pub plants: usize,
    /// Number of transport methods (n_m)
    pub transports: usize,
}

impl Sizes {
    pub fn new(
        processes: usize,
        technologies: usize,
        periods: usize,
        plants: usize,
        transports: usize,
    ) -> Sizes {
        Sizes {
            processes,
            technologies,
            periods,
            plants,
            transports,
        }
    }

    /// Checks that every size is strictly positive
    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("processes", self.processes),
            ("technologies", self.technologies),
            ("periods", self.periods),
            ("plants", self.plants),
            ("transports", self.transports),
        ];
        match dims.iter().find(|(_, n)| *n == 0) {
            Some((name, _)) => Err(Error::InvalidSize(name)),
            None => Ok(()),
        }
    }
}

/// The formulation to build.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Single resource, profit floor, net water objective
    V1,
    /// Adds the water supply network and a total cost objective
    V2,
    /// Adds multi-process selection and a per-period water mass balance
    V3,
}

impl Variant {
    /// Whether the variant declares plants and transport methods
    pub fn has_water_network(&self) -> bool {
        !matches!(self, Variant::V1)
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "V1" => Ok(Variant::V1),
            "V2" => Ok(Variant::V2),
            "V3" => Ok(Variant::V3),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        let sizes = Sizes::new(2, 0, 3, 1, 1);
        assert_eq!(sizes.validate(), Err(Error::InvalidSize("technologies")));
        assert!(Sizes::new(1, 1, 1, 1, 1).validate().is_ok());
    }

    #[test]
    fn variant_tags() {
        assert_eq!("v2".parse::<Variant>(), Ok(Variant::V2));
        assert_eq!(" V3 ".parse::<Variant>(), Ok(Variant::V3));
        assert_eq!(
            "V4".parse::<Variant>(),
            Err(Error::UnknownVariant("V4".to_string()))
        );
    }
}
