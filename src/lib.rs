pub mod error;
pub mod models;
pub mod problem;
pub mod solver;

pub use error::{Error, Result};
pub use models::lithium::{Built, Config, Family, LithiumModel, LithiumResults, Parameters};
pub use problem::{Sizes, Variant};

/// Synthesizes the parameters of an instance and builds its model, ready to be solved.
///
/// The start precedence family is added when `precedence` is set and the variant has a
/// water network.
pub fn plan(sizes: &Sizes, variant: Variant, seed: u64, precedence: bool) -> Result<(Parameters, Built)> {
    let parameters = models::lithium::synthesize(sizes, variant, seed)?;
    let mut config = Config::for_variant(variant);
    if precedence && variant.has_water_network() {
        config = config.with_family(Family::StartPrecedence);
    }
    let mut built = LithiumModel::build(sizes, &parameters, &config)?;
    built.finalize()?;
    Ok((parameters, built))
}
