//! The lithium extraction planning model: parameter synthesis, constraint families and
//! the model builder for the three variants.

pub mod config;
pub mod constraints;
pub mod model;
pub mod sets_and_parameters;
pub mod synthesis;

pub use config::{Config, Family, ObjectiveKind, VarSet, VariableSets};
pub use model::{Built, LithiumModel, LithiumResults, Variables};
pub use sets_and_parameters::{Parameters, Sets};
pub use synthesis::synthesize;
