use derive_more::Display;

use crate::solver::Status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum Error {
    /// One of the instance sizes is zero
    #[display(fmt = "invalid size: `{}` must be strictly positive", _0)]
    InvalidSize(&'static str),
    /// The variant tag is not one of V1, V2 or V3
    #[display(fmt = "unknown variant `{}` (expected V1, V2 or V3)", _0)]
    UnknownVariant(String),
    /// A parameter table does not cover a key that a constraint family or the objective needs
    #[display(fmt = "parameter `{}` is missing key {}", parameter, key)]
    DimensionMismatch { parameter: &'static str, key: String },
    /// A constraint family was activated without the variable set it is written over
    #[display(fmt = "family `{}` needs the `{}` variables, which are not declared", family, set)]
    MissingVariables {
        family: &'static str,
        set: &'static str,
    },
    /// The model has variables or constraints that have not been committed yet
    #[display(fmt = "the model has uncommitted changes, call `commit` first")]
    Uncommitted,
    /// Reported unchanged from the solver collaborator
    #[display(fmt = "solver error ({:?}): {}", status, message)]
    Solver {
        status: Option<Status>,
        message: String,
    },
    #[display(fmt = "io error: {}", _0)]
    Io(String),
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Io(err.to_string())
    }
}
