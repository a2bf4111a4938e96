pub mod lithium;
pub mod milp;
pub mod utils;
