pub mod command;
pub mod executor;
pub mod plan;

pub use command::ProcessRunner;
pub use plan::{DeployPlan, PlanOptions, Tolerance};
