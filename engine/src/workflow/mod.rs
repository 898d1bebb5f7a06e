//! Workflows
//!
//! Planning turns an intent into steps; execution runs those steps against
//! the collaborators and composes the reply.

pub mod executor;
pub mod planner;
pub mod registry;
pub mod types;

pub use executor::WorkflowExecutor;
pub use planner::WorkflowPlanner;
pub use registry::{InFlightGuard, RegistryError, WorkflowRegistry};
pub use types::{Step, StepError, Workflow, WorkflowError, WorkflowResult, WorkflowState};
