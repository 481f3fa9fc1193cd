//! Planning module for provider operations.
//!
//! This module compares the manifest with recorded state, builds ordered
//! apply plans and executes them through the provider.

mod diff;
mod executor;
mod plan;

pub use diff::{DiffEngine, DiffResult, ResourceDiff};
pub use executor::{ActionResult, ExecutionResult, PlanExecutor};
pub use plan::{ApplyPlan, PlannedAction};
