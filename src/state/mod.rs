//! Local state of the managed GoCD objects.
//!
//! The state records, per resource address, the identifier and attributes
//! (including the ETag) of every instance the provider created, the last
//! results of data sources, and a short operation history.

mod local;
mod store;
mod types;

pub use local::LocalStateStore;
pub use store::StateStore;
pub use types::{HistoryEntry, Operation, ProviderState, ResourceState, STATE_VERSION};
