// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # terraform-provider-gocd
//!
//! Declarative management of GoCD server objects.
//!
//! ## Overview
//!
//! The provider exposes GoCD's admin objects as resources and data sources:
//!
//! - Pipelines and config repositories
//! - Plugin settings and authorization configs
//! - Elastic agent cluster profiles and agent profiles
//! - Environments and secret configs
//! - Server-side encryption of secret values
//!
//! ## Architecture
//!
//! Every resource translates a schema-typed attribute bag into typed calls
//! against the GoCD API client:
//!
//! 1. **Manifest**: provider settings, resources and data sources in `gocd.provider.yaml`
//! 2. **State**: what the provider created, with ETags, under `.gocd-provider/`
//! 3. **Planner**: diffs both through the provider and applies the changes
//!
//! ## Modules
//!
//! - [`schema`]: attribute schemas and shared schema fragments
//! - [`provider`]: the provider, lifecycle traits and attribute data
//! - [`resources`]: one adapter per GoCD object
//! - [`gocd`]: GoCD API client
//! - [`config`]: manifest parsing and validation
//! - [`state`]: local state storage
//! - [`planner`]: diff computation and plan execution
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```yaml
//! provider:
//!   base_url: https://gocd.example.com/go
//!
//! resources:
//!   - type: gocd_environment
//!     name: prod
//!     config:
//!       name: prod
//!       pipelines: [build, deploy]
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod gocd;
pub mod planner;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{Manifest, ManifestParser, ManifestValidator, ProviderConfig};
pub use error::{ProviderError, Result};
pub use gocd::{GoCdApi, GoCdClient};
pub use planner::{ApplyPlan, DiffEngine, PlanExecutor};
pub use provider::{DataSource, GoCdProvider, Resource, ResourceData};
pub use state::{LocalStateStore, ProviderState, StateStore};
