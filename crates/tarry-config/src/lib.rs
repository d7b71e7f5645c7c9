//! Tarry Config
//!
//! This crate contains the serializable configuration types for tarry.
//! A wait plan describes a set of probes and how to wait on them; poll
//! settings describe how often to retry and for how long.
//!
//! Configuration can be loaded from:
//! - JSON plan files (via CLI with `tarry run plan.json`)
//! - The user defaults file (`<config_dir>/tarry/config.json`)
//!
//! Settings from several sources are layered with [`PollConfig::merge`].

mod error;
mod plan;
mod poll;
mod probe;

pub use error::ConfigError;
pub use plan::{PlanDef, WaitMode};
pub use poll::{DEFAULT_INTERVAL_MS, PollConfig};
pub use probe::ProbeDef;
