//! Tarry Probe
//!
//! Runs external commands as polled workers. A probe succeeds when its
//! command exits with status 0 and, if an expected text is configured, its
//! stdout contains that text.
//!
//! A probe attempt always runs to completion. When a poll gives up, the
//! command that is running at that moment is left to finish on its own.

mod command;
mod error;

pub use command::{CommandProbe, ProbeOutput, registry_from_plan};
pub use error::ProbeError;
