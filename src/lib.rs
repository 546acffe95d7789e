//! Configuration holder for the Automattik server.
//!
//! Builds a [`Config`] from defaults, command line flags and a JSON file, and
//! writes it back out as JSON.

pub mod cli;
pub mod config;
pub mod error;

pub use config::{Config, DatabaseType};
pub use error::{AutomattikError, Result};
