//! Command line front-end for locsync; modules are public for testing.

pub mod config;
pub mod discover;
pub mod status;
pub mod sync;
pub mod validation;

pub use config::Config;
pub use sync::{IosArgs, RunArgs, Settings};
