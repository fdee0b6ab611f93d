#![deny(unsafe_code)]

//! Operational tasks for an OpenMRS-based deployment.
//!
//! Every task builds [`Invocation`]s of external tools (Maven with the
//! OpenMRS SDK, git, the MySQL client, QEMU) and hands them to a
//! [`CommandRunner`]. [`SystemRunner`] spawns real processes; tests supply a
//! runner that records what would have been run.

pub mod config;
pub mod db;
pub mod error;
pub mod git;
pub mod invocation;
pub mod server;
pub mod vm;

pub use config::OpsConfig;
pub use error::{OpsError, Result};
pub use invocation::{CommandOutput, CommandRunner, Invocation, StdinMode, SystemRunner};
