//! Library side of the `rxrec` binary: configuration, logging, the
//! terminal operator and the reconciliation run controller.

pub mod config;
pub mod console;
pub mod logging;
pub mod pipeline;
