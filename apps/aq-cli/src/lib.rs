//! aq-cli: line-oriented script interpreter over the aquanet engine.
//!
//! The binary in `main.rs` is a thin wrapper; the interpreter itself writes
//! to any `io::Write` sink, which is what the integration tests drive.

pub mod coords;
pub mod error;
pub mod interp;

pub use error::{CliError, CliResult};
pub use interp::Interpreter;
