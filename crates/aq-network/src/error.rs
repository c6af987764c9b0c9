//! Network-specific error types.

use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

/// Errors raised by network mutation and query operations.
///
/// All of these are synchronous precondition failures surfaced to the
/// immediate caller; the operation that raised one leaves the network
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetError {
    #[error("a node named {id} already exists in the network")]
    DuplicateId { id: String },

    #[error("node {id} does not belong to the network")]
    UnknownNode { id: String },

    #[error("no pipe connects {from} to {to}")]
    UnknownPipe { from: String, to: String },

    #[error("{from} and {to} are already connected")]
    DuplicatePipe { from: String, to: String },

    #[error("pipe capacity cannot be negative: {value}")]
    InvalidCapacity { value: f64 },

    #[error("{what} cannot be negative: {value}")]
    InvalidValue { what: &'static str, value: f64 },

    #[error("terminal peak demand cannot be negative: {value}")]
    InvalidDemand { value: f64 },

    #[error("{what}")]
    IllegalTopology { what: String },
}
