//! aq-analysis: stateless analyses over a water-distribution network.
//!
//! Provides:
//! - Shape analyses (connected component, cycle and tree detection)
//! - Demand/capacity analyses (minimum aggregate source flow,
//!   capacity-violation detection)
//! - Valve-closure inference from arrival observations
//! - Proximity ordering around a reference coordinate
//! - Maximum flow between aggregated sources and sinks, computed on a
//!   disposable deep copy of the network

pub mod capacity;
pub mod error;
pub mod isolation;
pub mod maxflow;
pub mod proximity;
pub mod structure;

// Re-exports for ergonomics
pub use capacity::{excess_pipes, min_source_flow};
pub use error::{AnalysisError, AnalysisResult};
pub use isolation::valves_to_close;
pub use maxflow::{MaxFlowOutcome, SUPER_SINK, SUPER_SOURCE, max_flow};
pub use proximity::order_by_proximity;
pub use structure::{has_cycle, is_tree};
