//! aq-network: graph/model layer for aquanet.
//!
//! Provides:
//! - Node variants (source, terminal, junction) over a shared
//!   id/coordinates/valve record
//! - Directed capacity-bounded pipes
//! - The `Network` adjacency store with its mutation/query contract
//! - Work-queue demand and flow propagation
//! - A serializable read-only snapshot for renderers
//!
//! # Example
//!
//! ```
//! use aq_core::GeoCoord;
//! use aq_network::Network;
//!
//! let mut net = Network::new();
//! net.add_source("wells", GeoCoord::new(41.98, 2.82).unwrap()).unwrap();
//! net.add_terminal("old-town", GeoCoord::new(41.99, 2.82).unwrap(), 10.0).unwrap();
//! net.connect("wells", "old-town", 25.0).unwrap();
//!
//! net.set_terminal_demand("old-town", 10.0).unwrap();
//! assert_eq!(net.demand_at("wells").unwrap(), 10.0);
//! ```

pub mod error;
pub mod network;
pub mod node;
pub mod pipe;
pub mod propagate;
pub mod snapshot;

// Re-exports for ergonomics
pub use error::{NetError, NetResult};
pub use network::{Network, PipeKey};
pub use node::{Node, NodeKind, ValveState};
pub use pipe::Pipe;
pub use propagate::PropagationView;
pub use snapshot::{NetworkSnapshot, NodeLabel, NodeSnapshot, PipeSnapshot};
