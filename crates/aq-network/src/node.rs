//! Node variants of a water-distribution network.
//!
//! Every node carries the same identity record (id, coordinates, valve
//! state); what differs between supply points, consumption points and plain
//! junctions lives in [`NodeKind`].

use aq_core::GeoCoord;

/// Per-node gate. A closed valve blocks flow and demand traversal through
/// the node but the node still counts for topology checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValveState {
    #[default]
    Open,
    Closed,
}

impl ValveState {
    pub fn is_open(self) -> bool {
        matches!(self, ValveState::Open)
    }
}

/// Variant-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Supply point injecting water at a configured rate (l/s).
    Source {
        /// Current configured output, >= 0.
        output: f64,
    },
    /// Consumption point with a fixed peak demand and a mutable current
    /// demand (both l/s), plus the clients subscribed at this offtake.
    Terminal {
        peak_demand: f64,
        demand: f64,
        /// Insertion-ordered, duplicates ignored.
        subscribers: Vec<String>,
    },
    /// Pass-through point with no flow or demand of its own.
    Junction,
}

/// A network node: the shared capability record plus its variant payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: String,
    pub(crate) coord: GeoCoord,
    pub(crate) valve: ValveState,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: String, coord: GeoCoord, kind: NodeKind) -> Self {
        Self {
            id,
            coord,
            valve: ValveState::Open,
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coord(&self) -> GeoCoord {
        self.coord
    }

    pub fn valve(&self) -> ValveState {
        self.valve
    }

    pub fn is_open(&self) -> bool {
        self.valve.is_open()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, NodeKind::Source { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }

    pub fn is_junction(&self) -> bool {
        matches!(self.kind, NodeKind::Junction)
    }

    /// Configured output when this node is a source.
    pub fn output(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Source { output } => Some(output),
            _ => None,
        }
    }

    /// Current demand when this node is a terminal.
    pub fn demand(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Terminal { demand, .. } => Some(demand),
            _ => None,
        }
    }

    /// Peak demand when this node is a terminal.
    pub fn peak_demand(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Terminal { peak_demand, .. } => Some(peak_demand),
            _ => None,
        }
    }

    /// Whether `client` is subscribed at this node. Always false for
    /// non-terminals.
    pub fn has_subscriber(&self, client: &str) -> bool {
        match &self.kind {
            NodeKind::Terminal { subscribers, .. } => {
                subscribers.iter().any(|s| s == client)
            }
            _ => false,
        }
    }

    /// Drop the variant payload, keeping id, coordinates and valve state.
    ///
    /// Used by the connect operation when a source starts receiving water
    /// or a terminal starts pushing it onward.
    pub(crate) fn demote_to_junction(&mut self) {
        self.kind = NodeKind::Junction;
    }
}
