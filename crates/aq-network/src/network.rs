//! The network graph: node/pipe ownership, adjacency and the mutation
//! contract.
//!
//! Storage is an explicit adjacency structure: nodes keyed by id, pipes
//! keyed by the ordered `(from, to)` pair, and secondary outgoing/incoming
//! lists maintained on every connect. The graph is not necessarily
//! connected, and `Clone` is a full deep copy.

use std::collections::BTreeMap;

use aq_core::GeoCoord;
use tracing::debug;

use crate::error::{NetError, NetResult};
use crate::node::{Node, NodeKind, ValveState};
use crate::pipe::Pipe;

/// Ordered `(from, to)` pair identifying a pipe.
pub type PipeKey = (String, String);

pub(crate) fn pipe_key(from: &str, to: &str) -> PipeKey {
    (from.to_string(), to.to_string())
}

/// A water-distribution network as a directed graph.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) pipes: BTreeMap<PipeKey, Pipe>,
    /// Successor ids per node, in connect order. Nodes without outgoing
    /// pipes have no entry.
    pub(crate) outgoing: BTreeMap<String, Vec<String>>,
    /// Predecessor ids per node, in connect order.
    pub(crate) incoming: BTreeMap<String, Vec<String>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a supply point with output 0. Fails with `DuplicateId` if the id
    /// is already taken.
    pub fn add_source(&mut self, id: impl Into<String>, coord: GeoCoord) -> NetResult<()> {
        self.insert_node(Node::new(id.into(), coord, NodeKind::Source { output: 0.0 }))
    }

    /// Add a consumption point with the given peak demand and current
    /// demand 0. Fails with `DuplicateId` on an id collision and
    /// `InvalidDemand` on a negative peak.
    pub fn add_terminal(
        &mut self,
        id: impl Into<String>,
        coord: GeoCoord,
        peak_demand: f64,
    ) -> NetResult<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(NetError::DuplicateId { id });
        }
        if peak_demand < 0.0 {
            return Err(NetError::InvalidDemand { value: peak_demand });
        }
        self.insert_node(Node::new(
            id,
            coord,
            NodeKind::Terminal {
                peak_demand,
                demand: 0.0,
                subscribers: Vec::new(),
            },
        ))
    }

    /// Add a pass-through junction. Fails with `DuplicateId` if the id is
    /// already taken.
    pub fn add_junction(&mut self, id: impl Into<String>, coord: GeoCoord) -> NetResult<()> {
        self.insert_node(Node::new(id.into(), coord, NodeKind::Junction))
    }

    fn insert_node(&mut self, node: Node) -> NetResult<()> {
        if self.nodes.contains_key(node.id()) {
            return Err(NetError::DuplicateId {
                id: node.id().to_string(),
            });
        }
        debug!(node = node.id(), "node added");
        self.nodes.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Connect two existing nodes with a pipe of the given capacity, water
    /// flowing from `from` to `to`.
    pub fn connect(&mut self, from: &str, to: &str, capacity: f64) -> NetResult<()> {
        self.connect_with(from, to, capacity, false)
    }

    /// Like [`connect`](Self::connect), but `allow_terminal_source` lets a
    /// terminal be the tail of the pipe — the one sanctioned exception,
    /// used by the max-flow transformation to wire terminals into a
    /// synthetic sink.
    ///
    /// Connecting into a source, or out of a terminal under the exception,
    /// converts that endpoint to a junction with the same id, coordinates
    /// and valve state; its incident pipes survive the conversion.
    pub fn connect_with(
        &mut self,
        from: &str,
        to: &str,
        capacity: f64,
        allow_terminal_source: bool,
    ) -> NetResult<()> {
        if !self.nodes.contains_key(from) {
            return Err(NetError::UnknownNode { id: from.into() });
        }
        if !self.nodes.contains_key(to) {
            return Err(NetError::UnknownNode { id: to.into() });
        }
        if self.nodes[from].is_terminal() && !allow_terminal_source {
            return Err(NetError::IllegalTopology {
                what: format!("terminal {from} cannot start a connection"),
            });
        }
        if self.pipes.contains_key(&pipe_key(from, to)) {
            return Err(NetError::DuplicatePipe {
                from: from.into(),
                to: to.into(),
            });
        }
        if capacity < 0.0 {
            return Err(NetError::InvalidCapacity { value: capacity });
        }

        // A source that receives water becomes an intermediate point, and a
        // terminal that pushes water onward does too.
        if self.nodes[to].is_source() {
            if let Some(node) = self.nodes.get_mut(to) {
                node.demote_to_junction();
            }
            debug!(node = to, "receiving source converted to junction");
        }
        if self.nodes[from].is_terminal() {
            if let Some(node) = self.nodes.get_mut(from) {
                node.demote_to_junction();
            }
            debug!(node = from, "sending terminal converted to junction");
        }

        self.pipes.insert(
            pipe_key(from, to),
            Pipe::new(from.to_string(), to.to_string(), capacity),
        );
        self.outgoing
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        self.incoming
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
        debug!(from, to, capacity, "pipe connected");
        Ok(())
    }

    /// Open a node's valve. Idempotent; the returned bool says whether the
    /// state actually changed.
    pub fn open_valve(&mut self, id: &str) -> NetResult<bool> {
        let node = self.node_mut(id)?;
        if node.valve.is_open() {
            Ok(false)
        } else {
            node.valve = ValveState::Open;
            debug!(node = id, "valve opened");
            Ok(true)
        }
    }

    /// Close a node's valve. Idempotent; the returned bool says whether the
    /// state actually changed.
    pub fn close_valve(&mut self, id: &str) -> NetResult<bool> {
        let node = self.node_mut(id)?;
        if node.valve.is_open() {
            node.valve = ValveState::Closed;
            debug!(node = id, "valve closed");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Set a source's configured output (l/s).
    pub fn set_source_output(&mut self, id: &str, value: f64) -> NetResult<()> {
        if value < 0.0 {
            return Err(NetError::InvalidValue {
                what: "source output",
                value,
            });
        }
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Source { output } => {
                *output = value;
                Ok(())
            }
            _ => Err(NetError::IllegalTopology {
                what: format!("node {id} is not a source"),
            }),
        }
    }

    /// Set a terminal's current demand (l/s).
    pub fn set_terminal_demand(&mut self, id: &str, value: f64) -> NetResult<()> {
        if value < 0.0 {
            return Err(NetError::InvalidValue {
                what: "terminal demand",
                value,
            });
        }
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Terminal { demand, .. } => {
                *demand = value;
                Ok(())
            }
            _ => Err(NetError::IllegalTopology {
                what: format!("node {id} is not a terminal"),
            }),
        }
    }

    /// Register `client` as a subscriber at a terminal; duplicates are
    /// ignored.
    pub fn subscribe(&mut self, client: &str, terminal: &str) -> NetResult<()> {
        let node = self.node_mut(terminal)?;
        match &mut node.kind {
            NodeKind::Terminal { subscribers, .. } => {
                if !subscribers.iter().any(|s| s == client) {
                    subscribers.push(client.to_string());
                }
                Ok(())
            }
            _ => Err(NetError::IllegalTopology {
                what: format!("node {terminal} is not a terminal"),
            }),
        }
    }

    /// Flow arriving at the offtake where `client` is subscribed, or 0 when
    /// the client is subscribed nowhere. Terminals are scanned in id order.
    pub fn subscriber_flow(&mut self, client: &str) -> NetResult<f64> {
        let terminal = self
            .nodes
            .values()
            .find(|n| n.has_subscriber(client))
            .map(|n| n.id().to_string());
        match terminal {
            Some(id) => self.flow_at(&id),
            None => Ok(0.0),
        }
    }

    pub fn node(&self, id: &str) -> NetResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| NetError::UnknownNode { id: id.into() })
    }

    fn node_mut(&mut self, id: &str) -> NetResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| NetError::UnknownNode { id: id.into() })
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn pipe(&self, from: &str, to: &str) -> NetResult<&Pipe> {
        self.pipes
            .get(&pipe_key(from, to))
            .ok_or_else(|| NetError::UnknownPipe {
                from: from.into(),
                to: to.into(),
            })
    }

    pub fn pipe_mut(&mut self, from: &str, to: &str) -> NetResult<&mut Pipe> {
        self.pipes
            .get_mut(&pipe_key(from, to))
            .ok_or_else(|| NetError::UnknownPipe {
                from: from.into(),
                to: to.into(),
            })
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All pipes, in `(from, to)` order.
    pub fn pipes(&self) -> impl Iterator<Item = &Pipe> {
        self.pipes.values()
    }

    /// Pipes leaving `id`, in connect order. Fails with `UnknownNode` if the
    /// node is absent.
    pub fn outgoing(&self, id: &str) -> NetResult<Vec<&Pipe>> {
        if !self.nodes.contains_key(id) {
            return Err(NetError::UnknownNode { id: id.into() });
        }
        Ok(self
            .outgoing
            .get(id)
            .map(|succ| {
                succ.iter()
                    .map(|to| &self.pipes[&pipe_key(id, to)])
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Pipes entering `id`, in connect order. Fails with `UnknownNode` if
    /// the node is absent.
    pub fn incoming(&self, id: &str) -> NetResult<Vec<&Pipe>> {
        if !self.nodes.contains_key(id) {
            return Err(NetError::UnknownNode { id: id.into() });
        }
        Ok(self
            .incoming
            .get(id)
            .map(|pred| {
                pred.iter()
                    .map(|from| &self.pipes[&pipe_key(from, id)])
                    .collect()
            })
            .unwrap_or_default())
    }
}
