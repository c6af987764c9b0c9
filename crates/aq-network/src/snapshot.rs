//! Read-only render snapshot of a network component.
//!
//! Renderers consume this view instead of the live graph: building or
//! serializing a snapshot never mutates the network.

use std::collections::{BTreeSet, VecDeque};

use aq_core::GeoCoord;
use serde::{Deserialize, Serialize};

use crate::error::NetResult;
use crate::network::Network;
use crate::node::NodeKind;

/// Variant label of a snapshot node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeLabel {
    Source,
    Terminal,
    Junction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub coord: GeoCoord,
    pub kind: NodeLabel,
    pub valve_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_demand: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeSnapshot {
    pub from: String,
    pub to: String,
    pub flow: f64,
    pub capacity: f64,
}

/// One connected component of the network, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub pipes: Vec<PipeSnapshot>,
}

impl Network {
    /// Snapshot the connected component containing `origin` (valve state is
    /// irrelevant for membership). Nodes come out in id order, pipes in
    /// `(from, to)` order.
    pub fn snapshot(&self, origin: &str) -> NetResult<NetworkSnapshot> {
        self.node(origin)?;
        let component = self.component_ids(origin);

        let nodes = component
            .iter()
            .map(|id| {
                let node = &self.nodes[id];
                let (kind, output, demand, peak_demand) = match node.kind() {
                    NodeKind::Source { output } => {
                        (NodeLabel::Source, Some(*output), None, None)
                    }
                    NodeKind::Terminal {
                        peak_demand,
                        demand,
                        ..
                    } => (NodeLabel::Terminal, None, Some(*demand), Some(*peak_demand)),
                    NodeKind::Junction => (NodeLabel::Junction, None, None, None),
                };
                NodeSnapshot {
                    id: node.id().to_string(),
                    coord: node.coord(),
                    kind,
                    valve_open: node.is_open(),
                    output,
                    demand,
                    peak_demand,
                }
            })
            .collect();

        let pipes = self
            .pipes
            .values()
            .filter(|p| component.contains(p.from_id()) && component.contains(p.to_id()))
            .map(|p| PipeSnapshot {
                from: p.from_id().to_string(),
                to: p.to_id().to_string(),
                flow: p.flow(),
                capacity: p.capacity(),
            })
            .collect();

        Ok(NetworkSnapshot { nodes, pipes })
    }

    /// Ids of the undirected connected component containing `origin`.
    fn component_ids(&self, origin: &str) -> BTreeSet<String> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        seen.insert(origin.to_string());
        queue.push_back(origin.to_string());
        while let Some(id) = queue.pop_front() {
            let succ = self.outgoing.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            let pred = self.incoming.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            for next in succ.iter().chain(pred) {
                if seen.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord() -> GeoCoord {
        GeoCoord::new(41.0, 2.0).unwrap()
    }

    #[test]
    fn snapshot_is_limited_to_the_component() {
        let mut net = Network::new();
        net.add_source("s", coord()).unwrap();
        net.add_terminal("t", coord(), 5.0).unwrap();
        net.connect("s", "t", 10.0).unwrap();
        net.add_junction("elsewhere", coord()).unwrap();

        let snap = net.snapshot("s").unwrap();
        let ids: Vec<&str> = snap.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["s", "t"]);
        assert_eq!(snap.pipes.len(), 1);
        assert_eq!(snap.pipes[0].capacity, 10.0);
    }

    #[test]
    fn snapshot_carries_variant_fields() {
        let mut net = Network::new();
        net.add_source("s", coord()).unwrap();
        net.add_terminal("t", coord(), 8.0).unwrap();
        net.connect("s", "t", 10.0).unwrap();
        net.set_source_output("s", 3.0).unwrap();
        net.set_terminal_demand("t", 2.0).unwrap();
        net.close_valve("t").unwrap();

        let snap = net.snapshot("s").unwrap();
        let s = &snap.nodes[0];
        assert_eq!(s.kind, NodeLabel::Source);
        assert_eq!(s.output, Some(3.0));
        let t = &snap.nodes[1];
        assert_eq!(t.kind, NodeLabel::Terminal);
        assert_eq!(t.demand, Some(2.0));
        assert_eq!(t.peak_demand, Some(8.0));
        assert!(!t.valve_open);
    }
}
