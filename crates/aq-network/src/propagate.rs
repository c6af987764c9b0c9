//! Work-queue propagation of demand (upstream) and flow (downstream).
//!
//! Both queries run network-wide: demand is seeded at every terminal with
//! its current demand and aggregated upstream; flow is seeded at every
//! source with its configured output and distributed downstream. A node
//! only resolves once all of its pipes on the relevant side are known;
//! unresolved nodes go back on the queue. There is no iteration cap —
//! termination relies on the caller keeping source-reachable components
//! acyclic (see the cycle check in aq-analysis).

use std::collections::{BTreeMap, HashSet, VecDeque};

use tracing::trace;

use crate::error::NetResult;
use crate::network::{Network, PipeKey, pipe_key};

/// Per-node and per-pipe values produced by one propagation pass.
#[derive(Debug, Clone, Default)]
pub struct PropagationView {
    pub node_values: BTreeMap<String, f64>,
    pub pipe_values: BTreeMap<PipeKey, f64>,
}

impl Network {
    /// Theoretical demand arriving at `id` under the current configuration.
    ///
    /// Nodes the propagation never reaches report 0.
    pub fn demand_at(&self, id: &str) -> NetResult<f64> {
        self.node(id)?;
        let view = self.demand_closure();
        Ok(view.node_values.get(id).copied().unwrap_or(0.0))
    }

    /// Theoretical flow arriving at `id` under the current configuration.
    ///
    /// As a side effect the per-pipe results are written back to the live
    /// pipes' `flow` fields; capacities are never touched.
    pub fn flow_at(&mut self, id: &str) -> NetResult<f64> {
        self.node(id)?;
        let view = self.flow_closure()?;
        Ok(view.node_values.get(id).copied().unwrap_or(0.0))
    }

    /// Network-wide demand propagation: terminal demand aggregated upstream,
    /// split across a node's feeders in proportion to pipe capacity and
    /// capped at each pipe's capacity once the demand exceeds the total
    /// inbound capacity. A closed node forwards demand 0.
    pub fn demand_closure(&self) -> PropagationView {
        let mut view = PropagationView::default();
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();

        for node in self.nodes.values().filter(|n| n.is_terminal()) {
            queue.push_back(node.id().to_string());
            queued.insert(node.id().to_string());
        }

        while let Some(id) = queue.pop_front() {
            if let Some(demand) = self.nodes[&id].demand() {
                view.node_values.insert(id.clone(), demand);
            }
            if view.node_values.contains_key(&id) {
                self.spread_demand_upstream(&id, &mut view, &mut queue, &mut queued);
            } else {
                // not all outgoing pipes known yet
                queue.push_back(id);
            }
        }
        view
    }

    /// Network-wide flow propagation: source output distributed downstream
    /// in proportion to per-pipe demand share, with a node's flow clamped
    /// down to its theoretical demand before splitting. Writes the per-pipe
    /// results to the live pipes.
    pub fn flow_closure(&mut self) -> NetResult<PropagationView> {
        let demand = self.demand_closure();
        let mut view = PropagationView::default();
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();

        for node in self.nodes.values().filter(|n| n.is_source()) {
            queue.push_back(node.id().to_string());
            queued.insert(node.id().to_string());
        }

        while let Some(id) = queue.pop_front() {
            if let Some(output) = self.nodes[&id].output() {
                view.node_values.insert(id.clone(), output);
            }
            if view.node_values.contains_key(&id) {
                self.spread_flow_downstream(&id, &demand, &mut view, &mut queue, &mut queued)?;
            } else {
                queue.push_back(id);
            }
        }
        Ok(view)
    }

    fn spread_demand_upstream(
        &self,
        id: &str,
        view: &mut PropagationView,
        queue: &mut VecDeque<String>,
        queued: &mut HashSet<String>,
    ) {
        if !self.nodes[id].is_open() {
            view.node_values.insert(id.to_string(), 0.0);
        }

        let feeders: Vec<(String, f64)> = self
            .incoming
            .get(id)
            .map(|pred| {
                pred.iter()
                    .map(|from| (from.clone(), self.pipes[&pipe_key(from, id)].capacity()))
                    .collect()
            })
            .unwrap_or_default();
        let total_capacity: f64 = feeders.iter().map(|(_, c)| c).sum();
        let demand = view.node_values[id];

        for (feeder, capacity) in &feeders {
            let share = if demand > total_capacity {
                *capacity
            } else {
                demand * capacity / total_capacity
            };
            trace!(pipe = %format!("{feeder}-{id}"), share, "pipe demand resolved");
            view.pipe_values.insert(pipe_key(feeder, id), share);
            if queued.insert(feeder.clone()) {
                queue.push_back(feeder.clone());
            }
            // the feeder resolves once every one of its outgoing pipes is known
            if let Some(total) = self.sum_outgoing_if_known(feeder, view) {
                view.node_values.insert(feeder.clone(), total);
            }
        }
    }

    fn spread_flow_downstream(
        &mut self,
        id: &str,
        demand: &PropagationView,
        view: &mut PropagationView,
        queue: &mut VecDeque<String>,
        queued: &mut HashSet<String>,
    ) -> NetResult<()> {
        let node_demand = demand.node_values.get(id).copied().unwrap_or(0.0);
        let successors: Vec<String> = self.outgoing.get(id).cloned().unwrap_or_default();

        for to in &successors {
            let key = pipe_key(id, to);
            let pipe_demand = demand.pipe_values.get(&key).copied().unwrap_or(0.0);
            let mut share = 0.0;
            if node_demand > 0.0 {
                if let Some(flow) = view.node_values.get_mut(id) {
                    // water beyond the node's theoretical demand is not pushed
                    if node_demand < *flow {
                        *flow = node_demand;
                    }
                    share = *flow * pipe_demand / node_demand;
                }
            }
            trace!(pipe = %format!("{id}-{to}"), share, "pipe flow resolved");
            view.pipe_values.insert(key, share);
            self.pipe_mut(id, to)?.set_flow(share)?;

            if queued.insert(to.clone()) {
                queue.push_back(to.clone());
            }
            if let Some(total) = self.sum_incoming_if_known(to, view) {
                view.node_values.insert(to.clone(), total);
            }
        }
        Ok(())
    }

    /// Sum of `id`'s outgoing pipe values, or None while any is unknown.
    fn sum_outgoing_if_known(&self, id: &str, view: &PropagationView) -> Option<f64> {
        let mut total = 0.0;
        for to in self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            total += view.pipe_values.get(&pipe_key(id, to))?;
        }
        Some(total)
    }

    /// Sum of `id`'s incoming pipe values, or None while any is unknown.
    fn sum_incoming_if_known(&self, id: &str, view: &PropagationView) -> Option<f64> {
        let mut total = 0.0;
        for from in self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            total += view.pipe_values.get(&pipe_key(from, id))?;
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_core::GeoCoord;

    fn coord() -> GeoCoord {
        GeoCoord::new(41.0, 2.0).unwrap()
    }

    /// s -> j -> t, generous capacities.
    fn chain(demand: f64) -> Network {
        let mut net = Network::new();
        net.add_source("s", coord()).unwrap();
        net.add_junction("j", coord()).unwrap();
        net.add_terminal("t", coord(), 10.0).unwrap();
        net.connect("s", "j", 20.0).unwrap();
        net.connect("j", "t", 20.0).unwrap();
        net.set_terminal_demand("t", demand).unwrap();
        net
    }

    #[test]
    fn demand_travels_up_a_chain() {
        let net = chain(10.0);
        assert_eq!(net.demand_at("j").unwrap(), 10.0);
        assert_eq!(net.demand_at("s").unwrap(), 10.0);
        let view = net.demand_closure();
        assert_eq!(view.pipe_values[&("s".to_string(), "j".to_string())], 10.0);
    }

    #[test]
    fn demand_splits_by_capacity() {
        // two feeders into j: capacities 30 and 10 -> 3:1 split
        let mut net = Network::new();
        net.add_source("a", coord()).unwrap();
        net.add_source("b", coord()).unwrap();
        net.add_junction("j", coord()).unwrap();
        net.add_terminal("t", coord(), 20.0).unwrap();
        net.connect("a", "j", 30.0).unwrap();
        net.connect("b", "j", 10.0).unwrap();
        net.connect("j", "t", 40.0).unwrap();
        net.set_terminal_demand("t", 20.0).unwrap();

        assert_eq!(net.demand_at("a").unwrap(), 15.0);
        assert_eq!(net.demand_at("b").unwrap(), 5.0);
    }

    #[test]
    fn demand_is_capped_at_pipe_capacity() {
        // demand 50 over a total inbound capacity of 20: each feeder pipe
        // carries its full capacity
        let mut net = chain(10.0);
        net.set_terminal_demand("t", 50.0).unwrap();
        // j -> t pipe has capacity 20
        assert_eq!(net.demand_at("j").unwrap(), 20.0);
    }

    #[test]
    fn closed_node_forwards_zero_demand() {
        let mut net = chain(10.0);
        net.close_valve("j").unwrap();
        assert_eq!(net.demand_at("s").unwrap(), 0.0);
    }

    #[test]
    fn flow_follows_demand_and_stops_at_closed_valves() {
        let mut net = chain(10.0);
        net.set_source_output("s", 10.0).unwrap();
        assert_eq!(net.flow_at("t").unwrap(), 10.0);
        // the live pipes carry the propagated flow
        assert_eq!(net.pipe("j", "t").unwrap().flow(), 10.0);

        net.close_valve("j").unwrap();
        assert_eq!(net.flow_at("t").unwrap(), 0.0);
    }

    #[test]
    fn oversupply_is_clamped_to_demand() {
        let mut net = chain(10.0);
        net.set_source_output("s", 99.0).unwrap();
        assert_eq!(net.flow_at("t").unwrap(), 10.0);
    }

    #[test]
    fn undersupply_splits_proportionally_to_demand() {
        // j feeds t1 (demand 6) and t2 (demand 2); source delivers 4
        let mut net = Network::new();
        net.add_source("s", coord()).unwrap();
        net.add_junction("j", coord()).unwrap();
        net.add_terminal("t1", coord(), 10.0).unwrap();
        net.add_terminal("t2", coord(), 10.0).unwrap();
        net.connect("s", "j", 20.0).unwrap();
        net.connect("j", "t1", 20.0).unwrap();
        net.connect("j", "t2", 20.0).unwrap();
        net.set_terminal_demand("t1", 6.0).unwrap();
        net.set_terminal_demand("t2", 2.0).unwrap();
        net.set_source_output("s", 4.0).unwrap();

        assert_eq!(net.flow_at("t1").unwrap(), 3.0);
        assert_eq!(net.flow_at("t2").unwrap(), 1.0);
    }

    #[test]
    fn unreached_nodes_report_zero() {
        let mut net = chain(10.0);
        net.add_junction("island", coord()).unwrap();
        assert_eq!(net.demand_at("island").unwrap(), 0.0);
        assert_eq!(net.flow_at("island").unwrap(), 0.0);
    }
}
