//! Demand/capacity analyses: minimum aggregate source flow and
//! capacity-violation detection.

use std::collections::{HashMap, HashSet, VecDeque};

use aq_network::{Network, PipeKey};
use tracing::debug;

use crate::error::AnalysisResult;
use crate::structure::neighbors;

/// Aggregate minimum the sources of `origin`'s component must supply so
/// that every terminal the water can reach gets at least `satisfied_pct`
/// percent of its peak demand.
///
/// Precondition: the component is acyclic and `satisfied_pct > 0`.
pub fn min_source_flow(
    net: &Network,
    origin: &str,
    satisfied_pct: f64,
) -> AnalysisResult<f64> {
    debug_assert!(satisfied_pct > 0.0);
    net.node(origin)?;

    let mut total = 0.0;
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    seen.insert(origin.to_string());
    queue.push_back(origin.to_string());

    while let Some(id) = queue.pop_front() {
        if let Some(peak) = net.node(&id)?.peak_demand() {
            total += peak * satisfied_pct / 100.0;
        }
        for next in neighbors(net, &id)? {
            // closed valves stop the water, and with it the obligation
            if !seen.contains(&next) && net.node(&next)?.is_open() {
                seen.insert(next.clone());
                queue.push_back(next);
            }
        }
    }
    Ok(total)
}

/// The subset of `candidates` that would carry more than their capacity if
/// the demand of every terminal in the component were to be satisfied.
/// Results come out in candidate order.
///
/// Precondition: the candidates belong to one acyclic component.
pub fn excess_pipes(net: &Network, candidates: &[PipeKey]) -> AnalysisResult<Vec<PipeKey>> {
    for (from, to) in candidates {
        net.pipe(from, to)?;
    }

    let (pipe_demand, sources) = demand_pass(net)?;
    let pipe_flow = flow_pass(net, &sources, &pipe_demand)?;

    let mut excess = Vec::new();
    for key in candidates {
        let flow = pipe_flow.get(key).copied().unwrap_or(0.0);
        let capacity = net.pipe(&key.0, &key.1)?.capacity();
        if flow > capacity {
            debug!(from = %key.0, to = %key.1, flow, capacity, "pipe over capacity");
            excess.push(key.clone());
        }
    }
    Ok(excess)
}

/// Upstream demand propagation seeded at every terminal with its current
/// demand. Closed feeders are pruned (they contribute demand 0); the split
/// across the open feeders is capacity-proportional and deliberately
/// uncapped, so over-capacity demand stays visible downstream.
///
/// Also reports the sources the propagation reached, in discovery order —
/// only those participate in the flow pass.
fn demand_pass(net: &Network) -> AnalysisResult<(HashMap<PipeKey, f64>, Vec<String>)> {
    let mut node_demand: HashMap<String, f64> = HashMap::new();
    let mut pipe_demand: HashMap<PipeKey, f64> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut queued: HashSet<String> = HashSet::new();
    let mut sources: Vec<String> = Vec::new();

    for node in net.nodes().filter(|n| n.is_terminal()) {
        node_demand.insert(node.id().to_string(), node.demand().unwrap_or(0.0));
        queue.push_back(node.id().to_string());
        queued.insert(node.id().to_string());
    }

    while let Some(id) = queue.pop_front() {
        if net.node(&id)?.is_source() && !sources.contains(&id) {
            sources.push(id.clone());
        }
        if !node_demand.contains_key(&id) {
            queue.push_back(id);
            continue;
        }

        let mut open_feeders: Vec<(String, f64)> = Vec::new();
        for pipe in net.incoming(&id)? {
            let from = pipe.from_id().to_string();
            if net.node(&from)?.is_open() {
                open_feeders.push((from, pipe.capacity()));
            } else {
                node_demand.insert(from.clone(), 0.0);
                pipe_demand.insert((from.clone(), id.clone()), 0.0);
                if queued.insert(from.clone()) {
                    queue.push_back(from);
                }
            }
        }

        let total_capacity: f64 = open_feeders.iter().map(|(_, c)| c).sum();
        let demand = node_demand[&id];
        for (from, capacity) in &open_feeders {
            let share = demand * capacity / total_capacity;
            pipe_demand.insert((from.clone(), id.clone()), share);
            if queued.insert(from.clone()) {
                queue.push_back(from.clone());
            }
            if let Some(total) = sum_outgoing_if_known(net, from, &pipe_demand)? {
                node_demand.insert(from.clone(), total);
            }
        }
    }
    Ok((pipe_demand, sources))
}

/// Downstream flow propagation seeded at the reached sources with their
/// configured outputs, split in proportion to per-pipe demand share. No
/// clamping: the point is to see where the water would not fit.
fn flow_pass(
    net: &Network,
    sources: &[String],
    pipe_demand: &HashMap<PipeKey, f64>,
) -> AnalysisResult<HashMap<PipeKey, f64>> {
    let mut node_flow: HashMap<String, f64> = HashMap::new();
    let mut pipe_flow: HashMap<PipeKey, f64> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut queued: HashSet<String> = HashSet::new();

    for id in sources {
        node_flow.insert(id.clone(), net.node(id)?.output().unwrap_or(0.0));
        queue.push_back(id.clone());
        queued.insert(id.clone());
    }

    while let Some(id) = queue.pop_front() {
        if !node_flow.contains_key(&id) {
            queue.push_back(id);
            continue;
        }

        let successors: Vec<String> = net
            .outgoing(&id)?
            .iter()
            .map(|p| p.to_id().to_string())
            .collect();
        let total_demand: f64 = successors
            .iter()
            .map(|to| {
                pipe_demand
                    .get(&(id.clone(), to.clone()))
                    .copied()
                    .unwrap_or(0.0)
            })
            .sum();
        let flow = node_flow[&id];

        for to in &successors {
            let demand = pipe_demand
                .get(&(id.clone(), to.clone()))
                .copied()
                .unwrap_or(0.0);
            let share = flow * demand / total_demand;
            pipe_flow.insert((id.clone(), to.clone()), share);
            if queued.insert(to.clone()) {
                queue.push_back(to.clone());
            }
            if let Some(total) = sum_incoming_if_known(net, to, &pipe_flow)? {
                node_flow.insert(to.clone(), total);
            }
        }
    }
    Ok(pipe_flow)
}

/// Sum of `id`'s outgoing pipe values, or None while any is unknown.
fn sum_outgoing_if_known(
    net: &Network,
    id: &str,
    values: &HashMap<PipeKey, f64>,
) -> AnalysisResult<Option<f64>> {
    let mut total = 0.0;
    for pipe in net.outgoing(id)? {
        match values.get(&(pipe.from_id().to_string(), pipe.to_id().to_string())) {
            Some(v) => total += v,
            None => return Ok(None),
        }
    }
    Ok(Some(total))
}

/// Sum of `id`'s incoming pipe values, or None while any is unknown.
fn sum_incoming_if_known(
    net: &Network,
    id: &str,
    values: &HashMap<PipeKey, f64>,
) -> AnalysisResult<Option<f64>> {
    let mut total = 0.0;
    for pipe in net.incoming(id)? {
        match values.get(&(pipe.from_id().to_string(), pipe.to_id().to_string())) {
            Some(v) => total += v,
            None => return Ok(None),
        }
    }
    Ok(Some(total))
}
