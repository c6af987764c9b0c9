//! Shape analyses: connected components, cycle and tree detection.
//!
//! Valve state plays no role here — a cycle is a static-topology property,
//! so closed valves still count as edges.

use std::collections::{HashSet, VecDeque};

use aq_network::Network;

use crate::error::AnalysisResult;

/// Undirected neighbor ids of `id`: successors and predecessors, deduped.
pub(crate) fn neighbors(net: &Network, id: &str) -> AnalysisResult<Vec<String>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for pipe in net.outgoing(id)? {
        if seen.insert(pipe.to_id().to_string()) {
            out.push(pipe.to_id().to_string());
        }
    }
    for pipe in net.incoming(id)? {
        if seen.insert(pipe.from_id().to_string()) {
            out.push(pipe.from_id().to_string());
        }
    }
    Ok(out)
}

/// The undirected connected component containing `origin`, in breadth-first
/// discovery order.
pub(crate) fn component_of(net: &Network, origin: &str) -> AnalysisResult<Vec<String>> {
    net.node(origin)?;
    let mut order = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    seen.insert(origin.to_string());
    queue.push_back(origin.to_string());
    while let Some(id) = queue.pop_front() {
        for next in neighbors(net, &id)? {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
        order.push(id);
    }
    Ok(order)
}

/// Whether the connected component containing `origin` has a directed
/// cycle. The search starts from every source in the component.
pub fn has_cycle(net: &Network, origin: &str) -> AnalysisResult<bool> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: HashSet<String> = HashSet::new();
    for id in component_of(net, origin)? {
        if net.node(&id)?.is_source() && dfs(net, &id, &mut visited, &mut stack)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Depth-first back-edge search along outgoing pipes.
fn dfs(
    net: &Network,
    id: &str,
    visited: &mut HashSet<String>,
    stack: &mut HashSet<String>,
) -> AnalysisResult<bool> {
    if stack.contains(id) {
        return Ok(true);
    }
    if !visited.insert(id.to_string()) {
        return Ok(false);
    }
    stack.insert(id.to_string());

    let successors: Vec<String> = net
        .outgoing(id)?
        .iter()
        .map(|p| p.to_id().to_string())
        .collect();
    for next in successors {
        if dfs(net, &next, visited, stack)? {
            return Ok(true);
        }
    }

    stack.remove(id);
    Ok(false)
}

/// Whether the connected component containing `origin` is a tree: no cycle,
/// and no reachable node with more than one inbound pipe.
pub fn is_tree(net: &Network, origin: &str) -> AnalysisResult<bool> {
    if has_cycle(net, origin)? {
        return Ok(false);
    }
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    seen.insert(origin.to_string());
    queue.push_back(origin.to_string());
    while let Some(id) = queue.pop_front() {
        for next in neighbors(net, &id)? {
            if net.incoming(&next)?.len() > 1 {
                return Ok(false);
            }
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    Ok(true)
}
