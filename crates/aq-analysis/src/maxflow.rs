//! Maximum-flow computation on a disposable working copy.
//!
//! The caller's network is cloned; a synthetic super-source feeds every
//! source of the origin's component and a synthetic super-sink drains every
//! terminal, both over infinite-capacity pipes. Augmenting paths are found
//! breadth-first (Edmonds–Karp order) and each one consumes capacity in
//! place on the copy. No residual back-edges are modelled, so pushed flow
//! is never undone and the copy's capacities are meaningless afterwards
//! except for display.

use std::collections::{HashMap, VecDeque};

use aq_core::GeoCoord;
use aq_network::Network;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::structure::component_of;

/// Id of the synthetic aggregated source in the working copy.
pub const SUPER_SOURCE: &str = "super-source";
/// Id of the synthetic aggregated sink in the working copy.
pub const SUPER_SINK: &str = "super-sink";

/// Result of a max-flow run.
#[derive(Debug, Clone)]
pub struct MaxFlowOutcome {
    /// Total flow pushed from the aggregated sources to the aggregated sink.
    pub total: f64,
    /// Bottleneck of each augmenting path, in discovery order.
    pub path_flows: Vec<f64>,
    /// The augmented working copy, its capacities consumed by the search.
    /// For renderer consumption only.
    pub network: Network,
}

/// Maximum flow through the component containing `origin`.
///
/// The caller's network is never mutated.
pub fn max_flow(net: &Network, origin: &str) -> AnalysisResult<MaxFlowOutcome> {
    let component = component_of(net, origin)?;
    let terminals: Vec<String> = component
        .iter()
        .filter(|id| net.node(id.as_str()).is_ok_and(|n| n.is_terminal()))
        .cloned()
        .collect();
    let sources: Vec<String> = component
        .iter()
        .filter(|id| net.node(id.as_str()).is_ok_and(|n| n.is_source()))
        .cloned()
        .collect();

    let mut work = net.clone();
    work.add_terminal(SUPER_SINK, GeoCoord::default(), 0.0)?;
    work.add_source(SUPER_SOURCE, GeoCoord::default())?;
    for terminal in &terminals {
        // sanctioned exception: the terminal becomes a junction in the copy
        work.connect_with(terminal, SUPER_SINK, f64::INFINITY, true)?;
    }
    for source in &sources {
        work.connect(SUPER_SOURCE, source, f64::INFINITY)?;
    }

    let mut total = 0.0;
    let mut path_flows = Vec::new();
    while let Some(path) = augmenting_path(&work, SUPER_SOURCE, SUPER_SINK)? {
        let bottleneck = path_bottleneck(&work, &path)?;
        for pair in path.windows(2) {
            let pipe = work.pipe_mut(&pair[0], &pair[1])?;
            let remaining = pipe.capacity() - bottleneck;
            pipe.set_capacity(remaining)?;
        }
        debug!(bottleneck, hops = path.len() - 1, "augmenting path applied");
        total += bottleneck;
        path_flows.push(bottleneck);
    }
    debug!(total, paths = path_flows.len(), "max flow computed");

    Ok(MaxFlowOutcome {
        total,
        path_flows,
        network: work,
    })
}

/// Breadth-first search for a source-to-sink path over pipes with positive
/// remaining capacity and open downstream valves.
fn augmenting_path(
    net: &Network,
    source: &str,
    sink: &str,
) -> AnalysisResult<Option<Vec<String>>> {
    let mut predecessor: HashMap<String, Option<String>> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    predecessor.insert(source.to_string(), None);
    queue.push_back(source.to_string());

    while let Some(id) = queue.pop_front() {
        if id == sink {
            let mut path = Vec::new();
            let mut cursor = Some(id);
            while let Some(step) = cursor {
                cursor = predecessor.get(&step).cloned().flatten();
                path.push(step);
            }
            path.reverse();
            return Ok(Some(path));
        }
        for pipe in net.outgoing(&id)? {
            let next = pipe.to_id();
            if predecessor.contains_key(next)
                || pipe.capacity() <= 0.0
                || !net.node(next)?.is_open()
            {
                continue;
            }
            predecessor.insert(next.to_string(), Some(id.clone()));
            queue.push_back(next.to_string());
        }
    }
    Ok(None)
}

/// Minimum capacity along `path`. The search predicate keeps non-positive
/// pipes out of paths; finding one anyway is an internal fault.
fn path_bottleneck(net: &Network, path: &[String]) -> AnalysisResult<f64> {
    let mut bottleneck = f64::INFINITY;
    for pair in path.windows(2) {
        let capacity = net.pipe(&pair[0], &pair[1])?.capacity();
        if capacity <= 0.0 {
            return Err(AnalysisError::InvalidPath {
                from: pair[0].clone(),
                to: pair[1].clone(),
                capacity,
            });
        }
        if capacity < bottleneck {
            bottleneck = capacity;
        }
    }
    Ok(bottleneck)
}
