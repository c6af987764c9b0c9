//! Valve-closure inference from arrival observations.
//!
//! Field crews report, for some terminals, whether water actually arrives.
//! When a report disagrees with what the current valve configuration
//! predicts, the closest valve whose closure isolates exactly the
//! disagreeing part of the tree is the one to shut.

use std::collections::{BTreeMap, BTreeSet};

use aq_network::Network;
use tracing::debug;

use crate::error::AnalysisResult;

/// What a subtree's observed terminals say about the current configuration.
#[derive(Debug, Clone, Copy, Default)]
struct SubtreeObservation {
    has_coherent: bool,
    has_incoherent: bool,
}

/// Nodes whose valves should be closed so the network becomes coherent
/// with `observations` (terminal id → water observed to arrive).
///
/// Precondition: the network is a tree and every observed terminal belongs
/// to it.
pub fn valves_to_close(
    net: &Network,
    observations: &BTreeMap<String, bool>,
) -> AnalysisResult<BTreeSet<String>> {
    // verdict per observed terminal: incoherent with the current valves?
    let mut verdicts: BTreeMap<String, bool> = BTreeMap::new();
    for (terminal, arrives) in observations {
        net.node(terminal)?;
        let blocked = closed_valve_on_root_path(net, terminal)?;
        // arriving water with a blocked path, or missing water with a clear
        // one, contradicts the configuration
        verdicts.insert(terminal.clone(), blocked == *arrives);
    }

    let mut to_close: BTreeSet<String> = BTreeSet::new();
    for (terminal, incoherent) in &verdicts {
        if !incoherent {
            continue;
        }
        let point = isolation_point(net, terminal, &verdicts)?;
        let chosen = point.unwrap_or_else(|| terminal.clone());
        debug!(terminal = %terminal, valve = %chosen, "incoherent terminal isolated");
        to_close.insert(chosen);
    }
    Ok(to_close)
}

/// Whether any valve on the path from `id` up to the root is closed, `id`'s
/// own valve included.
fn closed_valve_on_root_path(net: &Network, id: &str) -> AnalysisResult<bool> {
    let mut current = Some(id.to_string());
    while let Some(id) = current {
        if !net.node(&id)?.is_open() {
            return Ok(true);
        }
        current = parent(net, &id)?;
    }
    Ok(false)
}

/// The single feeder of `id` in a tree-shaped network.
fn parent(net: &Network, id: &str) -> AnalysisResult<Option<String>> {
    Ok(net.incoming(id)?.last().map(|p| p.from_id().to_string()))
}

/// Climb from an incoherent leaf toward the root and return the first
/// ancestor whose subtree holds both a coherent and an incoherent observed
/// terminal — closing it cuts off the fault without touching coherent
/// siblings. None when no ancestor qualifies.
fn isolation_point(
    net: &Network,
    leaf: &str,
    verdicts: &BTreeMap<String, bool>,
) -> AnalysisResult<Option<String>> {
    let mut current = Some(leaf.to_string());
    while let Some(id) = current {
        if !net.outgoing(&id)?.is_empty() {
            let obs = observe_subtree(net, &id, verdicts)?;
            if obs.has_coherent && obs.has_incoherent {
                return Ok(Some(id));
            }
        }
        current = parent(net, &id)?;
    }
    Ok(None)
}

/// Bottom-up composition over the children of `id`: an observed child
/// contributes its own verdict, an unobserved child its subtree's.
fn observe_subtree(
    net: &Network,
    id: &str,
    verdicts: &BTreeMap<String, bool>,
) -> AnalysisResult<SubtreeObservation> {
    let mut obs = SubtreeObservation::default();
    for pipe in net.outgoing(id)? {
        let child = pipe.to_id();
        let child_obs = match verdicts.get(child) {
            Some(&incoherent) => SubtreeObservation {
                has_coherent: !incoherent,
                has_incoherent: incoherent,
            },
            None => observe_subtree(net, child, verdicts)?,
        };
        obs.has_coherent |= child_obs.has_coherent;
        obs.has_incoherent |= child_obs.has_incoherent;
        if obs.has_coherent && obs.has_incoherent {
            break;
        }
    }
    Ok(obs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_core::GeoCoord;

    fn coord() -> GeoCoord {
        GeoCoord::new(41.0, 2.0).unwrap()
    }

    /// s -> a -> {t1, t2}
    fn fork() -> Network {
        let mut net = Network::new();
        net.add_source("s", coord()).unwrap();
        net.add_junction("a", coord()).unwrap();
        net.add_terminal("t1", coord(), 5.0).unwrap();
        net.add_terminal("t2", coord(), 5.0).unwrap();
        net.connect("s", "a", 10.0).unwrap();
        net.connect("a", "t1", 10.0).unwrap();
        net.connect("a", "t2", 10.0).unwrap();
        net
    }

    fn observations(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs
            .iter()
            .map(|(id, arrives)| (id.to_string(), *arrives))
            .collect()
    }

    #[test]
    fn coherent_reports_close_nothing() {
        let net = fork();
        let result =
            valves_to_close(&net, &observations(&[("t1", true), ("t2", true)])).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn split_reports_isolate_the_fork() {
        let net = fork();
        let result =
            valves_to_close(&net, &observations(&[("t1", true), ("t2", false)])).unwrap();
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn all_incoherent_reports_fall_back_to_the_leaves() {
        let net = fork();
        let result =
            valves_to_close(&net, &observations(&[("t1", false), ("t2", false)])).unwrap();
        assert_eq!(
            result.into_iter().collect::<Vec<_>>(),
            vec!["t1", "t2"]
        );
    }

    #[test]
    fn closed_valve_flips_the_verdict() {
        let mut net = fork();
        net.close_valve("a").unwrap();
        // with a closed on the path, missing water is coherent and arriving
        // water is not
        let result =
            valves_to_close(&net, &observations(&[("t1", true), ("t2", false)])).unwrap();
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn deeper_fault_is_isolated_below_the_root() {
        // s -> a -> {t1, b}, b -> {t2, t3}
        let mut net = Network::new();
        net.add_source("s", coord()).unwrap();
        net.add_junction("a", coord()).unwrap();
        net.add_junction("b", coord()).unwrap();
        net.add_terminal("t1", coord(), 5.0).unwrap();
        net.add_terminal("t2", coord(), 5.0).unwrap();
        net.add_terminal("t3", coord(), 5.0).unwrap();
        net.connect("s", "a", 10.0).unwrap();
        net.connect("a", "t1", 10.0).unwrap();
        net.connect("a", "b", 10.0).unwrap();
        net.connect("b", "t2", 10.0).unwrap();
        net.connect("b", "t3", 10.0).unwrap();

        let result = valves_to_close(
            &net,
            &observations(&[("t1", true), ("t2", false), ("t3", true)]),
        )
        .unwrap();
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec!["b"]);
    }
}
