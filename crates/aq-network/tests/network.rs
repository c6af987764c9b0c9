//! Integration tests for aq-network.

use aq_core::GeoCoord;
use aq_network::{NetError, Network};

fn coord() -> GeoCoord {
    GeoCoord::new(41.98, 2.82).unwrap()
}

/// s -> j -> t(peak 10) with generous capacities.
fn chain() -> Network {
    let mut net = Network::new();
    net.add_source("s", coord()).unwrap();
    net.add_junction("j", coord()).unwrap();
    net.add_terminal("t", coord(), 10.0).unwrap();
    net.connect("s", "j", 20.0).unwrap();
    net.connect("j", "t", 20.0).unwrap();
    net
}

#[test]
fn demand_reaches_the_source_side() {
    let mut net = chain();
    net.set_terminal_demand("t", 10.0).unwrap();

    assert_eq!(net.demand_at("j").unwrap(), 10.0);
    let view = net.demand_closure();
    assert_eq!(view.pipe_values[&("s".to_string(), "j".to_string())], 10.0);
}

#[test]
fn closing_the_middle_valve_cuts_the_flow() {
    let mut net = chain();
    net.set_terminal_demand("t", 10.0).unwrap();
    net.set_source_output("s", 500.0).unwrap();
    net.close_valve("j").unwrap();
    assert_eq!(net.flow_at("t").unwrap(), 0.0);
}

#[test]
fn invalid_writes_leave_state_unchanged() {
    let mut net = chain();
    let before = net.pipe("s", "j").unwrap().capacity();

    let err = net.pipe_mut("s", "j").unwrap().set_capacity(-3.0);
    assert!(matches!(err, Err(NetError::InvalidCapacity { .. })));
    assert_eq!(net.pipe("s", "j").unwrap().capacity(), before);

    assert!(net.set_source_output("s", -1.0).is_err());
    assert_eq!(net.node("s").unwrap().output(), Some(0.0));
}

#[test]
fn deep_copy_is_independent() {
    let mut net = chain();
    net.set_terminal_demand("t", 10.0).unwrap();
    net.set_source_output("s", 10.0).unwrap();
    net.flow_at("t").unwrap();

    let mut copy = net.clone();
    copy.pipe_mut("s", "j").unwrap().set_capacity(1.0).unwrap();
    copy.pipe_mut("j", "t").unwrap().set_flow(0.25).unwrap();
    copy.close_valve("j").unwrap();

    assert_eq!(net.pipe("s", "j").unwrap().capacity(), 20.0);
    assert_eq!(net.pipe("j", "t").unwrap().flow(), 10.0);
    assert!(net.node("j").unwrap().is_open());
}

#[test]
fn subscriber_flow_reads_the_offtake() {
    let mut net = chain();
    net.set_terminal_demand("t", 10.0).unwrap();
    net.set_source_output("s", 10.0).unwrap();
    net.subscribe("alice", "t").unwrap();

    assert_eq!(net.subscriber_flow("alice").unwrap(), 10.0);
    assert_eq!(net.subscriber_flow("nobody").unwrap(), 0.0);
}

#[test]
fn unknown_lookups_are_notfound_errors() {
    let net = chain();
    assert!(matches!(
        net.node("ghost"),
        Err(NetError::UnknownNode { .. })
    ));
    assert!(matches!(
        net.pipe("s", "t"),
        Err(NetError::UnknownPipe { .. })
    ));
    assert!(matches!(
        net.outgoing("ghost"),
        Err(NetError::UnknownNode { .. })
    ));
}

#[test]
fn outgoing_and_incoming_list_the_right_pipes() {
    let net = chain();
    let out: Vec<_> = net
        .outgoing("j")
        .unwrap()
        .iter()
        .map(|p| p.to_id().to_string())
        .collect();
    assert_eq!(out, vec!["t"]);
    let inc: Vec<_> = net
        .incoming("j")
        .unwrap()
        .iter()
        .map(|p| p.from_id().to_string())
        .collect();
    assert_eq!(inc, vec!["s"]);
}
