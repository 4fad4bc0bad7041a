// Transport: start-once semantics, periodic firing and the
// identical-instant collision rejection.

use reverie_core::{CadenceRole, EngineError, Transport};

#[test]
fn arm_requires_a_running_transport() {
    let mut transport = Transport::new();
    let err = transport
        .arm(CadenceRole::Melodic, 1.0, 0.1, 0.0)
        .unwrap_err();
    assert!(matches!(err, EngineError::Scheduling(_)));
}

#[test]
fn identical_instant_arming_is_rejected() {
    let mut transport = Transport::new();
    transport.start(0.0);
    transport
        .arm(CadenceRole::Melodic, 2.0, 0.2, 0.0)
        .expect("first cadence");
    let err = transport
        .arm(CadenceRole::Ambience, 5.0, 0.2, 0.0)
        .unwrap_err();
    assert!(matches!(err, EngineError::Scheduling(_)));
    assert_eq!(transport.armed(), 1);
}

#[test]
fn staggered_offsets_arm_cleanly() {
    let mut transport = Transport::new();
    transport.start(0.0);
    transport
        .arm(CadenceRole::Melodic, 2.0, 0.1, 0.0)
        .expect("melodic");
    transport
        .arm(CadenceRole::Ambience, 5.0, 0.3, 0.0)
        .expect("ambience");
    assert_eq!(transport.armed(), 2);
}

#[test]
fn tick_drains_due_fires_in_periodic_order() {
    let mut transport = Transport::new();
    transport.start(0.0);
    transport.arm(CadenceRole::Melodic, 1.0, 0.1, 0.0).unwrap();

    let mut fires = Vec::new();
    transport.tick(0.05, &mut fires);
    assert!(fires.is_empty(), "nothing due before the arm offset");

    transport.tick(3.15, &mut fires);
    assert_eq!(fires.len(), 4);
    for (i, fire) in fires.iter().enumerate() {
        assert!((fire.at_sec - (0.1 + i as f64)).abs() < 1e-9);
        assert_eq!(fire.role, CadenceRole::Melodic);
    }
}

#[test]
fn tick_is_silent_when_stopped() {
    let mut transport = Transport::new();
    transport.start(0.0);
    transport.arm(CadenceRole::Ambience, 1.0, 0.3, 0.0).unwrap();
    transport.stop();

    let mut fires = Vec::new();
    transport.tick(10.0, &mut fires);
    assert!(fires.is_empty());
    assert_eq!(transport.armed(), 0, "stop disarms the session cadences");
}

#[test]
fn start_and_stop_are_once_per_session() {
    let mut transport = Transport::new();
    transport.start(0.0);
    transport.start(1.0); // collapses into the running session
    assert!(transport.is_running());
    transport.stop();
    transport.stop();
    assert!(!transport.is_running());

    // a fresh session can start the clock again
    transport.start(2.0);
    assert!(transport.is_running());
}

#[test]
fn disarm_all_keeps_the_clock_running() {
    let mut transport = Transport::new();
    transport.start(0.0);
    transport.arm(CadenceRole::Melodic, 1.0, 0.1, 0.0).unwrap();
    transport.disarm_all();
    assert!(transport.is_running());
    assert_eq!(transport.armed(), 0);
}
