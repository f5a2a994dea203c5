use super::*;
use shared::error::ErrorCode;

fn machine() -> StateMachine {
    StateMachine::new(["processing", "done", "failed"]).expect("states")
}

#[test]
fn collector_is_prepended() {
    assert_eq!(
        machine().states(),
        ["collector", "processing", "done", "failed"]
    );
    assert_eq!(machine().configured(), ["processing", "done", "failed"]);
    assert_eq!(machine().collector_name(), "collector");
}

#[test]
fn next_state_chain_visits_each_state_once_then_stops() {
    let machine = machine();
    let mut visited = Vec::new();
    let mut current = COLLECTOR.to_string();
    while let Some(next) = machine.next_state(&current).expect("known state") {
        visited.push(next.to_string());
        current = next.to_string();
    }
    assert_eq!(visited, machine.configured());
}

#[test]
fn next_state_of_last_is_none() {
    assert_eq!(machine().next_state("failed").expect("known"), None);
    assert_eq!(machine().next_state("processing").expect("known"), Some("done"));
}

#[test]
fn next_state_of_unknown_state_fails() {
    let err = machine().next_state("invalidState").expect_err("unknown");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[test]
fn empty_configuration_leaves_only_collector() {
    let machine = StateMachine::new(Vec::<String>::new()).expect("states");
    assert_eq!(machine.states(), ["collector"]);
    assert_eq!(machine.next_state(COLLECTOR).expect("collector"), None);
}

#[test]
fn rejects_bad_configurations() {
    for states in [
        vec!["a", "a"],
        vec!["collector"],
        vec![""],
        vec!["with:colon"],
    ] {
        let err = StateMachine::new(states.clone()).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidConfig, "states: {states:?}");
    }
}

#[test]
fn validate_accepts_collector_and_configured_states() {
    let machine = machine();
    assert_eq!(machine.validate("collector").expect("collector"), "collector");
    assert_eq!(machine.validate("done").expect("done"), "done");
    assert!(machine.validate("Done").is_err());
}
