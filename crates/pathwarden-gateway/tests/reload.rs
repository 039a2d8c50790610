#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::path::Path;

use pathwarden_core::{Method, PathwardenError, Verdict};
use pathwarden_gateway::app_state::AppState;
use pathwarden_gateway::config;

const POKEDEX: &str = r#"
clientID: pokedex
mode: allow
paths:
  - path: /api/pokemon/.*
    methods: get
"#;

const TRAINER: &str = r#"
clientID: trainer
mode: deny
paths:
  - /api/encounter
"#;

fn state_for(dir: &Path) -> AppState {
    let yaml = format!("version: 1\nauthz:\n  clients_dir: '{}'\n", dir.display());
    AppState::load(config::load_from_str(&yaml).unwrap()).unwrap()
}

fn failed_reloads(state: &AppState) -> u64 {
    state.metrics().reloads.get(&[("result", "failed")])
}

#[test]
fn load_reads_clients_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pokedex.yaml"), POKEDEX).unwrap();

    let state = state_for(dir.path());
    assert_eq!(state.registry().client_ids(), ["pokedex"]);
    assert_eq!(
        state.decide("h", Some("pokedex"), "/api/pokemon/ditto", Method::Get).unwrap(),
        Verdict::Allowed
    );
}

#[test]
fn load_fails_on_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        "version: 1\nauthz:\n  clients_dir: '{}'\n",
        dir.path().join("absent").display()
    );
    let err = AppState::load(config::load_from_str(&yaml).unwrap()).err().unwrap();
    assert!(matches!(err, PathwardenError::Io(_)));
}

#[test]
fn reload_swaps_in_new_registry() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pokedex.yaml"), POKEDEX).unwrap();
    let state = state_for(dir.path());
    let before = state.registry();

    fs::write(dir.path().join("trainer.yaml"), TRAINER).unwrap();
    assert_eq!(state.reload().unwrap(), 2);

    assert_eq!(state.registry().client_ids(), ["pokedex", "trainer"]);
    assert!(state.decide("h", Some("trainer"), "/api/encounter", Method::Post).is_err());
    assert_eq!(state.metrics().reloads.get(&[("result", "ok")]), 1);
    // snapshots taken before the swap are untouched
    assert_eq!(before.client_ids(), ["pokedex"]);
}

#[test]
fn reload_keeps_previous_registry_when_dir_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let clients = dir.path().join("clients");
    fs::create_dir(&clients).unwrap();
    fs::write(clients.join("pokedex.yaml"), POKEDEX).unwrap();
    let state = state_for(&clients);

    fs::remove_dir_all(&clients).unwrap();
    assert!(state.reload().is_err());

    assert_eq!(state.registry().client_ids(), ["pokedex"]);
    assert_eq!(failed_reloads(&state), 1);
    assert!(matches!(
        state.decide("h", Some("stranger"), "/", Method::Get),
        Err(PathwardenError::UnknownClient(_))
    ));
}

#[test]
fn reload_never_falls_back_to_passthrough() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pokedex.yaml"), POKEDEX).unwrap();
    let state = state_for(dir.path());

    fs::write(dir.path().join("pokedex.yaml"), "mode: allow\n").unwrap();
    let err = state.reload().unwrap_err();
    assert!(matches!(err, PathwardenError::Config(_)));

    assert_eq!(failed_reloads(&state), 1);
    assert_eq!(state.registry().len(), 1);
    assert!(matches!(
        state.decide("h", Some("stranger"), "/", Method::Get),
        Err(PathwardenError::UnknownClient(_))
    ));
}

#[test]
fn reload_of_empty_dir_stays_passthrough() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_for(dir.path());
    assert!(state.registry().is_empty());

    assert_eq!(state.reload().unwrap(), 0);
    assert_eq!(
        state.decide("h", Some("anyone"), "/", Method::Get).unwrap(),
        Verdict::Passthrough
    );
}
