//! The YAML files under `config/` must always load.

use std::path::PathBuf;

use adforge_core::{load_backends, load_policy, BackendClass, ScoringPolicy, UserTier};

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

#[test]
fn shipped_backends_load() {
    let file = load_backends(&config_path("backends.yaml")).expect("backends.yaml should load");
    assert!(file.backends.iter().any(|b| b.class == BackendClass::Vps));
    assert!(file
        .backends
        .iter()
        .any(|b| b.min_tier == UserTier::Pro && b.quality_score > 0.9));
    assert!(file.backends.iter().all(|b| b.endpoint.is_some()));
}

#[test]
fn shipped_policy_matches_defaults() {
    let policy = load_policy(&config_path("policy.yaml")).expect("policy.yaml should load");
    assert_eq!(policy, ScoringPolicy::default());
}
