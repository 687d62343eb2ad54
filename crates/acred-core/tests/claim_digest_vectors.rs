//! # Claim Digest Vectors
//!
//! Fixed claim digests. The issuer signs over these bytes, so any change to
//! canonicalization silently breaks every credential already issued. These
//! vectors pin the encoding: sorted keys, compact separators, no floats.

use acred_core::{Claim, ClaimerConfig, UpdateOrdering};
use serde_json::json;

fn digest_hex(value: serde_json::Value) -> String {
    Claim::new(value)
        .expect("claim should validate")
        .digest()
        .to_hex()
}

#[test]
fn single_string_attribute() {
    assert_eq!(
        digest_hex(json!({"age": "30"})),
        "a5197b52a9144be1bbf29ef03b548ddb63502de41cd9f940903f89a287de39a8"
    );
}

#[test]
fn nested_contents_with_unsorted_input() {
    assert_eq!(
        digest_hex(json!({"ctype": "kyc", "contents": {"name": "alice", "age": 30}})),
        "33c26bff359257efd6aa769722c752f922c173a8af38ce003f17bb37a70db77b"
    );
}

#[test]
fn arrays_null_and_booleans() {
    assert_eq!(
        digest_hex(json!({"c": true, "b": null, "a": [1, 2, 3]})),
        "1ea1efcf7c61be9eff65cdbdb3e91176f6e49bf866699dc957ae88b5b9807d85"
    );
}

#[test]
fn canonical_bytes_match_digest_input() {
    let claim = Claim::new(json!({"age": "30"})).unwrap();
    assert_eq!(claim.canonical_bytes().as_bytes(), br#"{"age":"30"}"#);
}

#[test]
fn serialized_claim_reparses_to_same_digest() {
    let claim = Claim::new(json!({"contents": {"age": 30}, "ctype": "kyc"})).unwrap();
    let text = serde_json::to_string(&claim).unwrap();
    let back: Claim = serde_json::from_str(&text).unwrap();
    assert_eq!(back.digest(), claim.digest());
}

#[test]
fn strict_ordering_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acred.yaml");
    std::fs::write(&path, "revocation:\n  ordering: strict\n").unwrap();
    let cfg = ClaimerConfig::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.revocation.ordering, UpdateOrdering::Strict);
}
