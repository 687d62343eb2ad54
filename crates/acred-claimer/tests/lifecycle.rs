//! End-to-end claimer lifecycle against the mock issuer: key derivation,
//! issuance, presentation, witness maintenance and revocation.

use acred_claimer::{
    AttestedClaim, AttributeRequest, Claimer, CombinedPresentationRequest, IssuerRequest,
    KeyMaterial, PresentationRequest, SessionPhase,
};
use acred_core::{Claim, ClaimerConfig, ClaimerError, ErrorClass, UpdateOrdering};
use acred_engine::{Challenge, MockEngine, MockIssuer};
use proptest::prelude::*;
use serde_json::json;

const PHRASE: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";

fn claimer() -> Claimer<MockEngine> {
    Claimer::new(KeyMaterial::from_mnemonic(PHRASE, "").unwrap(), MockEngine)
}

fn issue(claimer: &Claimer<MockEngine>, issuer: &MockIssuer, claim: serde_json::Value) -> AttestedClaim {
    let hs = issuer.start_session().unwrap();
    let (mut session, request) = claimer
        .request_attestation(issuer.public_key(), &hs, Claim::new(claim).unwrap())
        .unwrap();
    let sig = issuer.issue(&request).unwrap();
    claimer.build_credential(&mut session, &sig).unwrap()
}

fn request(attrs: &[&str], nonce: u8) -> PresentationRequest {
    PresentationRequest {
        attributes: AttributeRequest {
            requested_attributes: attrs.iter().map(|a| a.to_string()).collect(),
            require_non_revocation: true,
            updated_after: None,
        },
        challenge: Challenge {
            context: "age-check".into(),
            nonce: vec![nonce; 32],
        },
    }
}

#[test]
fn issue_present_update_revoke() {
    let claimer = claimer();
    let mut issuer = MockIssuer::new("kyc").unwrap();
    let mut cred = issue(&claimer, &issuer, json!({"age": "30", "name": "alice"}));

    let p = claimer
        .build_presentation(&cred, &request(&["age"], 1), issuer.public_key())
        .unwrap();
    assert_eq!(p.disclosed.len(), 1);
    assert_eq!(p.disclosed["age"], json!("30"));
    assert!(p.non_revocation.is_some());

    // Someone else is revoked; the witness advances and still proves.
    let other = claimer_with_seed(7);
    let handshake = issuer.start_session().unwrap();
    let (_, other_request) = other
        .request_attestation(
            issuer.public_key(),
            &handshake,
            Claim::new(json!({"age": "41"})).unwrap(),
        )
        .unwrap();
    let update = issuer
        .revoke(&[MockIssuer::handle_for(&other_request)])
        .unwrap();
    let summary = cred.update(&MockEngine, issuer.public_key(), &update).unwrap();
    assert_eq!(summary.applied, 1);
    assert!(claimer
        .build_presentation(&cred, &request(&["age"], 2), issuer.public_key())
        .is_ok());

    // Now this credential is revoked.
    let handle = cred.witness().unwrap().handle;
    let revoke_me = issuer.revoke(&[handle]).unwrap();
    let before = cred.clone();
    let err = cred
        .update(&MockEngine, issuer.public_key(), &revoke_me)
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Verification);
    assert_eq!(cred, before);
}

fn claimer_with_seed(seed: u8) -> Claimer<MockEngine> {
    let exported = format!(r#"{{"master_secret":"{}"}}"#, acred_core::hex::encode(&[seed; 32]));
    Claimer::new(KeyMaterial::import(&exported).unwrap(), MockEngine)
}

#[test]
fn session_yields_one_credential() {
    let claimer = claimer();
    let issuer = MockIssuer::new("kyc").unwrap();
    let hs = issuer.start_session().unwrap();
    let (mut session, request) = claimer
        .request_attestation(issuer.public_key(), &hs, Claim::new(json!({"age": "30"})).unwrap())
        .unwrap();
    let sig = issuer.issue(&request).unwrap();
    claimer.build_credential(&mut session, &sig).unwrap();
    assert_eq!(session.phase(), SessionPhase::CredentialAssembled);
    assert!(matches!(
        claimer.build_credential(&mut session, &sig),
        Err(ClaimerError::SessionAlreadyConsumed)
    ));
}

#[test]
fn signature_under_another_key_is_rejected() {
    let claimer = claimer();
    let issuer = MockIssuer::new("kyc").unwrap();
    let impostor = MockIssuer::new("kyc").unwrap();
    let hs = issuer.start_session().unwrap();
    let (mut session, request) = claimer
        .request_attestation(issuer.public_key(), &hs, Claim::new(json!({"age": "30"})).unwrap())
        .unwrap();

    let mut redirected = request.clone();
    redirected.issuer = impostor.public_key().fingerprint();
    let forged = impostor.issue(&redirected).unwrap();
    let err = claimer.build_credential(&mut session, &forged).unwrap_err();
    assert!(matches!(err, ClaimerError::SignatureMismatch(_)));
    assert_eq!(session.phase(), SessionPhase::SessionOpen);
}

#[test]
fn signature_over_another_claim_is_rejected() {
    let claimer = claimer();
    let issuer = MockIssuer::new("kyc").unwrap();
    let hs = issuer.start_session().unwrap();
    let (mut session, request) = claimer
        .request_attestation(issuer.public_key(), &hs, Claim::new(json!({"age": "30"})).unwrap())
        .unwrap();
    let mut inflated = request.clone();
    inflated.claim = Claim::new(json!({"age": "99"})).unwrap();
    let sig = issuer.issue(&inflated).unwrap();
    assert!(matches!(
        claimer.build_credential(&mut session, &sig),
        Err(ClaimerError::SignatureMismatch(_))
    ));
}

#[test]
fn restored_mnemonic_key_can_present() {
    let issuer = MockIssuer::new("kyc").unwrap();
    let cred = issue(&claimer(), &issuer, json!({"age": "30"}));
    // The same mnemonic and password restore a claimer able to present.
    let restored = claimer();
    assert!(restored
        .build_presentation(&cred, &request(&["age"], 3), issuer.public_key())
        .is_ok());
}

#[test]
fn combined_presentation_across_issuers() {
    let claimer = claimer();
    let kyc = MockIssuer::new("kyc").unwrap();
    let bank = MockIssuer::new("bank").unwrap().without_revocation();
    let creds = vec![
        issue(&claimer, &kyc, json!({"contents": {"age": 30}})),
        issue(&claimer, &bank, json!({"iban": "DE00", "balance": 10})),
    ];
    let keys = vec![kyc.public_key().clone(), bank.public_key().clone()];
    let combined = CombinedPresentationRequest {
        challenge: Challenge {
            context: "loan".into(),
            nonce: vec![9; 32],
        },
        requests: vec![
            IssuerRequest {
                issuer: kyc.public_key().fingerprint(),
                attributes: AttributeRequest {
                    requested_attributes: vec!["contents.age".into()],
                    require_non_revocation: true,
                    updated_after: None,
                },
            },
            IssuerRequest {
                issuer: bank.public_key().fingerprint(),
                attributes: AttributeRequest {
                    requested_attributes: vec!["iban".into()],
                    ..Default::default()
                },
            },
        ],
    };
    let p = claimer
        .build_combined_presentation(&creds, &combined, &keys)
        .unwrap();
    assert!(p.parts[0].non_revocation.is_some());
    assert!(p.parts[1].non_revocation.is_none());
    assert_eq!(p.parts[1].disclosed.len(), 1);

    let err = claimer
        .build_combined_presentation(&creds[..1], &combined, &keys)
        .unwrap_err();
    assert!(matches!(err, ClaimerError::ArityMismatch(_)));
}

#[test]
fn strict_ordering_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claimer.yaml");
    std::fs::write(&path, "revocation:\n  ordering: strict\n").unwrap();
    let config = ClaimerConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.revocation.ordering, UpdateOrdering::Strict);

    let claimer = claimer();
    let mut issuer = MockIssuer::new("kyc").unwrap();
    let cred = issue(&claimer, &issuer, json!({"age": "30"}));
    let u1 = issuer.revoke(&[]).unwrap();
    let u2 = issuer.revoke(&[]).unwrap();

    let mut strict = cred.clone();
    assert!(strict
        .update_all(&MockEngine, issuer.public_key(), &[u2.clone(), u1.clone()], config.revocation.ordering)
        .is_err());
    assert_eq!(strict, cred);
    assert!(strict
        .update_all(&MockEngine, issuer.public_key(), &[u1, u2], config.revocation.ordering)
        .is_ok());
    assert_eq!(strict.update_counter(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Applying any prefix of published updates, in any order, lands on the
    /// same witness as applying them one by one.
    #[test]
    fn update_all_matches_sequential_updates(
        total in 1usize..6,
        order in proptest::collection::vec(any::<u8>(), 6),
    ) {
        let claimer = claimer();
        let mut issuer = MockIssuer::from_seed("kyc", &[total as u8]);
        let cred = issue(&claimer, &issuer, json!({"age": "30"}));
        let updates: Vec<_> = (0..total).map(|_| issuer.revoke(&[]).unwrap()).collect();

        let mut sequential = cred.clone();
        for u in &updates {
            sequential.update(&MockEngine, issuer.public_key(), u).unwrap();
        }

        let mut shuffled = updates.clone();
        shuffled.sort_by_key(|u| order[(u.accumulator_index as usize - 1) % order.len()]);
        let mut batched = cred.clone();
        batched
            .update_all(&MockEngine, issuer.public_key(), &shuffled, UpdateOrdering::Reorder)
            .unwrap();

        prop_assert_eq!(sequential.witness(), batched.witness());
        prop_assert_eq!(batched.update_counter(), total as u64);
    }
}
