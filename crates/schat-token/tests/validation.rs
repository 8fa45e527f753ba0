//! Issue/validate scenarios against a real 2-of-3 keyset

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use proptest::prelude::*;
use schat_core::ErrorKind;
use schat_testkit::{ControllableClock, TestKeyset};
use schat_threshold::ThresholdSigner;
use schat_token::{
    ClaimsBuilder, InMemoryRevocationStore, RevocationStore, SignedToken, TokenError,
    TokenIssuer, TokenValidator,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(3600);

struct Harness {
    clock: ControllableClock,
    revocations: Arc<InMemoryRevocationStore>,
    issuer: TokenIssuer,
    validator: TokenValidator,
}

fn harness_with(signer: Arc<ThresholdSigner>) -> Harness {
    let clock = ControllableClock::default();
    let revocations = Arc::new(InMemoryRevocationStore::new(clock.shared()));
    let issuer = TokenIssuer::new(ClaimsBuilder::new(clock.shared()), Arc::clone(&signer), TTL);
    let validator = TokenValidator::new(signer, revocations.clone(), clock.shared());
    Harness {
        clock,
        revocations,
        issuer,
        validator,
    }
}

fn harness() -> Harness {
    harness_with(TestKeyset::generate(3, 2).signer())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn claims(email: &str) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("email".to_string(), json!(email)),
        ("roles".to_string(), json!(["ROLE_USER"])),
    ])
}

#[tokio::test]
async fn issued_token_validates() {
    let h = harness();
    let issued = h.issuer.issue("alice", claims("alice@example.com")).await.unwrap();
    assert!(issued.wire.contains("::"));

    let validated = h.validator.validate(&issued.wire).await.unwrap();
    assert_eq!(validated.subject(), "alice");
    assert_eq!(validated.claims, issued.claims);
    assert_eq!(validated.claims.claim_str("email"), Some("alice@example.com"));
}

#[tokio::test]
async fn tokens_from_different_quorums_validate_alike() {
    let keys = TestKeyset::generate(3, 2);
    let low = harness_with(keys.signer_with_only(&[1, 2]));
    let high = harness_with(keys.signer_with_only(&[2, 3]));

    let from_low = low.issuer.issue("alice", BTreeMap::new()).await.unwrap();
    let from_high = high.issuer.issue("alice", BTreeMap::new()).await.unwrap();

    for validator in [&low.validator, &high.validator] {
        assert!(validator.validate(&from_low.wire).await.is_ok());
        assert!(validator.validate(&from_high.wire).await.is_ok());
    }
}

#[tokio::test]
async fn token_from_foreign_keyset_is_rejected() {
    let h = harness();
    let foreign = harness_with(TestKeyset::with_seed(3, 2, 99).signer());
    let issued = foreign.issuer.issue("mallory", BTreeMap::new()).await.unwrap();
    assert_matches!(
        h.validator.validate(&issued.wire).await,
        Err(TokenError::InvalidSignature)
    );
}

#[tokio::test]
async fn expiry_is_checked_after_signature() {
    let h = harness();
    let issued = h.issuer.issue("alice", BTreeMap::new()).await.unwrap();

    h.clock.advance(TTL);
    assert!(h.validator.validate(&issued.wire).await.is_ok());

    h.clock.advance(Duration::from_secs(1));
    let err = h.validator.validate(&issued.wire).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);
}

#[tokio::test]
async fn malformed_wire_forms_are_rejected() {
    let h = harness();
    let issued = h.issuer.issue("alice", BTreeMap::new()).await.unwrap();

    let dotted = issued.wire.replacen("::", ".", 1);
    assert_matches!(
        h.validator.validate(&dotted).await,
        Err(TokenError::MalformedToken(_))
    );
    assert_matches!(
        h.validator.validate("not-a-token").await,
        Err(TokenError::MalformedToken(_))
    );
}

#[tokio::test]
async fn signed_garbage_claims_are_malformed() {
    let h = harness();
    let signer = TestKeyset::generate(3, 2).signer();
    let payload = b"{\"hello\":\"world\"}".to_vec();
    let signature = signer.sign(&payload).await.unwrap();
    let wire = SignedToken {
        unsigned_part: payload,
        signature: signature.to_vec(),
    }
    .encode();
    assert_matches!(
        h.validator.validate(&wire).await,
        Err(TokenError::MalformedClaims(_))
    );
}

#[tokio::test]
async fn revocation_targets_one_token() {
    let h = harness();
    let first = h.issuer.issue("alice", BTreeMap::new()).await.unwrap();
    h.clock.advance(Duration::from_secs(1));
    let second = h.issuer.issue("alice", BTreeMap::new()).await.unwrap();
    assert_ne!(first.wire, second.wire);

    h.validator.revoke(&first.wire).await.unwrap();
    assert_matches!(
        h.validator.validate(&first.wire).await,
        Err(TokenError::Revoked)
    );
    assert!(h.validator.validate(&second.wire).await.is_ok());
}

#[tokio::test]
async fn revoking_unauthentic_token_fails() {
    let h = harness();
    let foreign = harness_with(TestKeyset::with_seed(3, 2, 7).signer());
    let issued = foreign.issuer.issue("alice", BTreeMap::new()).await.unwrap();
    assert_matches!(
        h.validator.revoke(&issued.wire).await,
        Err(TokenError::InvalidSignature)
    );
    assert!(h.revocations.is_empty());
}

#[tokio::test]
async fn revoking_expired_token_stores_nothing() {
    let h = harness();
    let issued = h.issuer.issue("alice", BTreeMap::new()).await.unwrap();
    h.clock.advance(TTL + Duration::from_secs(1));
    let revoked = h.validator.revoke(&issued.wire).await.unwrap();
    assert_eq!(revoked.claims.subject, "alice");
    assert_eq!(revoked.fingerprint, schat_token::Fingerprint::of(&issued.wire));
    assert!(h.revocations.is_empty());
}

#[tokio::test]
async fn concurrent_revocations_are_idempotent() {
    let h = Arc::new(harness());
    let issued = h.issuer.issue("alice", BTreeMap::new()).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let h = Arc::clone(&h);
            let wire = issued.wire.clone();
            async move { h.validator.revoke(&wire).await }
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        assert!(result.is_ok());
    }
    assert_eq!(h.revocations.len(), 1);
    let fingerprint = schat_token::Fingerprint::of(&issued.wire);
    assert!(h.revocations.is_blacklisted(&fingerprint).await.unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn round_trip_preserves_claims(
        subject in "[a-z][a-z0-9_]{0,15}",
        email in "[a-z]{1,8}@[a-z]{1,8}\\.com",
        party in 1u64..=3,
    ) {
        let rt = runtime();
        let h = harness();
        let mut extra = claims(&email);
        extra.insert("party".to_string(), json!(party));

        let issued = rt.block_on(h.issuer.issue(&subject, extra.clone())).unwrap();
        let validated = rt.block_on(h.validator.validate(&issued.wire)).unwrap();
        prop_assert_eq!(validated.subject(), subject.as_str());
        prop_assert_eq!(validated.claims.claims, extra);
    }

    #[test]
    fn any_bit_flip_is_detected(position in any::<prop::sample::Index>(), bit in 0u8..8) {
        let rt = runtime();
        let h = harness();
        let issued = rt.block_on(h.issuer.issue("alice", claims("alice@example.com"))).unwrap();
        let mut signed = SignedToken::decode(&issued.wire).unwrap();

        let total = signed.unsigned_part.len() + signed.signature.len();
        let at = position.index(total);
        if at < signed.unsigned_part.len() {
            signed.unsigned_part[at] ^= 1 << bit;
        } else {
            signed.signature[at - signed.unsigned_part.len()] ^= 1 << bit;
        }

        let result = rt.block_on(h.validator.validate(&signed.encode()));
        prop_assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
    }
}
