// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for signature verification
//!
//! - Only verified bytes are ever adopted
//! - Any decoding or verification failure means "not trusted"

use proptest::prelude::*;
use stampsync_core::source::{
    check_signature, PublicKey, Signature, SignatureError, Source, SourceError,
};
use tempfile::TempDir;

use super::support::{cache_path, config, signer, write_cache};

#[test]
fn test_verify_detached_returns_content() {
    let key = signer(1);
    let sig = key.sign(b"list", "c");
    let content = key
        .public_key()
        .verify_detached(b"list".to_vec(), sig.clone().into_bytes())
        .unwrap();

    assert_eq!(content.bytes(), b"list");
    assert_eq!(content.signature(), sig.as_bytes());
}

#[test]
fn test_truncated_signature_rejected() {
    let key = signer(2);
    let sig = key.sign(b"list", "c");
    let truncated: String = sig.lines().take(2).collect::<Vec<_>>().join("\n");

    assert!(matches!(
        check_signature(&key.public_key(), b"list", truncated.as_bytes()),
        Err(SignatureError::Malformed(_))
    ));
}

#[test]
fn test_signature_from_other_key_rejected() {
    let sig = signer(3).sign(b"list", "c");
    let decoded = Signature::decode(&sig).unwrap();
    assert!(signer(4).public_key().verify(b"list", &decoded).is_err());
}

#[test]
fn test_key_id_display() {
    let key = PublicKey::from_base64(&signer(0x11).public_key().to_base64()).unwrap();
    assert_eq!(key.key_id(), "1111111111111111");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: flipping any bit of a signed blob breaks verification
    #[test]
    fn prop_tampered_blob_rejected(
        blob in prop::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = signer(5);
        let sig = key.sign(&blob, "c");

        let mut tampered = blob.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 1 << bit;

        prop_assert!(key.public_key().verify_detached(tampered, sig.into_bytes()).is_err());
    }

    /// Property: a source never adopts a tampered cache
    #[test]
    fn prop_source_never_adopts_tampered_cache(
        blob in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
    ) {
        let temp = TempDir::new().unwrap();
        let key = signer(6);
        let path = cache_path(&temp);
        write_cache(&path, &blob, &key);

        let mut tampered = blob.clone();
        let i = index.index(tampered.len());
        tampered[i] = tampered[i].wrapping_add(1);
        std::fs::write(&path, &tampered).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let transport = stampsync_core::MockTransport::new();
        let result = runtime.block_on(Source::new(
            &config(&temp, &key, &[]),
            &transport,
            std::time::SystemTime::now(),
        ));

        let rejected = matches!(result, Err(SourceError::NoTrustedContent { .. }));
        prop_assert!(rejected, "tampered cache was adopted");
        prop_assert_eq!(transport.request_count(), 0);
    }
}
