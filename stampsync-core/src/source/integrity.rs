// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Detached signature verification for source lists
//!
//! Source lists are signed with minisign. Every byte a source adopts,
//! whether read from the local cache or downloaded from a mirror, goes
//! through [`PublicKey::verify_detached`] first. Verification uses the
//! audited `ring` Ed25519 implementation; prehashed ("ED") signatures
//! hash the message with BLAKE2b-512 before verification.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use blake2::{Blake2b512, Digest};
use ring::signature::{Ed25519KeyPair, KeyPair as RingKeyPair, UnparsedPublicKey, ED25519};
use thiserror::Error;

use super::types::VerifiedContent;

/// Pure Ed25519 over the message.
const ALG_ED25519: [u8; 2] = *b"Ed";
/// Ed25519 over the BLAKE2b-512 digest of the message.
const ALG_HASHED_ED25519: [u8; 2] = *b"ED";

const KEY_ID_LEN: usize = 8;
const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

const UNTRUSTED_COMMENT_PREFIX: &str = "untrusted comment: ";
const TRUSTED_COMMENT_PREFIX: &str = "trusted comment: ";

/// Minisign public key used as the trust anchor of a source.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_id: [u8; KEY_ID_LEN],
    bytes: [u8; PUBLIC_KEY_LEN],
}

impl PublicKey {
    /// Parses a base64-encoded minisign public key.
    ///
    /// Accepts either the bare key line or the full two-line `.pub` file
    /// (untrusted comment followed by the key).
    pub fn from_base64(encoded: &str) -> Result<Self, SignatureError> {
        let line = encoded
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(UNTRUSTED_COMMENT_PREFIX))
            .last()
            .ok_or(SignatureError::Malformed("empty public key"))?;

        let bin = STANDARD
            .decode(line)
            .map_err(|_| SignatureError::Malformed("public key is not valid base64"))?;
        if bin.len() != 2 + KEY_ID_LEN + PUBLIC_KEY_LEN {
            return Err(SignatureError::Malformed("public key has an invalid length"));
        }
        if bin[..2] != ALG_ED25519 {
            return Err(SignatureError::Malformed("unsupported public key algorithm"));
        }

        let mut key_id = [0u8; KEY_ID_LEN];
        key_id.copy_from_slice(&bin[2..2 + KEY_ID_LEN]);
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(&bin[2 + KEY_ID_LEN..]);

        Ok(PublicKey { key_id, bytes })
    }

    /// Returns the base64 encoding accepted by [`PublicKey::from_base64`].
    pub fn to_base64(&self) -> String {
        let mut bin = Vec::with_capacity(2 + KEY_ID_LEN + PUBLIC_KEY_LEN);
        bin.extend_from_slice(&ALG_ED25519);
        bin.extend_from_slice(&self.key_id);
        bin.extend_from_slice(&self.bytes);
        STANDARD.encode(bin)
    }

    /// Key id as minisign displays it (little-endian, upper-case hex).
    pub fn key_id(&self) -> String {
        let mut id = self.key_id;
        id.reverse();
        hex::encode_upper(id)
    }

    /// Verifies a decoded signature against a message.
    ///
    /// Both the signature over the message and the global signature over
    /// the trusted comment must verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        if signature.key_id != self.key_id {
            return Err(SignatureError::KeyMismatch);
        }

        let digest;
        let signed: &[u8] = if signature.algorithm == ALG_HASHED_ED25519 {
            digest = Blake2b512::digest(message);
            &digest[..]
        } else {
            message
        };

        let public_key = UnparsedPublicKey::new(&ED25519, &self.bytes);
        public_key
            .verify(signed, &signature.signature)
            .map_err(|_| SignatureError::Invalid)?;

        let mut global = Vec::with_capacity(SIGNATURE_LEN + signature.trusted_comment.len());
        global.extend_from_slice(&signature.signature);
        global.extend_from_slice(signature.trusted_comment.as_bytes());
        public_key
            .verify(&global, &signature.global_signature)
            .map_err(|_| SignatureError::Invalid)
    }

    /// Decodes a detached signature file and verifies `blob` against it.
    ///
    /// This is the only way to obtain a [`VerifiedContent`].
    pub fn verify_detached(
        &self,
        blob: Vec<u8>,
        signature: Vec<u8>,
    ) -> Result<VerifiedContent, SignatureError> {
        check_signature(self, &blob, &signature)?;
        Ok(VerifiedContent::new(blob, signature))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_id", &self.key_id())
            .finish()
    }
}

/// Verifies `message` against the raw bytes of a detached signature file.
pub fn check_signature(
    key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let text = std::str::from_utf8(signature)
        .map_err(|_| SignatureError::Malformed("signature is not valid UTF-8"))?;
    let signature = Signature::decode(text)?;
    key.verify(message, &signature)
}

/// Decoded minisign signature file.
#[derive(Debug, Clone)]
pub struct Signature {
    algorithm: [u8; 2],
    key_id: [u8; KEY_ID_LEN],
    signature: [u8; SIGNATURE_LEN],
    trusted_comment: String,
    global_signature: [u8; SIGNATURE_LEN],
}

impl Signature {
    /// Decodes the four-line minisign signature format.
    pub fn decode(text: &str) -> Result<Self, SignatureError> {
        let mut lines = text.lines();

        // The untrusted comment is not covered by any signature.
        lines
            .next()
            .ok_or(SignatureError::Malformed("empty signature"))?;

        let bin = decode_line(lines.next(), "missing signature line")?;
        if bin.len() != 2 + KEY_ID_LEN + SIGNATURE_LEN {
            return Err(SignatureError::Malformed("signature has an invalid length"));
        }
        let mut algorithm = [0u8; 2];
        algorithm.copy_from_slice(&bin[..2]);
        if algorithm != ALG_ED25519 && algorithm != ALG_HASHED_ED25519 {
            return Err(SignatureError::Malformed("unsupported signature algorithm"));
        }
        let mut key_id = [0u8; KEY_ID_LEN];
        key_id.copy_from_slice(&bin[2..2 + KEY_ID_LEN]);
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&bin[2 + KEY_ID_LEN..]);

        let trusted_comment = lines
            .next()
            .and_then(|line| line.strip_prefix(TRUSTED_COMMENT_PREFIX))
            .ok_or(SignatureError::Malformed("missing trusted comment"))?
            .to_string();

        let global = decode_line(lines.next(), "missing global signature")?;
        let global_signature: [u8; SIGNATURE_LEN] = global
            .try_into()
            .map_err(|_| SignatureError::Malformed("global signature has an invalid length"))?;

        Ok(Signature {
            algorithm,
            key_id,
            signature,
            trusted_comment,
            global_signature,
        })
    }

    /// Trusted comment, covered by the global signature.
    pub fn trusted_comment(&self) -> &str {
        &self.trusted_comment
    }

    /// Whether the message was hashed with BLAKE2b-512 before signing.
    pub fn is_prehashed(&self) -> bool {
        self.algorithm == ALG_HASHED_ED25519
    }
}

fn decode_line(line: Option<&str>, missing: &'static str) -> Result<Vec<u8>, SignatureError> {
    let line = line.ok_or(SignatureError::Malformed(missing))?;
    STANDARD
        .decode(line.trim())
        .map_err(|_| SignatureError::Malformed("signature is not valid base64"))
}

/// Ed25519 key pair producing minisign-compatible detached signatures.
///
/// Used by list publishers and by tests; sources only ever verify.
pub struct SigningKeyPair {
    keypair: Ed25519KeyPair,
    key_id: [u8; KEY_ID_LEN],
}

impl SigningKeyPair {
    /// Creates a key pair from a 32-byte seed; the same seed always yields
    /// the same key.
    pub fn from_seed(seed: &[u8; 32], key_id: [u8; KEY_ID_LEN]) -> Result<Self, SignatureError> {
        let keypair = Ed25519KeyPair::from_seed_unchecked(seed)
            .map_err(|_| SignatureError::Malformed("invalid Ed25519 seed"))?;
        Ok(SigningKeyPair { keypair, key_id })
    }

    /// Returns the matching public key.
    pub fn public_key(&self) -> PublicKey {
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(self.keypair.public_key().as_ref());
        PublicKey {
            key_id: self.key_id,
            bytes,
        }
    }

    /// Signs `message` in the prehashed format minisign uses by default.
    ///
    /// `trusted_comment` must fit on one line.
    pub fn sign(&self, message: &[u8], trusted_comment: &str) -> String {
        let digest = Blake2b512::digest(message);
        self.encode(ALG_HASHED_ED25519, &digest, trusted_comment)
    }

    /// Signs `message` directly (legacy "Ed" format).
    pub fn sign_legacy(&self, message: &[u8], trusted_comment: &str) -> String {
        self.encode(ALG_ED25519, message, trusted_comment)
    }

    fn encode(&self, algorithm: [u8; 2], signed: &[u8], trusted_comment: &str) -> String {
        let signature = self.keypair.sign(signed);

        let mut bin = Vec::with_capacity(2 + KEY_ID_LEN + SIGNATURE_LEN);
        bin.extend_from_slice(&algorithm);
        bin.extend_from_slice(&self.key_id);
        bin.extend_from_slice(signature.as_ref());

        let mut global = Vec::with_capacity(SIGNATURE_LEN + trusted_comment.len());
        global.extend_from_slice(signature.as_ref());
        global.extend_from_slice(trusted_comment.as_bytes());
        let global_signature = self.keypair.sign(&global);

        format!(
            "{UNTRUSTED_COMMENT_PREFIX}signature from stampsync secret key\n{}\n{TRUSTED_COMMENT_PREFIX}{}\n{}\n",
            STANDARD.encode(bin),
            trusted_comment,
            STANDARD.encode(global_signature.as_ref()),
        )
    }
}

/// Errors that can occur during signature verification
///
/// Callers treat every variant the same way: trust was not established.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Key or signature could not be decoded
    #[error("malformed signature: {0}")]
    Malformed(&'static str),

    /// Signature was produced by a different key
    #[error("signature key id does not match the public key")]
    KeyMismatch,

    /// Signature does not match the content
    #[error("signature verification failed")]
    Invalid,
}
