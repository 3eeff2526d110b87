// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stellar key handling.
//!
//! Addresses and secret seeds use the strkey encoding (`G...` / `S...`).
//! Ed25519 keys are derived and used for signing with `ring`. A keypair only
//! lives for the duration of one request; seeds are never logged or stored.

use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair};
use stellar_strkey::ed25519;
use stellar_xdr::curr::{AccountId, MuxedAccount, PublicKey, Uint256};

/// Length of an encoded Stellar address.
pub const ADDRESS_LEN: usize = 56;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid public key format: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid secret key")]
    InvalidSecret,

    #[error("Key generation failed")]
    Generation,
}

/// Decode a `G...` address into its raw ed25519 bytes.
pub fn decode_public_key(address: &str) -> Result<[u8; 32], KeyError> {
    let address = address.trim();
    if address.len() != ADDRESS_LEN {
        return Err(KeyError::InvalidPublicKey(address.to_string()));
    }
    ed25519::PublicKey::from_string(address)
        .map(|pk| pk.0)
        .map_err(|_| KeyError::InvalidPublicKey(address.to_string()))
}

/// Whether the string is a well-formed `G...` address.
pub fn is_valid_public_key(address: &str) -> bool {
    decode_public_key(address).is_ok()
}

pub fn muxed_account(address: &str) -> Result<MuxedAccount, KeyError> {
    Ok(MuxedAccount::Ed25519(Uint256(decode_public_key(address)?)))
}

pub fn account_id(address: &str) -> Result<AccountId, KeyError> {
    Ok(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
        decode_public_key(address)?,
    ))))
}

pub fn encode_public_key(bytes: [u8; 32]) -> String {
    ed25519::PublicKey(bytes).to_string()
}

/// Signing keypair derived from a secret seed.
pub struct StellarKeypair {
    key_pair: Ed25519KeyPair,
    public_key: String,
}

impl StellarKeypair {
    /// Parse an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self, KeyError> {
        let seed = ed25519::PrivateKey::from_string(secret.trim())
            .map_err(|_| KeyError::InvalidSecret)?;
        Self::from_seed(&seed.0)
    }

    fn from_seed(seed: &[u8; 32]) -> Result<Self, KeyError> {
        let key_pair =
            Ed25519KeyPair::from_seed_unchecked(seed).map_err(|_| KeyError::InvalidSecret)?;
        let public_key = encode_public_key(public_key_bytes(&key_pair));
        Ok(Self {
            key_pair,
            public_key,
        })
    }

    /// Generate a fresh random keypair. Returns the keypair and its `S...` seed.
    pub fn generate() -> Result<(Self, String), KeyError> {
        let rng = SystemRandom::new();
        let mut seed = [0u8; 32];
        rng.fill(&mut seed).map_err(|_| KeyError::Generation)?;
        let keypair = Self::from_seed(&seed)?;
        let secret = ed25519::PrivateKey(seed).to_string();
        Ok((keypair, secret))
    }

    /// `G...` address of this keypair.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        public_key_bytes(&self.key_pair)
    }

    /// Signature hint: the last four bytes of the public key.
    pub fn signature_hint(&self) -> [u8; 4] {
        let pk = self.public_key_bytes();
        [pk[28], pk[29], pk[30], pk[31]]
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair.sign(message).as_ref().to_vec()
    }
}

impl std::fmt::Debug for StellarKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StellarKeypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

fn public_key_bytes(key_pair: &Ed25519KeyPair) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(key_pair.public_key().as_ref());
    out
}
