use std::{fmt, str::FromStr};

use ed25519_dalek::SigningKey;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

pub const IDENTIFIER_LEN: usize = 32;

/// The system program owns freshly created accounts; its address is all zeroes.
pub const SYSTEM_PROGRAM_ID: Identifier = Identifier::new([0; IDENTIFIER_LEN]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier is not valid base58: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),
    #[error("Identifier must be 32 bytes, got {len}")]
    InvalidLength { len: usize },
}

/// Opaque 32-byte address of an account or key on the ledger.
/// Displayed and parsed as base58.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier([u8; IDENTIFIER_LEN]);

impl Identifier {
    pub const fn new(bytes: [u8; IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, IdentifierError> {
        let bytes: [u8; IDENTIFIER_LEN] = bytes
            .try_into()
            .map_err(|_| IdentifierError::InvalidLength { len: bytes.len() })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LEN] {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim()).into_vec()?;
        Self::try_from_slice(&bytes)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Ed25519 key pair. Its public half is the account [`Identifier`].
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn identifier(&self) -> Identifier {
        Identifier(self.signing_key.verifying_key().to_bytes())
    }

    /// Secret seed followed by the public key, the usual 64-byte keypair file format.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("identifier", &self.identifier())
            .finish_non_exhaustive()
    }
}

/// Source of fresh account identities.
///
/// Implementations must never return the same key pair twice.
pub trait IdentityGenerator {
    fn generate(&mut self) -> Keypair;
}

/// Draws every seed from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentityGenerator;

impl IdentityGenerator for RandomIdentityGenerator {
    fn generate(&mut self) -> Keypair {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        Keypair::from_seed(seed)
    }
}
