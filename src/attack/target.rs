//! Target descriptors for the attack engines.
//!
//! Closed enums keep dispatch exhaustive: adding a target kind or digest
//! algorithm is a compile error until every dispatch site handles it.

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Attack classes the CLI accepts. SSH is recognized but has no engine;
/// the coordinator rejects it before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Hash,
    Web,
    Ssh,
}

impl TargetKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Web => "web",
            Self::Ssh => "ssh",
        }
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("digest is not valid hex")]
    InvalidHex,
    #[error("unrecognized digest length {0} (expected 32, 40, or 64 hex chars)")]
    UnknownDigestLength(usize),
    #[error("invalid target url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Infers the algorithm from the hex digest length.
    pub fn infer(digest: &str) -> Result<Self, TargetError> {
        match digest.len() {
            32 => Ok(Self::Md5),
            40 => Ok(Self::Sha1),
            64 => Ok(Self::Sha256),
            other => Err(TargetError::UnknownDigestLength(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Raw digest of the input under this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Lowercase hex digest of the input.
    pub fn digest_hex(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}

/// An offline digest to recover a preimage for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestTarget {
    pub algorithm: HashAlgorithm,
    pub digest: String,
    raw: Vec<u8>,
}

impl DigestTarget {
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let digest = input.trim().to_ascii_lowercase();
        let algorithm = HashAlgorithm::infer(&digest)?;
        let raw = hex::decode(&digest).map_err(|_| TargetError::InvalidHex)?;
        Ok(Self {
            algorithm,
            digest,
            raw,
        })
    }

    /// Whether the candidate is the preimage of this digest.
    pub fn matches(&self, candidate: &str) -> bool {
        self.algorithm.digest(candidate.as_bytes()) == self.raw
    }

    /// Compares an already-computed raw digest against the target.
    pub fn matches_digest(&self, digest: &[u8]) -> bool {
        digest == self.raw.as_slice()
    }
}

/// A login form endpoint to guess against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTarget {
    pub url: Url,
    pub username: String,
    pub username_field: String,
    pub password_field: String,
    /// Case-insensitive marker whose presence in a 200 body means the
    /// guess was rejected.
    pub failure_marker: String,
}

impl FormTarget {
    pub fn new(url: &str, username: impl Into<String>) -> Result<Self, TargetError> {
        Ok(Self {
            url: Url::parse(url)?,
            username: username.into(),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
            failure_marker: "invalid".to_string(),
        })
    }

    pub fn with_fields(
        mut self,
        username_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Self {
        self.username_field = username_field.into();
        self.password_field = password_field.into();
        self
    }

    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_marker = marker.into();
        self
    }
}

/// Everything the coordinator can dispatch to an engine.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackTarget {
    Digest(DigestTarget),
    Form(FormTarget),
}

impl AttackTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Digest(_) => TargetKind::Hash,
            Self::Form(_) => TargetKind::Web,
        }
    }
}
