//! Versioned metadata for external model artifacts.

use crate::domain::{Digest32, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Upper bound for `performance_score` (basis points).
pub const MAX_PERFORMANCE_SCORE: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModelSnapshot {
    pub version: String,
    pub external_file_ref: String,
    pub content_hash: Digest32,
    pub performance_score: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    pub index: u64,
    pub version: String,
    pub external_file_ref: String,
    pub content_hash: Digest32,
    pub performance_score: u32,
    pub description: String,
    pub created_at: Timestamp,
    pub active: bool,
}

impl ModelSnapshot {
    pub fn new(index: u64, snapshot: NewModelSnapshot, created_at: Timestamp) -> Self {
        Self {
            index,
            version: snapshot.version,
            external_file_ref: snapshot.external_file_ref,
            content_hash: snapshot.content_hash,
            performance_score: snapshot.performance_score,
            description: snapshot.description,
            created_at,
            active: false,
        }
    }

    /// Tamper-evidence digest binding version, file reference, content hash
    /// and creation time. Variable-length fields are length-prefixed.
    pub fn integrity_digest(&self) -> Digest32 {
        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hash_var(&mut hasher, &self.version);
        hash_var(&mut hasher, &self.external_file_ref);
        hasher.update(self.content_hash.as_bytes());
        hasher.update(self.created_at.as_secs().to_le_bytes());
        Digest32(hasher.finalize().into())
    }
}
