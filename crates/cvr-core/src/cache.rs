use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bump when the normalization rules change: stale cache entries must
/// re-normalize rather than feed old canonical text to the analyzers.
pub const TEXT_CACHE_SCHEMA_VERSION: u32 = 3;

/// The persisted normalized-text record. Storage layout is the
/// caller's concern; this type is the read/write contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCacheRecord {
    pub schema_version: u32,
    pub candidate_id: String,
    pub normalized_text: String,
    pub text_hash: String,
}

impl TextCacheRecord {
    pub fn new(candidate_id: impl Into<String>, normalized_text: impl Into<String>) -> Self {
        let normalized_text = normalized_text.into();
        Self {
            schema_version: TEXT_CACHE_SCHEMA_VERSION,
            candidate_id: candidate_id.into(),
            text_hash: content_hash(&normalized_text),
            normalized_text,
        }
    }

    /// A record is usable only when its schema matches the current one
    /// and its hash still describes its text.
    pub fn is_fresh(&self) -> bool {
        self.schema_version == TEXT_CACHE_SCHEMA_VERSION
            && self.text_hash == content_hash(&self.normalized_text)
    }
}

/// First 16 hex chars of SHA-256 over the normalized text.
pub fn content_hash(normalized_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_text.as_bytes());
    let bytes = hasher.finalize();
    let mut hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(16);
    hex
}
