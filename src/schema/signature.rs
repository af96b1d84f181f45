use sha2::{Digest, Sha256};

use crate::core::Result;
use crate::model::CollectionDefinition;

use super::types::CollectionSchema;

/// Fingerprints are the first 16 digest bytes, hex-encoded.
pub const SIGNATURE_LENGTH: usize = 32;

/// Deterministic fingerprint of a full collection definition, used for
/// change detection and cache keys. Identical structure yields identical
/// signatures; any structural change yields a different one.
pub fn collection_signature(definition: &CollectionDefinition) -> Result<String> {
    let canonical = definition.canonical();
    let encoded = serde_json::to_vec(&canonical)?;
    Ok(hex_digest(&encoded))
}

/// Checksum of an inferred schema. The plan generator short-circuits to an
/// empty plan when the existing and current checksums match.
pub fn schema_checksum(schema: &CollectionSchema) -> Result<String> {
    let encoded = serde_json::to_vec(schema)?;
    Ok(hex_digest(&encoded))
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest
        .iter()
        .take(SIGNATURE_LENGTH / 2)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
