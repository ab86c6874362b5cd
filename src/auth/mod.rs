use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Fresh opaque API token: 64 hex chars drawn from two v4 UUIDs
pub fn generate_api_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Tokens are only ever stored and compared as their SHA-256 hex digest
pub fn hash_api_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
