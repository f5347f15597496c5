pub mod email;
pub mod magic_link;
pub mod session;

use sha2::{Digest, Sha256};
use uuid::Uuid;

// ── Token helpers ─────────────────────────────────────────────

/// Generate a 64-char hex token from two UUIDs (256 bits of entropy).
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// SHA-256 hex digest; magic-link tokens are only stored in this form.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Lowercased, trimmed email used as the magic-link identifier.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
