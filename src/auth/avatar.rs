use sha2::{Digest, Sha256};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar";

/// Derive the avatar URL for an email address.
///
/// Gravatar identifies accounts by the SHA-256 of the trimmed, lowercased
/// address. Size 200, rating `pg`, and the "mystery person" fallback image.
pub fn avatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();

    format!("{GRAVATAR_BASE}/{hash}?s=200&r=pg&d=mm")
}
