//! Client identity hashing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hashes client identities with HMAC-SHA256 keyed by a server secret.
///
/// Rate-limit windows, unique-visitor sets and click events only ever see
/// the hash. Without the secret, stored hashes cannot be matched back to
/// addresses by brute-forcing the IPv4 space.
#[derive(Clone)]
pub struct IdentityHasher {
    secret: String,
}

impl IdentityHasher {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash(&self, identity: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(identity.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for IdentityHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityHasher").finish_non_exhaustive()
    }
}
