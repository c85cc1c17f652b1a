//! Canonical request digest.
//!
//! digest = SHA256(SHA256(method || full_url || body || nonce))
//!
//! The body may be fed in chunks so large uploads are hashed without
//! holding them in memory.

use sha2::{Digest, Sha256};

use crate::nonce::Nonce;

/// Double SHA-256 of arbitrary data.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Incremental builder for the canonical request digest.
pub struct RequestHasher {
    inner: Sha256,
}

impl RequestHasher {
    /// Start a digest for `method` against the full URL (query string included).
    pub fn new(method: &str, full_url: &str) -> Self {
        let mut inner = Sha256::new();
        inner.update(method.as_bytes());
        inner.update(full_url.as_bytes());
        Self { inner }
    }

    /// Append a chunk of the raw body.
    pub fn update_body(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Append the nonce and produce the 32-byte digest to sign.
    pub fn finalize(mut self, nonce: &Nonce) -> [u8; 32] {
        self.inner.update(nonce.as_bytes());
        let first = self.inner.finalize();
        Sha256::digest(first).into()
    }
}

/// One-shot form of [`RequestHasher`].
pub fn request_digest(method: &str, full_url: &str, body: &[u8], nonce: &Nonce) -> [u8; 32] {
    let mut hasher = RequestHasher::new(method, full_url);
    hasher.update_body(body);
    hasher.finalize(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256d_known_vector() {
        // SHA256(SHA256("hello"))
        assert_eq!(
            hex::encode(sha256d(b"hello")),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn digest_equals_sha256d_of_concatenation() {
        let nonce = Nonce::from_bytes([7u8; 16]);
        let parts: [&[u8]; 4] = [b"GET", b"http://h/info", b"{}", &[7u8; 16]];
        let expected = sha256d(&parts.concat());
        assert_eq!(request_digest("GET", "http://h/info", b"{}", &nonce), expected);
    }

    #[test]
    fn chunked_body_matches_one_shot() {
        let nonce = Nonce::from_bytes([1u8; 16]);
        let mut hasher = RequestHasher::new("POST", "http://h/wallets/x/addresses");
        hasher.update_body(b"first,");
        hasher.update_body(b"second");
        assert_eq!(
            hasher.finalize(&nonce),
            request_digest("POST", "http://h/wallets/x/addresses", b"first,second", &nonce)
        );
    }

    #[test]
    fn nonce_changes_digest() {
        let a = request_digest("GET", "u", b"", &Nonce::from_bytes([0u8; 16]));
        let b = request_digest("GET", "u", b"", &Nonce::from_bytes([1u8; 16]));
        assert_ne!(a, b);
    }
}
