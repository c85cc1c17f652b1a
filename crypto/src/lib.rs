//! Request-signing primitives for the bitwallet client.
//!
//! - **secp256k1 ECDSA** for API identity keys and request signatures (DER encoded)
//! - **Double SHA-256** over the canonical request bytes
//! - **Nonces** that never repeat within a process

pub mod error;
pub mod hash;
pub mod keys;
pub mod nonce;
pub mod sign;

pub use error::CryptoError;
pub use hash::{request_digest, sha256d, RequestHasher};
pub use keys::{generate_keypair, parse_public_hex, ApiKeyPair};
pub use nonce::{generate_nonce, Nonce, NONCE_LEN};
pub use sign::{sign_digest, verify_digest};
