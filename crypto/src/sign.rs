//! ECDSA signing of request digests.

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1};

use crate::error::CryptoError;
use crate::keys::ApiKeyPair;

/// Sign a 32-byte digest, returning the low-S DER encoding.
pub fn sign_digest(digest: &[u8; 32], keys: &ApiKeyPair) -> Vec<u8> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*digest);
    let mut sig = secp.sign_ecdsa(&message, keys.secret_key());
    sig.normalize_s();
    sig.serialize_der().to_vec()
}

/// Verify a DER signature over a digest.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify.
pub fn verify_digest(
    digest: &[u8; 32],
    der: &[u8],
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    let secp = Secp256k1::verification_only();
    let sig = Signature::from_der(der).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let message = Message::from_digest(*digest);
    Ok(secp.verify_ecdsa(&message, &sig, public_key).is_ok())
}
