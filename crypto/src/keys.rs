//! secp256k1 API identity keys.

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::error::CryptoError;

/// The key pair a client authenticates with.
///
/// The public half is sent as `x-identity`; the secret half never leaves
/// the process.
#[derive(Clone)]
pub struct ApiKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl ApiKeyPair {
    pub fn from_secret(secret: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Self { secret, public }
    }

    /// Load a key pair from a hex private key, deriving the public key.
    pub fn from_private_hex(private_hex: &str) -> Result<Self, CryptoError> {
        let bytes =
            hex::decode(private_hex).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_secret(secret))
    }

    /// Load a key pair from hex halves, checking that the public key
    /// belongs to the private key.
    pub fn from_hex_pair(private_hex: &str, public_hex: &str) -> Result<Self, CryptoError> {
        let pair = Self::from_private_hex(private_hex)?;
        if parse_public_hex(public_hex)? != pair.public {
            return Err(CryptoError::KeyMismatch);
        }
        Ok(pair)
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Compressed public key (33 bytes) as hex.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public.serialize())
    }

    pub fn private_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }
}

impl std::fmt::Debug for ApiKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyPair")
            .field("public", &self.public_hex())
            .finish_non_exhaustive()
    }
}

/// Parse a hex-encoded public key (compressed or uncompressed).
pub fn parse_public_hex(public_hex: &str) -> Result<PublicKey, CryptoError> {
    let bytes =
        hex::decode(public_hex).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    PublicKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Generate a new key pair from the OS random source.
pub fn generate_keypair() -> ApiKeyPair {
    ApiKeyPair::from_secret(SecretKey::new(&mut OsRng))
}
