//! Request authentication headers.
//!
//! Each signed request carries `x-identity` (compressed public key),
//! `x-signature` (DER ECDSA over the canonical request digest) and
//! `x-nonce`. Without a key pair no headers are produced and requests go
//! out anonymously.

use std::path::Path;

use bitwallet_crypto::{
    generate_nonce, parse_public_hex, sign_digest, verify_digest, ApiKeyPair, Nonce,
    RequestHasher, NONCE_LEN,
};
use tokio::io::AsyncReadExt;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::UPLOAD_BUFFER_SIZE;

pub const HEADER_IDENTITY: &str = "x-identity";
pub const HEADER_SIGNATURE: &str = "x-signature";
pub const HEADER_NONCE: &str = "x-nonce";

/// Header values for one signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthHeaders {
    pub identity: String,
    pub signature: String,
    pub nonce: String,
}

/// Signs requests with the configured API key pair, if any.
#[derive(Clone, Debug, Default)]
pub struct RequestSigner {
    keys: Option<ApiKeyPair>,
}

impl RequestSigner {
    pub fn anonymous() -> Self {
        Self { keys: None }
    }

    pub fn new(keys: ApiKeyPair) -> Self {
        Self { keys: Some(keys) }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            keys: config.api_key_pair()?,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.keys.is_some()
    }

    pub fn identity(&self) -> Option<String> {
        self.keys.as_ref().map(ApiKeyPair::public_hex)
    }

    /// Sign an in-memory body.
    pub fn sign(&self, method: &str, full_url: &str, body: &[u8]) -> Option<AuthHeaders> {
        let keys = self.keys.as_ref()?;
        let mut hasher = RequestHasher::new(method, full_url);
        hasher.update_body(body);
        Some(finish(hasher, keys, generate_nonce()))
    }

    /// Sign a body that will be streamed from `path`, hashing the file in
    /// fixed-size chunks.
    pub async fn sign_file(
        &self,
        method: &str,
        full_url: &str,
        path: &Path,
    ) -> Result<Option<AuthHeaders>, ClientError> {
        let Some(keys) = self.keys.as_ref() else {
            return Ok(None);
        };
        let mut hasher = RequestHasher::new(method, full_url);
        let mut file = tokio::fs::File::open(path).await?;
        let mut buf = vec![0u8; UPLOAD_BUFFER_SIZE];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update_body(&buf[..n]);
        }
        Ok(Some(finish(hasher, keys, generate_nonce())))
    }
}

fn finish(hasher: RequestHasher, keys: &ApiKeyPair, nonce: Nonce) -> AuthHeaders {
    let digest = hasher.finalize(&nonce);
    AuthHeaders {
        identity: keys.public_hex(),
        signature: hex::encode(sign_digest(&digest, keys)),
        nonce: nonce.to_hex(),
    }
}

/// Check a set of auth headers against the request they claim to sign.
pub fn verify_request(
    method: &str,
    full_url: &str,
    body: &[u8],
    headers: &AuthHeaders,
) -> Result<bool, ClientError> {
    let nonce_bytes: [u8; NONCE_LEN] = hex::decode(&headers.nonce)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| ClientError::Protocol(format!("malformed nonce: {}", headers.nonce)))?;
    let signature = hex::decode(&headers.signature)
        .map_err(|e| ClientError::Protocol(format!("malformed signature: {e}")))?;
    let public_key = parse_public_hex(&headers.identity)?;

    let mut hasher = RequestHasher::new(method, full_url);
    hasher.update_body(body);
    let digest = hasher.finalize(&Nonce::from_bytes(nonce_bytes));
    Ok(verify_digest(&digest, &signature, &public_key)?)
}
