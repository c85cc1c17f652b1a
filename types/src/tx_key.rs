//! Fixed-width sort key for per-wallet transaction-id records.
//!
//! Layout (40 bytes): `wallet_id (32) || height (u32 BE) || index (u32 BE)`.
//! Big-endian integers make the byte order of encoded keys equal to the
//! `(wallet_id, height, index)` order, so the service can range-scan them.

use crate::error::TypesError;
use crate::hash::TxId;
use crate::wallet_id::WalletId;

/// Encoded length of a [`TxKey`].
pub const TX_KEY_LEN: usize = 40;

/// Position of one transaction id within a wallet's history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxKey {
    pub wallet_id: WalletId,
    pub height: u32,
    pub index: u32,
}

impl TxKey {
    pub fn new(wallet_id: WalletId, height: u32, index: u32) -> Self {
        Self {
            wallet_id,
            height,
            index,
        }
    }

    pub fn encode(&self) -> [u8; TX_KEY_LEN] {
        let mut out = [0u8; TX_KEY_LEN];
        out[..32].copy_from_slice(self.wallet_id.as_bytes());
        out[32..36].copy_from_slice(&self.height.to_be_bytes());
        out[36..40].copy_from_slice(&self.index.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != TX_KEY_LEN {
            return Err(TypesError::InvalidLength {
                expected: TX_KEY_LEN,
                actual: bytes.len(),
            });
        }
        let wallet_id = WalletId::from_slice(&bytes[..32])?;
        let height = u32::from_be_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
        let index = u32::from_be_bytes([bytes[36], bytes[37], bytes[38], bytes[39]]);
        Ok(Self {
            wallet_id,
            height,
            index,
        })
    }
}

/// A stored txid record: the sort key plus the transaction id it points to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletTxid {
    pub key: TxKey,
    pub txid: TxId,
}

impl WalletTxid {
    pub fn new(wallet_id: WalletId, height: u32, index: u32, txid: TxId) -> Self {
        Self {
            key: TxKey::new(wallet_id, height, index),
            txid,
        }
    }

    /// Build a record from a hex-encoded transaction id.
    pub fn from_hex_value(
        wallet_id: WalletId,
        height: u32,
        index: u32,
        txid_hex: &str,
    ) -> Result<Self, TypesError> {
        Ok(Self::new(wallet_id, height, index, TxId::from_hex(txid_hex)?))
    }

    pub fn key_bytes(&self) -> [u8; TX_KEY_LEN] {
        self.key.encode()
    }

    pub fn value(&self) -> &[u8; 32] {
        self.txid.as_bytes()
    }
}
