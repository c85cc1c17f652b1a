//! Transaction model returned by the wallet service.
//!
//! Inputs and outputs carry a `wallet` flag set by the service when the
//! requesting wallet controls the address.

use serde::{Deserialize, Serialize};

use crate::amount::Satoshis;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    pub satoshis: Satoshis,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub wallet: bool,
    #[serde(default)]
    pub prev_tx_id: Option<String>,
    #[serde(default)]
    pub output_index: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    pub satoshis: Satoshis,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub wallet: bool,
    #[serde(default)]
    pub script: Option<String>,
}

/// A confirmed transaction annotated with wallet ownership.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub height: u32,
    /// Unix seconds of the containing block.
    #[serde(default)]
    pub block_timestamp: i64,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_index: Option<u32>,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub fee_satoshis: Option<Satoshis>,
}

/// How a transaction moved the wallet's funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalletTxType {
    Receive,
    Send,
    /// Funds moved between the wallet's own addresses.
    Move,
}

impl WalletTxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Send => "send",
            Self::Move => "move",
        }
    }
}

/// Totals over the wallet-owned side of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalletDetails {
    pub input_satoshis: Satoshis,
    pub output_satoshis: Satoshis,
}

impl WalletDetails {
    /// Net satoshis gained (positive) or lost (negative) by the wallet,
    /// clamped to `±i64::MAX`.
    pub fn delta(&self) -> i64 {
        let delta = i128::from(self.output_satoshis.raw()) - i128::from(self.input_satoshis.raw());
        let bound = i128::from(i64::MAX);
        // Lossless after the clamp.
        delta.clamp(-bound, bound) as i64
    }

    pub fn tx_type(&self) -> WalletTxType {
        match self.delta() {
            d if d > 0 => WalletTxType::Receive,
            d if d < 0 => WalletTxType::Send,
            _ => WalletTxType::Move,
        }
    }
}

impl Transaction {
    pub fn wallet_details(&self) -> WalletDetails {
        let input_satoshis = self
            .inputs
            .iter()
            .filter(|i| i.wallet)
            .fold(Satoshis::ZERO, |acc, i| acc.saturating_add(i.satoshis));
        let output_satoshis = self
            .outputs
            .iter()
            .filter(|o| o.wallet)
            .fold(Satoshis::ZERO, |acc, o| acc.saturating_add(o.satoshis));
        WalletDetails {
            input_satoshis,
            output_satoshis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_clamps_huge_amounts() {
        let details = WalletDetails {
            input_satoshis: Satoshis::new(u64::MAX),
            output_satoshis: Satoshis::ZERO,
        };
        assert_eq!(details.delta(), -i64::MAX);
        assert_eq!(details.tx_type(), WalletTxType::Send);

        let details = WalletDetails {
            input_satoshis: Satoshis::ZERO,
            output_satoshis: Satoshis::new(u64::MAX),
        };
        assert_eq!(details.delta(), i64::MAX);
    }

    const TX_JSON: &str = r#"{
        "hash": "9f1c",
        "height": 400000,
        "blockTimestamp": 1456000000,
        "inputs": [
            {"satoshis": 70000, "address": "1in", "wallet": true, "prevTxId": "aa", "outputIndex": 1},
            {"satoshis": 5000, "address": "1other"}
        ],
        "outputs": [
            {"satoshis": 30000, "address": "1dest", "wallet": false},
            {"satoshis": 20000, "address": "1change", "wallet": true}
        ]
    }"#;

    #[test]
    fn deserializes_service_shape() {
        let tx: Transaction = serde_json::from_str(TX_JSON).unwrap();
        assert_eq!(tx.height, 400_000);
        assert_eq!(tx.inputs.len(), 2);
        assert!(!tx.inputs[1].wallet);
        assert_eq!(tx.outputs[1].address.as_deref(), Some("1change"));
    }

    #[test]
    fn wallet_details_sum_owned_side_only() {
        let tx: Transaction = serde_json::from_str(TX_JSON).unwrap();
        let details = tx.wallet_details();
        assert_eq!(details.input_satoshis, Satoshis::new(70_000));
        assert_eq!(details.output_satoshis, Satoshis::new(20_000));
        assert_eq!(details.delta(), -50_000);
        assert_eq!(details.tx_type(), WalletTxType::Send);
    }

    #[test]
    fn balanced_transaction_is_a_move() {
        let details = WalletDetails {
            input_satoshis: Satoshis::new(10),
            output_satoshis: Satoshis::new(10),
        };
        assert_eq!(details.tx_type(), WalletTxType::Move);
    }
}
