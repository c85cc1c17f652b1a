//! Ledger attribution of wallet transactions and CSV rendering.
//!
//! On-chain data cannot say which input funded which output, so amounts are
//! attributed greedily in output order:
//!
//! - net receipt: wallet-owned outputs absorb the delta until it is used up;
//!   later wallet outputs are change
//! - net send: foreign outputs absorb the absolute delta until it is used
//!   up; whatever is left is the fee
//!
//! Rows from this allocation are the export format and must not be
//! "corrected".

use std::fmt;

use bitwallet_types::{format_coins, Transaction, WalletTxType};
use bitwallet_utils::timestamp_to_iso;

pub const CSV_HEADER: &str = "Date,Height,Txid,Type,Bitcoin,Destination Address";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerRowType {
    Receive,
    Send,
    /// Remainder of a send not paid to any output.
    Fee,
}

impl LedgerRowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receive => WalletTxType::Receive.as_str(),
            Self::Send => WalletTxType::Send.as_str(),
            Self::Fee => "fee",
        }
    }
}

impl fmt::Display for LedgerRowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the ledger export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerRow {
    /// Unix seconds of the containing block.
    pub timestamp: i64,
    pub height: u32,
    pub txid: String,
    pub row_type: LedgerRowType,
    /// Signed satoshis: positive for receipts, negative for sends and fees.
    pub amount: i64,
    /// Counterparty address; `None` for fee rows.
    pub address: Option<String>,
}

impl LedgerRow {
    pub fn date(&self) -> String {
        timestamp_to_iso(self.timestamp)
    }

    /// The row as CSV, without the line terminator.
    pub fn to_csv_line(&self) -> String {
        [
            self.date(),
            self.height.to_string(),
            self.txid.clone(),
            self.row_type.to_string(),
            format_coins(self.amount),
            self.address.clone().unwrap_or_default(),
        ]
        .join(",")
    }
}

/// Attribute a transaction's wallet delta to ledger rows.
pub fn ledger_rows(tx: &Transaction) -> Vec<LedgerRow> {
    // |delta| <= i64::MAX, so every attributed amount fits an i64.
    let delta = tx.wallet_details().delta();
    let row = |row_type, amount, address: Option<&String>| LedgerRow {
        timestamp: tx.block_timestamp,
        height: tx.height,
        txid: tx.hash.clone(),
        row_type,
        amount,
        address: address.cloned(),
    };

    let mut rows = Vec::new();
    if delta > 0 {
        let mut remaining = delta as u64;
        for output in tx.outputs.iter().filter(|o| o.wallet) {
            if remaining == 0 {
                break;
            }
            let received = output.satoshis.raw().min(remaining);
            remaining -= received;
            rows.push(row(
                LedgerRowType::Receive,
                received as i64,
                output.address.as_ref(),
            ));
        }
    } else if delta < 0 {
        let mut remaining = delta.unsigned_abs();
        for output in tx.outputs.iter().filter(|o| !o.wallet) {
            if remaining == 0 {
                break;
            }
            let sent = output.satoshis.raw().min(remaining);
            remaining -= sent;
            rows.push(row(
                LedgerRowType::Send,
                -(sent as i64),
                output.address.as_ref(),
            ));
        }
        if remaining > 0 {
            rows.push(row(LedgerRowType::Fee, -(remaining as i64), None));
        }
    }
    rows
}
