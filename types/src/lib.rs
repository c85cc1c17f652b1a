//! Fundamental types for the bitwallet client.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! wallet identifiers, the fixed-width txid sort key, networks, chain-tip state,
//! amounts and the transaction model returned by the wallet service.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod network;
pub mod position;
pub mod state;
pub mod transaction;
pub mod tx_key;
pub mod wallet_id;

pub use address::Address;
pub use amount::{format_coins, Satoshis, COIN};
pub use error::TypesError;
pub use hash::TxId;
pub use network::Network;
pub use position::Position;
pub use state::{ChainState, ChainStateCell};
pub use transaction::{Transaction, TxInput, TxOutput, WalletDetails, WalletTxType};
pub use tx_key::{TxKey, WalletTxid, TX_KEY_LEN};
pub use wallet_id::WalletId;
