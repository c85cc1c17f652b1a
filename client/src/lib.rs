//! Client for the remote wallet service.
//!
//! - **Signed requests**: secp256k1 identity, per-request nonce, DER signature
//! - **Chain state** tracked from every successful response
//! - **Cursor streams** over transactions and txids, one page in flight
//! - **Ledger export** as CSV rows attributed from wallet deltas
//!
//! Every operation returns a `Result`; nothing is retried internally.

pub mod client;
pub mod config;
pub mod error;
pub mod fault;
pub mod ledger;
pub mod pager;
pub mod range;
pub mod signer;
pub mod stream;
pub mod transport;

pub use client::WalletClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use fault::{Fault, FaultChannel, FAULT_CHANNEL_CAPACITY};
pub use ledger::{ledger_rows, LedgerRow, LedgerRowType, CSV_HEADER};
pub use pager::{PageFetcher, PageKind, PageRequest, PageResponse, PageSource, RangePage};
pub use range::{Cursor, RangeOptions, DEFAULT_LIMIT, MAX_LIMIT};
pub use signer::{verify_request, AuthHeaders, RequestSigner};
pub use stream::{
    collect_all, cursor_stream, ItemTransform, LedgerCsv, RawItems, TxidsOnly, TypedTransactions,
};
pub use transport::{
    offer_certificate, ApiRequest, ApiResponse, KnownHostHandler, PeerCertificate, RequestBody,
    TransportClient,
};
