//! The wallet service client handle.

use std::path::Path;
use std::sync::Arc;

use futures_util::Stream;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use bitwallet_types::{Address, ChainState, ChainStateCell, Network, Transaction, WalletId};
use bitwallet_utils::parse_date_millis;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::fault::{Fault, FaultChannel};
use crate::pager::{PageFetcher, PageKind, PageRequest, PageResponse, PageSource, RangePage};
use crate::range::{Cursor, RangeOptions};
use crate::stream::{
    collect_all, cursor_stream, ItemTransform, LedgerCsv, RawItems, TxidsOnly, TypedTransactions,
};
use crate::transport::{ApiRequest, KnownHostHandler, TransportClient};

/// A handle on one wallet service.
///
/// Streams borrow the handle; several may run at once and share only the
/// chain state, where the last response to arrive wins.
pub struct WalletClient {
    transport: TransportClient,
    chain: ChainStateCell,
    faults: FaultChannel,
}

impl WalletClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = TransportClient::new(&config)?;
        debug!(
            url = %config.url,
            network = %config.network,
            authenticated = transport.signer().is_authenticated(),
            "wallet client created"
        );
        Ok(Self {
            transport,
            chain: ChainStateCell::new(),
            faults: FaultChannel::new(),
        })
    }

    /// Offer each peer certificate to `handler` (trust on first use).
    pub fn with_known_host_handler(mut self, handler: Arc<dyn KnownHostHandler>) -> Self {
        self.transport = self.transport.with_known_host_handler(handler);
        self
    }

    pub fn network(&self) -> Network {
        self.transport.network()
    }

    /// Chain tip from the most recent successful response.
    pub fn chain_state(&self) -> ChainState {
        self.chain.get()
    }

    pub fn faults(&self) -> broadcast::Receiver<Fault> {
        self.faults.subscribe()
    }

    /// Hand a result to the fault channel instead of inspecting it.
    pub fn report<T>(&self, operation: &'static str, result: Result<T, ClientError>) -> Option<T> {
        self.faults.report(operation, result)
    }

    async fn send(&self, request: ApiRequest) -> Result<Value, ClientError> {
        Ok(self.transport.send(&request, &self.chain).await?.body)
    }

    pub async fn create_wallet(&self, wallet_id: &WalletId) -> Result<Value, ClientError> {
        self.send(ApiRequest::put(format!("/wallets/{wallet_id}")))
            .await
    }

    pub async fn import_address(
        &self,
        wallet_id: &WalletId,
        address: &str,
    ) -> Result<Value, ClientError> {
        let address = Address::new(address)?;
        self.send(ApiRequest::put(format!(
            "/wallets/{wallet_id}/addresses/{address}"
        )))
        .await
    }

    /// Upload a file of addresses. The file is streamed, never buffered.
    pub async fn import_addresses(
        &self,
        wallet_id: &WalletId,
        file: impl AsRef<Path>,
    ) -> Result<Value, ClientError> {
        self.send(ApiRequest::upload(
            format!("/wallets/{wallet_id}/addresses"),
            file.as_ref(),
        ))
        .await
    }

    pub async fn get_transactions(
        &self,
        wallet_id: &WalletId,
        range: &RangeOptions,
    ) -> Result<RangePage<Transaction>, ClientError> {
        let request = ApiRequest::get(PageKind::Transactions.path(wallet_id))
            .with_query(range.query_pairs()?);
        let body = self.send(request).await?;
        PageResponse::from_body(PageKind::Transactions, body)?.into_typed()
    }

    pub async fn get_utxos(
        &self,
        wallet_id: &WalletId,
        range: &RangeOptions,
    ) -> Result<Value, ClientError> {
        self.send(
            ApiRequest::get(format!("/wallets/{wallet_id}/utxos")).with_query(range.query_pairs()?),
        )
        .await
    }

    pub async fn get_txids(
        &self,
        wallet_id: &WalletId,
        range: &RangeOptions,
    ) -> Result<RangePage<String>, ClientError> {
        let request =
            ApiRequest::get(PageKind::Txids.path(wallet_id)).with_query(range.query_pairs()?);
        let body = self.send(request).await?;
        let page = PageResponse::from_body(PageKind::Txids, body)?;
        let mut project = TxidsOnly;
        let mut items = Vec::with_capacity(page.items.len());
        for item in page.items {
            items.extend(project.transform(item)?);
        }
        Ok(RangePage {
            items,
            start: page.start,
            end: page.end,
        })
    }

    pub async fn get_balance(&self, wallet_id: &WalletId) -> Result<Value, ClientError> {
        self.send(ApiRequest::get(format!("/wallets/{wallet_id}/balance")))
            .await
    }

    pub async fn get_info(&self) -> Result<Value, ClientError> {
        self.send(ApiRequest::get("/info")).await
    }

    /// Block heights spanning two dates. Dates are `YYYY-MM-DD`, RFC 3339
    /// or epoch milliseconds, and are checked before anything is sent.
    pub async fn get_heights_from_timestamps(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Value, ClientError> {
        for date in [start_date, end_date] {
            if parse_date_millis(date).is_none() {
                return Err(ClientError::InvalidRange(format!(
                    "the date supplied: '{date}' is not a valid date"
                )));
            }
        }
        self.send(ApiRequest::get("/info/timestamps").with_query(vec![
            ("startdate".to_string(), start_date.to_string()),
            ("enddate".to_string(), end_date.to_string()),
        ]))
        .await
    }

    /// Cursor stream over a wallet collection with a caller-chosen item
    /// transform. The range is validated before any request is made.
    pub fn stream<'a, T>(
        &'a self,
        wallet_id: WalletId,
        kind: PageKind,
        range: &RangeOptions,
        transform: T,
    ) -> Result<impl Stream<Item = Result<T::Output, ClientError>> + 'a, ClientError>
    where
        T: ItemTransform + 'a,
        T::Output: 'a,
    {
        let cursor = Cursor::from_options(range)?;
        Ok(cursor_stream(
            PageFetcher::new(self, wallet_id, kind, cursor),
            transform,
        ))
    }

    pub fn transactions_stream<'a>(
        &'a self,
        wallet_id: WalletId,
        range: &RangeOptions,
    ) -> Result<impl Stream<Item = Result<Transaction, ClientError>> + 'a, ClientError> {
        self.stream(wallet_id, PageKind::Transactions, range, TypedTransactions)
    }

    pub fn raw_transactions_stream<'a>(
        &'a self,
        wallet_id: WalletId,
        range: &RangeOptions,
    ) -> Result<impl Stream<Item = Result<Value, ClientError>> + 'a, ClientError> {
        self.stream(wallet_id, PageKind::Transactions, range, RawItems)
    }

    pub fn txids_stream<'a>(
        &'a self,
        wallet_id: WalletId,
        range: &RangeOptions,
    ) -> Result<impl Stream<Item = Result<String, ClientError>> + 'a, ClientError> {
        self.stream(wallet_id, PageKind::Txids, range, TxidsOnly)
    }

    /// CSV ledger export, one line per item, header first.
    pub fn transactions_csv_stream<'a>(
        &'a self,
        wallet_id: WalletId,
        range: &RangeOptions,
    ) -> Result<impl Stream<Item = Result<String, ClientError>> + 'a, ClientError> {
        self.stream(wallet_id, PageKind::Transactions, range, LedgerCsv)
    }

    /// Every transaction in range, buffered.
    pub async fn transactions_list(
        &self,
        wallet_id: WalletId,
        range: &RangeOptions,
    ) -> Result<Vec<Transaction>, ClientError> {
        collect_all(self.transactions_stream(wallet_id, range)?).await
    }
}

impl PageSource for WalletClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, ClientError> {
        let body = self
            .send(ApiRequest::get(request.path()).with_query(request.query_pairs()))
            .await?;
        PageResponse::from_body(request.kind, body)
    }
}
