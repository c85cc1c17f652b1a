//! Cursor streams.
//!
//! One stream type drives a [`PageFetcher`]; what each page item becomes is
//! decided by an [`ItemTransform`] strategy. Exactly one page request is in
//! flight at a time, and only while the consumer is polling.

use std::collections::VecDeque;

use futures_util::{stream, Stream, TryStreamExt};
use serde_json::Value;

use bitwallet_types::Transaction;

use crate::error::ClientError;
use crate::ledger::{ledger_rows, CSV_HEADER};
use crate::pager::{PageFetcher, PageSource};

/// Turns raw page items into stream output.
pub trait ItemTransform {
    type Output;

    /// Items emitted once, before the first page is requested.
    fn preamble(&mut self) -> Vec<Self::Output> {
        Vec::new()
    }

    /// Zero or more outputs for one page item.
    fn transform(&mut self, item: Value) -> Result<Vec<Self::Output>, ClientError>;
}

/// Items as the service sent them.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawItems;

impl ItemTransform for RawItems {
    type Output = Value;

    fn transform(&mut self, item: Value) -> Result<Vec<Value>, ClientError> {
        Ok(vec![item])
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TypedTransactions;

impl ItemTransform for TypedTransactions {
    type Output = Transaction;

    fn transform(&mut self, item: Value) -> Result<Vec<Transaction>, ClientError> {
        Ok(vec![serde_json::from_value(item)?])
    }
}

/// Projects txid items to the id string. Accepts bare strings and objects
/// with a `txid` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TxidsOnly;

impl ItemTransform for TxidsOnly {
    type Output = String;

    fn transform(&mut self, item: Value) -> Result<Vec<String>, ClientError> {
        match item {
            Value::String(txid) => Ok(vec![txid]),
            Value::Object(mut map) => match map.remove("txid") {
                Some(Value::String(txid)) => Ok(vec![txid]),
                _ => Err(ClientError::Protocol("txid item without \"txid\"".into())),
            },
            other => Err(ClientError::Protocol(format!("unexpected txid item: {other}"))),
        }
    }
}

/// CSV ledger export: the header line, then one line per ledger row.
/// Every line ends with `\n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LedgerCsv;

impl ItemTransform for LedgerCsv {
    type Output = String;

    fn preamble(&mut self) -> Vec<String> {
        vec![format!("{CSV_HEADER}\n")]
    }

    fn transform(&mut self, item: Value) -> Result<Vec<String>, ClientError> {
        let tx: Transaction = serde_json::from_value(item)?;
        Ok(ledger_rows(&tx)
            .iter()
            .map(|row| format!("{}\n", row.to_csv_line()))
            .collect())
    }
}

struct StreamState<'a, S, T: ItemTransform> {
    fetcher: PageFetcher<'a, S>,
    transform: T,
    buffered: VecDeque<Result<T::Output, ClientError>>,
    started: bool,
    done: bool,
}

/// Drive `fetcher` as a stream of transformed items.
///
/// The first error is yielded and ends the stream.
pub fn cursor_stream<'a, S, T>(
    fetcher: PageFetcher<'a, S>,
    transform: T,
) -> impl Stream<Item = Result<T::Output, ClientError>> + 'a
where
    S: PageSource + Sync,
    T: ItemTransform + 'a,
    T::Output: 'a,
{
    let state = StreamState {
        fetcher,
        transform,
        buffered: VecDeque::new(),
        started: false,
        done: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(next) = state.buffered.pop_front() {
                return Some((next, state));
            }
            if !state.started {
                state.started = true;
                let preamble = state.transform.preamble();
                state.buffered.extend(preamble.into_iter().map(Ok));
                continue;
            }
            if state.done {
                return None;
            }
            match state.fetcher.next_page().await {
                Ok(Some(items)) => {
                    for item in items {
                        match state.transform.transform(item) {
                            Ok(outputs) => state.buffered.extend(outputs.into_iter().map(Ok)),
                            Err(e) => {
                                state.buffered.push_back(Err(e));
                                state.done = true;
                                break;
                            }
                        }
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
}

/// Drain a stream into memory. Fails with the stream's first error.
pub async fn collect_all<T, St>(stream: St) -> Result<Vec<T>, ClientError>
where
    St: Stream<Item = Result<T, ClientError>>,
{
    stream.try_collect().await
}
