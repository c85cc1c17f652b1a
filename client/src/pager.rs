//! Pull-based paging over the service's cursor protocol.
//!
//! A [`PageFetcher`] issues exactly one page request per pull and stops
//! when the service reports no more pages, reports no forward progress, or
//! the scan reaches the caller's lower height bound.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use bitwallet_types::{Position, WalletId};

use crate::error::ClientError;
use crate::range::Cursor;

/// Which wallet collection is being paged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageKind {
    Transactions,
    Txids,
}

impl PageKind {
    pub fn path(&self, wallet_id: &WalletId) -> String {
        format!("/wallets/{wallet_id}/{}", self.field())
    }

    /// Response field holding the page items.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Txids => "txids",
        }
    }

    /// Block height of one page item. Txid items reported as bare strings
    /// carry no height.
    pub fn height_of(&self, item: &Value) -> Option<u32> {
        item.get("height")
            .and_then(Value::as_u64)
            .and_then(|h| u32::try_from(h).ok())
    }
}

/// One page query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub wallet_id: WalletId,
    pub kind: PageKind,
    pub position: Position,
    pub limit: u32,
}

impl PageRequest {
    pub fn path(&self) -> String {
        self.kind.path(&self.wallet_id)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("height".to_string(), self.position.height.to_string()),
            ("index".to_string(), self.position.index.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

/// A page as reported by the service, items still untyped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageResponse {
    pub items: Vec<Value>,
    pub start: Option<Position>,
    pub end: Option<Position>,
}

impl PageResponse {
    pub fn new(items: Vec<Value>, start: Option<Position>, end: Option<Position>) -> Self {
        Self { items, start, end }
    }

    /// Split a response body into items and the `{start, end}` pair.
    pub fn from_body(kind: PageKind, body: Value) -> Result<Self, ClientError> {
        let Value::Object(mut map) = body else {
            return Err(ClientError::Protocol(format!(
                "expected an object holding \"{}\"",
                kind.field()
            )));
        };
        let items = match map.remove(kind.field()) {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(ClientError::Protocol(format!(
                    "\"{}\" is not an array",
                    kind.field()
                )))
            }
        };
        Ok(Self {
            items,
            start: position_field(&mut map, "start")?,
            end: position_field(&mut map, "end")?,
        })
    }

    pub fn into_typed<T: DeserializeOwned>(self) -> Result<RangePage<T>, ClientError> {
        let items = self
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(RangePage {
            items,
            start: self.start,
            end: self.end,
        })
    }
}

fn position_field(
    map: &mut serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<Position>, ClientError> {
    match map.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// A typed page returned by the single-request range getters.
#[derive(Clone, Debug, PartialEq)]
pub struct RangePage<T> {
    pub items: Vec<T>,
    pub start: Option<Position>,
    pub end: Option<Position>,
}

/// Anything that can answer page queries.
pub trait PageSource {
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageResponse, ClientError>> + Send;
}

/// Cursor state machine over a [`PageSource`].
pub struct PageFetcher<'a, S> {
    source: &'a S,
    wallet_id: WalletId,
    kind: PageKind,
    cursor: Cursor,
    ended: bool,
}

impl<'a, S: PageSource> PageFetcher<'a, S> {
    pub fn new(source: &'a S, wallet_id: WalletId, kind: PageKind, cursor: Cursor) -> Self {
        Self {
            source,
            wallet_id,
            kind,
            cursor,
            ended: false,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn position(&self) -> Position {
        self.cursor.position
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    /// Fetch and filter the next page.
    ///
    /// `Ok(None)` means the scan is exhausted. An error also ends the scan;
    /// items already returned stay valid.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, ClientError> {
        if self.ended {
            return Ok(None);
        }
        let request = PageRequest {
            wallet_id: self.wallet_id,
            kind: self.kind,
            position: self.cursor.position,
            limit: self.cursor.limit,
        };
        let page = match self.source.fetch_page(&request).await {
            Ok(page) => page,
            Err(e) => {
                self.ended = true;
                return Err(e);
            }
        };
        trace!(
            position = %self.cursor.position,
            items = page.items.len(),
            end = ?page.end,
            "page received"
        );

        let current = self.cursor.position;
        if !current.is_origin() && page.start != Some(current) {
            self.ended = true;
            return Err(ClientError::Protocol(format!(
                "page start {} does not match cursor {current}",
                page.start
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "(none)".into())
            )));
        }

        match page.end {
            None => self.ended = true,
            Some(end) if end == current => {
                self.ended = true;
                return Ok(None);
            }
            Some(end) => {
                self.cursor.position = end;
                if matches!(self.cursor.end_height(), Some(bound) if end.height <= bound) {
                    self.ended = true;
                }
            }
        }

        Ok(Some(self.take_until_bound(page.items)))
    }

    /// Items up to the first one at or below the lower bound. Reaching that
    /// item ends the scan and drops the rest of the page.
    fn take_until_bound(&mut self, items: Vec<Value>) -> Vec<Value> {
        let Some(bound) = self.cursor.end_height() else {
            return items;
        };
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if matches!(self.kind.height_of(&item), Some(h) if h <= bound) {
                self.ended = true;
                break;
            }
            kept.push(item);
        }
        kept
    }
}
