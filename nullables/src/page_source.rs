//! Nullable page source: scripted page responses, recorded requests.

use std::collections::VecDeque;
use std::future::{ready, Future};
use std::sync::{Mutex, PoisonError};

use serde_json::{json, Value};

use bitwallet_client::{ClientError, PageRequest, PageResponse, PageSource};
use bitwallet_types::Position;

/// A page source that replays queued responses in order.
///
/// Once the script is exhausted it answers with an empty final page (no
/// `end`), so a stream under test always terminates.
#[derive(Default)]
pub struct NullPageSource {
    script: Mutex<VecDeque<Result<PageResponse, ClientError>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl NullPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page.
    pub fn push_page(&self, items: Vec<Value>, start: Option<Position>, end: Option<Position>) {
        self.push(Ok(PageResponse::new(items, start, end)));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: ClientError) {
        self.push(Err(error));
    }

    fn push(&self, response: Result<PageResponse, ClientError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// All requests received so far (for assertions).
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PageSource for NullPageSource {
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageResponse, ClientError>> + Send {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(PageResponse::default()));
        ready(next)
    }
}

/// A minimal transaction item as the service reports it: one foreign input
/// paying `satoshis` to a wallet output.
pub fn transaction_item(hash: &str, height: u32, satoshis: u64) -> Value {
    json!({
        "hash": hash,
        "height": height,
        "blockTimestamp": 1_456_000_000,
        "inputs": [{"satoshis": satoshis + 10_000, "address": "1sender", "wallet": false}],
        "outputs": [{"satoshis": satoshis, "address": "1wallet", "wallet": true}]
    })
}
