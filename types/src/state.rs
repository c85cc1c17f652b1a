//! Chain-tip state reported by the service on every response.

use std::sync::{PoisonError, RwLock};

/// The service's last-reported view of the chain tip.
///
/// Advisory metadata: both fields are unset until the first successful
/// response and are overwritten, never merged, by each later one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainState {
    pub height: Option<u32>,
    pub hash: Option<String>,
}

impl ChainState {
    pub fn is_unset(&self) -> bool {
        self.height.is_none() && self.hash.is_none()
    }
}

/// Shared holder for [`ChainState`], owned by a client handle and passed
/// by reference into the transport.
///
/// Concurrent streams on one handle race on `replace`; the last write wins.
#[derive(Debug, Default)]
pub struct ChainStateCell {
    inner: RwLock<ChainState>,
}

impl ChainStateCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> ChainState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the state with a freshly reported one.
    pub fn replace(&self, state: ChainState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
