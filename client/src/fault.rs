//! Out-of-band fault channel for callers that do not inspect results.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::error;

use crate::error::ClientError;

pub const FAULT_CHANNEL_CAPACITY: usize = 64;

/// An error from an operation whose caller did not handle it.
#[derive(Clone, Debug)]
pub struct Fault {
    pub operation: &'static str,
    pub error: Arc<ClientError>,
}

/// Bounded broadcast of unhandled errors. Slow subscribers lose the oldest
/// faults.
#[derive(Debug)]
pub struct FaultChannel {
    sender: broadcast::Sender<Fault>,
}

impl FaultChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FAULT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Fault> {
        self.sender.subscribe()
    }

    /// Pass `Ok` values through; broadcast errors. With no subscriber the
    /// error is logged instead of dropped.
    pub fn report<T>(&self, operation: &'static str, result: Result<T, ClientError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                let fault = Fault {
                    operation,
                    error: Arc::new(e),
                };
                if let Err(broadcast::error::SendError(fault)) = self.sender.send(fault) {
                    error!(operation, error = %fault.error, "unhandled client error");
                }
                None
            }
        }
    }
}

impl Default for FaultChannel {
    fn default() -> Self {
        Self::new()
    }
}
