//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies are abstracted behind traits; this crate provides
//! test-friendly implementations that:
//! - Return scripted values
//! - Record what was asked of them
//! - Never touch the network
//!
//! Usage: swap the real `WalletClient` page source for a nullable in tests.

pub mod page_source;

pub use page_source::{transaction_item, NullPageSource};
