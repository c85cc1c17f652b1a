//! Range-scan positions reported by the service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(height, index)` position in a wallet's transaction history.
///
/// Ordered lexicographically: height first, then index.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub height: u32,
    pub index: u32,
}

impl Position {
    pub const ORIGIN: Self = Self {
        height: 0,
        index: 0,
    };

    pub fn new(height: u32, index: u32) -> Self {
        Self { height, index }
    }

    /// The zero position is the "no explicit start" default.
    pub fn is_origin(&self) -> bool {
        *self == Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.height, self.index)
    }
}
