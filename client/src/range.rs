//! Range options and the cursor they sanitise into.

use bitwallet_types::Position;

use crate::error::ClientError;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 500;

/// Caller-facing range parameters for transaction and txid scans.
///
/// Every field is optional: `height`/`index` default to the origin,
/// `limit` to [`DEFAULT_LIMIT`], and no `end` means the scan is unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeOptions {
    pub height: Option<u32>,
    pub index: Option<u32>,
    pub limit: Option<u32>,
    /// Lower height bound. Items at or below it stop the scan.
    pub end: Option<u32>,
}

impl RangeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn end(mut self, end: u32) -> Self {
        self.end = Some(end);
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        Cursor::from_options(self).map(|_| ())
    }

    /// Query parameters for a single request with these options.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>, ClientError> {
        Ok(Cursor::from_options(self)?.query_pairs())
    }
}

/// Sanitised scan state: where the next page starts, how big it is, and
/// where the scan stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub position: Position,
    pub limit: u32,
    pub end: Option<Position>,
}

impl Cursor {
    pub fn new(position: Position, limit: u32, end: Option<Position>) -> Result<Self, ClientError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ClientError::InvalidRange(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        if let Some(end) = end {
            if position.height > end.height {
                return Err(ClientError::InvalidRange(format!(
                    "height {} is above end height {}",
                    position.height, end.height
                )));
            }
        }
        Ok(Self {
            position,
            limit,
            end,
        })
    }

    pub fn from_options(options: &RangeOptions) -> Result<Self, ClientError> {
        Self::new(
            Position::new(options.height.unwrap_or(0), options.index.unwrap_or(0)),
            options.limit.unwrap_or(DEFAULT_LIMIT),
            options.end.map(|height| Position::new(height, u32::MAX)),
        )
    }

    pub fn end_height(&self) -> Option<u32> {
        self.end.map(|end| end.height)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("height".to_string(), self.position.height.to_string()),
            ("index".to_string(), self.position.index.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(end) = self.end_height() {
            pairs.push(("end".to_string(), end.to_string()));
        }
        pairs
    }
}
