use std::ops::Range;

use crate::errors::DataTablesError;

/// Wire value of `length` that asks for every row from `start` onward.
pub const UNLIMITED_LENGTH: i64 = -1;

/// Number of rows requested for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLength {
    Rows(u64),
    /// `length=-1`
    All,
}

/// Offset/length window of the requested page. `start` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub start: u64,
    pub length: PageLength,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self {
            start: 0,
            length: PageLength::Rows(crate::models::DEFAULT_LENGTH.unsigned_abs()),
        }
    }
}

impl PaginationWindow {
    #[must_use]
    pub const fn new(start: u64, length: PageLength) -> Self {
        Self { start, length }
    }

    /// Validate raw wire values.
    ///
    /// # Errors
    ///
    /// Negative `start` and any `length` below `-1` are malformed.
    pub fn from_wire(start: i64, length: i64) -> Result<Self, DataTablesError> {
        let start = u64::try_from(start).map_err(|_| {
            DataTablesError::malformed(format!("start must be zero or positive, got {start}"))
        })?;
        let length = match length {
            UNLIMITED_LENGTH => PageLength::All,
            n => PageLength::Rows(u64::try_from(n).map_err(|_| {
                DataTablesError::malformed(format!(
                    "length must be -1 or a non-negative integer, got {n}"
                ))
            })?),
        };
        Ok(Self { start, length })
    }

    /// True when slicing would return the view unchanged
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start == 0 && matches!(self.length, PageLength::All)
    }

    /// Row limit, `None` for the unlimited sentinel
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        match self.length {
            PageLength::Rows(n) => Some(n),
            PageLength::All => None,
        }
    }

    /// Index range of this window over a view of `len` rows, clamped to the view
    #[must_use]
    pub fn bounds(&self, len: usize) -> Range<usize> {
        let start = usize::try_from(self.start).unwrap_or(usize::MAX).min(len);
        let end = match self.length {
            PageLength::All => len,
            PageLength::Rows(n) => start
                .saturating_add(usize::try_from(n).unwrap_or(usize::MAX))
                .min(len),
        };
        start..end
    }
}
