// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pagination over the caller-supplied hash list.
//!
//! A [`PageRequest`] can only be constructed from positive `page` and
//! `limit` values, so slicing itself never fails. A page starting past the
//! end of the list yields an empty slice rather than an error; the handler
//! turns that into an empty result set.

/// Page number applied when the query string omits `page`.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size applied when the query string omits `limit`.
pub const DEFAULT_LIMIT: i64 = 2;

#[derive(Debug, thiserror::Error)]
#[error("page and limit must both be positive")]
pub struct InvalidPagination;

/// A validated pagination window: `page` and `limit` are both >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, InvalidPagination> {
        if page < 1 || limit < 1 {
            return Err(InvalidPagination);
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Select this window from `items`. The offset is computed in 128-bit
    /// arithmetic so absurd `page * limit` products clamp to an empty slice
    /// instead of overflowing.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page as u128 - 1) * self.limit as u128;
        if start >= items.len() as u128 {
            return &[];
        }
        let start = start as usize;
        let end = start.saturating_add(self.limit as usize).min(items.len());
        &items[start..end]
    }
}
