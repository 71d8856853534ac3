//! # Pagination Module
//!
//! Limit/offset pagination for collection results. `page` and `offset` are two
//! views of the same cursor and always satisfy `offset = (page - 1) * limit` when
//! the cursor was given as a page.
//!
//! ## Query parameters
//!
//! | Parameter | Rule |
//! |-----------|------|
//! | `limit` | non-negative integer; `0` or absent → default; capped at the maximum |
//! | `offset` | non-negative integer; wins over `page` when both are present |
//! | `page` | integer ≥ 1 |
//!
//! ```rust
//! use resource_gateway::pagination::{parse_pagination_params, PaginationConfig};
//! use std::collections::BTreeMap;
//!
//! let query = BTreeMap::from([
//!     ("limit".to_string(), "10".to_string()),
//!     ("page".to_string(), "5".to_string()),
//! ]);
//! let options = parse_pagination_params(&query, &PaginationConfig::default()).unwrap();
//! assert_eq!((options.limit, options.offset, options.page), (10, 40, 5));
//! ```

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";
pub const PAGE_PARAM: &str = "page";

/// Limits applied when parsing pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 1000,
        }
    }
}

/// Cursor of one page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationOptions {
    pub limit: usize,
    pub offset: usize,
    pub page: usize,
}

impl PaginationOptions {
    /// Options for page `page` (1-based) of size `limit`
    #[must_use]
    pub fn from_page(limit: usize, page: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        Self {
            limit,
            offset: (page - 1) * limit,
            page,
        }
    }

    /// Options starting at `offset` with page size `limit`
    #[must_use]
    pub fn from_offset(limit: usize, offset: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            offset,
            page: offset / limit + 1,
        }
    }
}

/// One page of a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub limit: usize,
    pub offset: usize,
    pub page: usize,
    pub page_count: usize,
}

/// Paging metadata attached to response envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total_count: usize,
    pub limit: usize,
    pub offset: usize,
    pub page: usize,
    pub page_count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PaginatedResult<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.offset + self.items.len() < self.total_count
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    #[must_use]
    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta {
            total_count: self.total_count,
            limit: self.limit,
            offset: self.offset,
            page: self.page,
            page_count: self.page_count,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
        }
    }
}

impl PaginationMeta {
    /// `first`, `last`, and when applicable `prev` / `next` links for `base_uri`
    ///
    /// Every query parameter other than the pagination ones is carried over.
    #[must_use]
    pub fn links(&self, base_uri: &str, query: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let link = |offset: usize| {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (k, v) in query {
                if k != LIMIT_PARAM && k != OFFSET_PARAM && k != PAGE_PARAM {
                    serializer.append_pair(k, v);
                }
            }
            serializer.append_pair(LIMIT_PARAM, &self.limit.to_string());
            serializer.append_pair(OFFSET_PARAM, &offset.to_string());
            format!("{base_uri}?{}", serializer.finish())
        };

        let mut links = BTreeMap::new();
        links.insert("first".to_string(), link(0));
        links.insert(
            "last".to_string(),
            link((self.page_count - 1) * self.limit),
        );
        if self.has_previous {
            links.insert(
                "prev".to_string(),
                link(self.offset.saturating_sub(self.limit)),
            );
        }
        if self.has_next {
            links.insert("next".to_string(), link(self.offset + self.limit));
        }
        links
    }
}

fn parse_non_negative(query: &BTreeMap<String, String>, name: &str) -> Result<Option<i64>> {
    let Some(raw) = query.get(name) else {
        return Ok(None);
    };
    let value: i64 = raw.trim().parse().map_err(|_| {
        GatewayError::invalid_field(name, format!("'{raw}' is not a valid number"), "type")
    })?;
    Ok(Some(value))
}

/// Derive [`PaginationOptions`] from query parameters
///
/// # Errors
///
/// Returns a validation error for non-numeric values, a negative `limit` or
/// `offset`, or a `page` below 1.
pub fn parse_pagination_params(
    query: &BTreeMap<String, String>,
    config: &PaginationConfig,
) -> Result<PaginationOptions> {
    let default_limit = config.default_limit.max(1);
    let max_limit = config.max_limit.max(default_limit);

    let limit = match parse_non_negative(query, LIMIT_PARAM)? {
        Some(l) if l < 0 => {
            return Err(GatewayError::invalid_field(
                LIMIT_PARAM,
                "limit must not be negative",
                "range",
            ))
        }
        Some(0) | None => default_limit,
        Some(l) => usize::try_from(l).unwrap_or(max_limit).min(max_limit),
    };

    if let Some(offset) = parse_non_negative(query, OFFSET_PARAM)? {
        let offset = usize::try_from(offset).map_err(|_| {
            GatewayError::invalid_field(OFFSET_PARAM, "offset must not be negative", "range")
        })?;
        return Ok(PaginationOptions::from_offset(limit, offset));
    }

    if let Some(page) = parse_non_negative(query, PAGE_PARAM)? {
        if page < 1 {
            return Err(GatewayError::invalid_field(
                PAGE_PARAM,
                "page must be 1 or greater",
                "range",
            ));
        }
        let page = usize::try_from(page)
            .ok()
            .filter(|p| (p - 1).checked_mul(limit).is_some())
            .ok_or_else(|| GatewayError::invalid_field(PAGE_PARAM, "page is too large", "range"))?;
        return Ok(PaginationOptions::from_page(limit, page));
    }

    Ok(PaginationOptions::from_offset(limit, 0))
}

/// Slice `collection` to the requested page
///
/// # Errors
///
/// Returns a validation error when `offset` lies at or past the end of a non-empty
/// collection. An empty collection with offset 0 is a valid (empty) page.
pub fn apply_pagination<T: Clone>(
    collection: &[T],
    options: &PaginationOptions,
) -> Result<PaginatedResult<T>> {
    let total = collection.len();
    let limit = options.limit.max(1);
    let offset = options.offset;

    if total > 0 && offset >= total {
        return Err(GatewayError::invalid_field(
            OFFSET_PARAM,
            format!("offset {offset} is out of range for {total} items"),
            "range",
        ));
    }

    let end = offset.saturating_add(limit).min(total);
    let items = if offset < end {
        collection[offset..end].to_vec()
    } else {
        Vec::new()
    };
    let page_count = total.div_ceil(limit).max(1);

    debug!(
        total_count = total,
        limit = limit,
        offset = offset,
        returned = items.len(),
        "Applied pagination"
    );

    Ok(PaginatedResult {
        items,
        total_count: total,
        limit,
        offset,
        page: offset / limit + 1,
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_limit_and_page() {
        let options =
            parse_pagination_params(&query(&[("limit", "10"), ("page", "5")]), &PaginationConfig::default())
                .unwrap();
        assert_eq!(
            options,
            PaginationOptions {
                limit: 10,
                offset: 40,
                page: 5
            }
        );
    }

    #[test]
    fn test_defaults() {
        let config = PaginationConfig {
            default_limit: 20,
            max_limit: 100,
        };
        let options = parse_pagination_params(&query(&[]), &config).unwrap();
        assert_eq!((options.limit, options.offset, options.page), (20, 0, 1));
        let zero = parse_pagination_params(&query(&[("limit", "0")]), &config).unwrap();
        assert_eq!(zero.limit, 20);
    }

    #[test]
    fn test_limit_is_capped() {
        let config = PaginationConfig {
            default_limit: 20,
            max_limit: 100,
        };
        let options = parse_pagination_params(&query(&[("limit", "5000")]), &config).unwrap();
        assert_eq!(options.limit, 100);
    }

    #[test]
    fn test_offset_wins_over_page() {
        let options = parse_pagination_params(
            &query(&[("limit", "10"), ("offset", "25"), ("page", "9")]),
            &PaginationConfig::default(),
        )
        .unwrap();
        assert_eq!((options.offset, options.page), (25, 3));
    }

    #[test]
    fn test_invalid_params() {
        let config = PaginationConfig::default();
        for pairs in [
            vec![("limit", "ten")],
            vec![("limit", "-1")],
            vec![("offset", "-5")],
            vec![("offset", "x")],
            vec![("page", "0")],
            vec![("page", "-2")],
        ] {
            let err = parse_pagination_params(&query(&pairs), &config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{pairs:?}");
        }
    }

    #[test]
    fn test_apply_pagination_slices() {
        let data: Vec<u32> = (0..25).collect();
        let page = apply_pagination(&data, &PaginationOptions::from_page(10, 3)).unwrap();
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert_eq!(page.total_count, 25);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.page, 3);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_empty_collection_is_one_empty_page() {
        let data: Vec<u32> = Vec::new();
        let page = apply_pagination(&data, &PaginationOptions::from_offset(10, 0)).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page_count, 1);
    }

    #[test]
    fn test_offset_past_end_fails() {
        let data: Vec<u32> = (0..5).collect();
        assert!(apply_pagination(&data, &PaginationOptions::from_offset(10, 5)).is_err());
        assert!(apply_pagination(&data, &PaginationOptions::from_offset(10, 4)).is_ok());
    }

    #[test]
    fn test_links() {
        let data: Vec<u32> = (0..30).collect();
        let page = apply_pagination(&data, &PaginationOptions::from_offset(10, 10)).unwrap();
        let links = page
            .meta()
            .links("maas://machine", &query(&[("filter", "a eq b"), ("page", "2")]));
        assert_eq!(links["first"], "maas://machine?filter=a+eq+b&limit=10&offset=0");
        assert_eq!(links["prev"], "maas://machine?filter=a+eq+b&limit=10&offset=0");
        assert_eq!(links["next"], "maas://machine?filter=a+eq+b&limit=10&offset=20");
        assert_eq!(links["last"], "maas://machine?filter=a+eq+b&limit=10&offset=20");
    }

    proptest! {
        #[test]
        fn prop_pagination_boundary(len in 0usize..60, limit in 1usize..20, offset in 0usize..80) {
            let data: Vec<usize> = (0..len).collect();
            let result = apply_pagination(&data, &PaginationOptions::from_offset(limit, offset));
            prop_assert_eq!(result.is_err(), offset >= len && len > 0);
            if let Ok(page) = result {
                prop_assert_eq!(page.page_count, len.div_ceil(limit).max(1));
                prop_assert!(page.items.len() <= limit);
            }
        }
    }
}
