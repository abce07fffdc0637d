//! Shared API types: request context, the response envelope, pagination.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::TokenSigner;
use crate::db::Db;

/// Shared state handed to every handler and middleware layer.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Db,
    pub tokens: Arc<TokenSigner>,
}

impl ApiContext {
    pub fn new(db: Db, tokens: Arc<TokenSigner>) -> Self {
        Self { db, tokens }
    }
}

/// The success envelope. Every 2xx body is one of these:
/// `{"success": true, "data": ...}` plus `count` for lists and
/// `pagination` for paginated lists.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            pagination: None,
            data,
        }
    }

    pub fn paginated(data: T, count: usize, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: Some(count),
            pagination: Some(pagination),
            data,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            pagination: None,
            data,
        }
    }
}

/// Cursorless page descriptor included in paginated list envelopes.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

#[derive(Debug, Serialize)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

/// Build pagination links: `next` exists while records remain past this
/// page, `prev` for any page after the first.
pub fn paginate(page: u32, limit: u32, total: i64) -> Pagination {
    let total_pages = if total == 0 {
        0
    } else {
        ((total as u64).div_ceil(limit as u64)) as u32
    };
    let next = if (page as i64) * (limit as i64) < total {
        Some(PageRef {
            page: page + 1,
            limit,
        })
    } else {
        None
    };
    let prev = if page > 1 {
        Some(PageRef {
            page: page - 1,
            limit,
        })
    } else {
        None
    };
    Pagination {
        page,
        limit,
        total,
        total_pages,
        next,
        prev,
    }
}

/// Query-string pagination parameters, with the conventional defaults.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl PageQuery {
    pub fn offset(&self) -> u32 {
        (self.page.max(1) - 1) * self.limit
    }
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_limit() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_many_has_next_no_prev() {
        let p = paginate(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.next.as_ref().unwrap().page, 2);
        assert!(p.prev.is_none());
    }

    #[test]
    fn middle_page_has_both_links() {
        let p = paginate(2, 10, 25);
        assert_eq!(p.next.as_ref().unwrap().page, 3);
        assert_eq!(p.prev.as_ref().unwrap().page, 1);
    }

    #[test]
    fn last_page_has_prev_no_next() {
        let p = paginate(3, 10, 25);
        assert!(p.next.is_none());
        assert_eq!(p.prev.as_ref().unwrap().page, 2);
    }

    #[test]
    fn exact_page_boundary_has_no_next() {
        let p = paginate(2, 10, 20);
        assert!(p.next.is_none());
    }

    #[test]
    fn empty_result_set() {
        let p = paginate(1, 10, 0);
        assert_eq!(p.total_pages, 0);
        assert!(p.next.is_none());
        assert!(p.prev.is_none());
    }

    #[test]
    fn page_query_defaults() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn page_query_offset() {
        let q = PageQuery { page: 3, limit: 20 };
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn list_envelope_sets_count() {
        let body = ApiResponse::list(vec![1, 2, 3]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 3);
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn plain_envelope_omits_count_and_pagination() {
        let body = ApiResponse::new(serde_json::json!({"ok": 1}));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("count").is_none());
    }
}
