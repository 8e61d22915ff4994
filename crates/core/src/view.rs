//! Observable view snapshot
//!
//! `ViewState` is what the renderer reads. It is never edited in place: each
//! update builds a complete new snapshot and swaps it into the `ViewStore`, so
//! readers always see a consistent set of rows, page count, loading flag and
//! query state.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::QueryState;
use crate::range::{compute_range, PageToken};

/// A single row as returned by the server.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Successful transport payload: `{"data": [...], "total": n, "pageCount": n}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "data")]
    pub rows: Vec<Record>,
    #[serde(default)]
    pub total: usize,
    #[serde(rename = "pageCount")]
    pub total_pages: usize,
}

/// Outcome of one fetch, tagged with the sequence of the request that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success { sequence: u64, page: Page },
    Failure { sequence: u64, error: String },
}

impl FetchResult {
    pub fn sequence(&self) -> u64 {
        match self {
            FetchResult::Success { sequence, .. } | FetchResult::Failure { sequence, .. } => {
                *sequence
            }
        }
    }
}

/// Snapshot the renderer draws from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub rows: Vec<Record>,
    pub total_pages: usize,
    pub loading: bool,
    /// Message of the last authoritative transport failure, if any.
    pub error: Option<String>,
    pub query_state: QueryState,
    /// Sequence of the last authoritative result, `0` before any result.
    pub sequence: u64,
}

impl ViewState {
    /// Empty view waiting on its first fetch.
    pub fn initial(query_state: QueryState) -> Self {
        Self {
            rows: Vec::new(),
            total_pages: 0,
            loading: true,
            error: None,
            query_state,
            sequence: 0,
        }
    }

    pub fn with_query_state(&self, query_state: QueryState) -> Self {
        Self {
            query_state,
            ..self.clone()
        }
    }

    pub fn with_loading(&self) -> Self {
        Self {
            loading: true,
            ..self.clone()
        }
    }

    /// Snapshot after an authoritative fetch result.
    ///
    /// A failure keeps the last good rows and page count and raises the
    /// error flag. The query state is never touched here.
    pub fn apply(&self, result: FetchResult) -> Self {
        match result {
            FetchResult::Success { sequence, page } => Self {
                rows: page.rows,
                total_pages: page.total_pages,
                loading: false,
                error: None,
                query_state: self.query_state.clone(),
                sequence,
            },
            FetchResult::Failure { sequence, error } => Self {
                loading: false,
                error: Some(error),
                sequence,
                ..self.clone()
            },
        }
    }

    /// 1-based page currently selected.
    pub fn current_page(&self) -> usize {
        self.query_state.page_index + 1
    }

    pub fn can_previous_page(&self) -> bool {
        self.query_state.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.query_state.page_index + 1 < self.total_pages
    }

    /// Pagination strip for this snapshot.
    pub fn page_range(&self, window_size: usize) -> Result<Vec<PageToken>> {
        compute_range(
            self.current_page() as i64,
            self.total_pages as i64,
            window_size as i64,
        )
    }
}

/// Shared cell holding the current `ViewState`.
///
/// Cloning the store clones the handle, not the state. Writers replace the
/// snapshot wholesale; readers get an `Arc` to an immutable snapshot.
#[derive(Debug, Clone)]
pub struct ViewStore {
    inner: Arc<RwLock<Arc<ViewState>>>,
}

impl ViewStore {
    pub fn new(initial: ViewState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build the next snapshot from the current one and publish it.
    pub fn update(&self, f: impl FnOnce(&ViewState) -> ViewState) -> Arc<ViewState> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(f(&guard));
        *guard = next.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> Record {
        let mut record = Record::new();
        record.insert("firstName".to_string(), json!(name));
        record
    }

    fn page(names: &[&str], total_pages: usize) -> Page {
        Page {
            rows: names.iter().map(|n| record(n)).collect(),
            total: names.len(),
            total_pages,
        }
    }

    #[test]
    fn test_initial_is_loading() {
        let view = ViewState::initial(QueryState::new(10));
        assert!(view.loading);
        assert!(view.rows.is_empty());
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.sequence, 0);
    }

    #[test]
    fn test_apply_success_replaces_rows() {
        let view = ViewState::initial(QueryState::new(10).with_page_index(2));
        let next = view.apply(FetchResult::Success {
            sequence: 4,
            page: page(&["Ann", "Bob"], 7),
        });

        assert!(!next.loading);
        assert_eq!(next.rows.len(), 2);
        assert_eq!(next.total_pages, 7);
        assert_eq!(next.sequence, 4);
        assert_eq!(next.query_state.page_index, 2);
    }

    #[test]
    fn test_apply_failure_keeps_last_good_data() {
        let view = ViewState::initial(QueryState::new(10)).apply(FetchResult::Success {
            sequence: 1,
            page: page(&["Ann"], 3),
        });
        let failed = view.with_loading().apply(FetchResult::Failure {
            sequence: 2,
            error: "timed out".to_string(),
        });

        assert!(!failed.loading);
        assert_eq!(failed.error.as_deref(), Some("timed out"));
        assert_eq!(failed.rows, view.rows);
        assert_eq!(failed.total_pages, 3);
    }

    #[test]
    fn test_success_clears_error() {
        let failed = ViewState::initial(QueryState::new(10)).apply(FetchResult::Failure {
            sequence: 1,
            error: "boom".to_string(),
        });
        let recovered = failed.apply(FetchResult::Success {
            sequence: 2,
            page: page(&["Ann"], 1),
        });
        assert!(recovered.error.is_none());
    }

    #[test]
    fn test_navigation_predicates() {
        let view = ViewState::initial(QueryState::new(10)).apply(FetchResult::Success {
            sequence: 1,
            page: page(&[], 3),
        });
        assert!(!view.can_previous_page());
        assert!(view.can_next_page());

        let last = view.with_query_state(QueryState::new(10).with_page_index(2));
        assert!(last.can_previous_page());
        assert!(!last.can_next_page());
    }

    #[test]
    fn test_page_range_uses_one_based_page() {
        let view = ViewState::initial(QueryState::new(10).with_page_index(0)).apply(
            FetchResult::Success {
                sequence: 1,
                page: page(&[], 1),
            },
        );
        assert_eq!(view.page_range(2).unwrap(), vec![PageToken::Number(1)]);
    }

    #[test]
    fn test_page_deserializes_wire_shape() {
        let page: Page = serde_json::from_value(json!({
            "data": [{"firstName": "Ann", "age": 30}],
            "total": 21,
            "pageCount": 5
        }))
        .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total, 21);
        assert_eq!(page.total_pages, 5);
    }

    #[test]
    fn test_store_replaces_snapshot_wholesale() {
        let store = ViewStore::new(ViewState::initial(QueryState::new(10)));
        let before = store.snapshot();

        store.update(|view| view.with_query_state(QueryState::new(20)));

        assert_eq!(before.query_state.page_size, 10);
        assert_eq!(store.snapshot().query_state.page_size, 20);
    }

    #[test]
    fn test_store_clones_share_state() {
        let store = ViewStore::new(ViewState::initial(QueryState::new(10)));
        let other = store.clone();
        other.update(|view| view.with_query_state(QueryState::new(5)));
        assert_eq!(store.snapshot().query_state.page_size, 5);
    }
}
