//! Query state and reconciliation
//!
//! `QueryState` is the full set of parameters (sort, page, page size, filter)
//! that select a slice of server-side data. This module holds the pure
//! decisions made whenever that state changes: whether the filter moved,
//! whether the page must be reset before fetching, and how sort toggles and
//! page size changes rewrite the state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Filter criteria sent to the server, keyed by filter name (e.g. `q`).
pub type Filter = BTreeMap<String, String>;

/// Sequence value carried by an intent that the coordinator has not stamped yet.
pub const UNASSIGNED_SEQUENCE: u64 = 0;

/// One column of the sort specification.
///
/// Serialized as `{"id": field, "desc": bool}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortRule {
    #[serde(rename = "id")]
    pub field: String,
    #[serde(rename = "desc")]
    pub descending: bool,
}

impl SortRule {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Canonical parameters of a paged, sortable, filterable view.
///
/// Its JSON form is exactly what the transport sends:
/// `{"sortBy": [...], "pageIndex": n, "pageSize": n, "filter": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    #[serde(default)]
    pub sort_by: Vec<SortRule>,
    #[serde(default)]
    pub page_index: usize,
    pub page_size: usize,
    #[serde(default)]
    pub filter: Filter,
}

impl QueryState {
    /// Unsorted, unfiltered first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            sort_by: Vec::new(),
            page_index: 0,
            page_size,
            filter: Filter::new(),
        }
    }

    pub fn with_page_index(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort_by: Vec<SortRule>) -> Self {
        self.sort_by = sort_by;
        self
    }
}

/// A request to load the data slice for a given query state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchIntent {
    /// Assigned by the coordinator at issue time; `UNASSIGNED_SEQUENCE` before.
    pub sequence: u64,
    pub state: QueryState,
    pub filter_changed: bool,
}

impl FetchIntent {
    pub fn new(state: QueryState, filter_changed: bool) -> Self {
        Self {
            sequence: UNASSIGNED_SEQUENCE,
            state,
            filter_changed,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Outcome of comparing two successive query states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The state is ready to be fetched as-is.
    Fetch(FetchIntent),
    /// The filter changed while away from the first page. The host must apply
    /// this corrected state (page 0) instead of fetching the stale page.
    ResetPage(QueryState),
}

/// Decide what a settled query state requires.
///
/// `previous` is the state of the last issued fetch, absent on initial load.
/// A filter change on any page other than the first produces a page reset
/// and no fetch; applying the reset settles again and then fetches.
pub fn reconcile(previous: Option<&QueryState>, current: &QueryState) -> Reconciliation {
    let filter_changed =
        previous.is_some_and(|prev| filters_differ(&prev.filter, &current.filter));

    if filter_changed && current.page_index != 0 {
        log::debug!(
            "filter changed on page {}, resetting to first page",
            current.page_index
        );
        return Reconciliation::ResetPage(current.clone().with_page_index(0));
    }

    Reconciliation::Fetch(FetchIntent::new(current.clone(), filter_changed))
}

/// Compare two filters key by key over the union of their keys.
///
/// A missing key and an empty value are the same: both mean "no filter".
pub fn filters_differ(a: &Filter, b: &Filter) -> bool {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    keys.into_iter().any(|key| {
        let left = a.get(key).map(String::as_str).unwrap_or("");
        let right = b.get(key).map(String::as_str).unwrap_or("");
        left != right
    })
}

/// Trim whitespace around every filter value.
pub fn normalize_filter(raw: Filter) -> Filter {
    raw.into_iter()
        .map(|(key, value)| (key, value.trim().to_string()))
        .collect()
}

/// Sort specification after a header click on `field`.
///
/// Unsorted → ascending (replacing any other column), ascending → descending,
/// descending → unsorted.
pub fn toggle_sort(sort_by: &[SortRule], field: &str) -> Vec<SortRule> {
    match sort_by.iter().find(|rule| rule.field == field) {
        None => vec![SortRule::ascending(field)],
        Some(rule) if !rule.descending => vec![SortRule::descending(field)],
        Some(_) => Vec::new(),
    }
}

/// Page index that keeps the first visible row on screen after a page size
/// change.
pub fn reanchor_page_index(
    page_index: usize,
    old_page_size: usize,
    new_page_size: usize,
) -> usize {
    if new_page_size == 0 {
        return 0;
    }
    page_index * old_page_size / new_page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pairs: &[(&str, &str)]) -> Filter {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_initial_load_fetches_immediately() {
        let current = QueryState::new(10).with_page_index(3);
        let result = reconcile(None, &current);
        assert_eq!(result, Reconciliation::Fetch(FetchIntent::new(current, false)));
    }

    #[test]
    fn test_filter_change_off_first_page_resets() {
        let previous = QueryState::new(10)
            .with_filter(filter(&[("q", "")]))
            .with_page_index(3);
        let current = previous.clone().with_filter(filter(&[("q", "ann")]));

        match reconcile(Some(&previous), &current) {
            Reconciliation::ResetPage(corrected) => {
                assert_eq!(corrected.page_index, 0);
                assert_eq!(corrected.filter, filter(&[("q", "ann")]));
            }
            other => panic!("expected a page reset, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_change_on_first_page_fetches() {
        let previous = QueryState::new(10).with_filter(filter(&[("q", "")]));
        let current = previous.clone().with_filter(filter(&[("q", "ann")]));

        let result = reconcile(Some(&previous), &current);
        assert_eq!(result, Reconciliation::Fetch(FetchIntent::new(current, true)));
    }

    #[test]
    fn test_page_change_fetches_without_filter_flag() {
        let previous = QueryState::new(10);
        let current = previous.clone().with_page_index(4);

        match reconcile(Some(&previous), &current) {
            Reconciliation::Fetch(intent) => {
                assert!(!intent.filter_changed);
                assert_eq!(intent.state.page_index, 4);
                assert_eq!(intent.sequence, UNASSIGNED_SEQUENCE);
            }
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    #[test]
    fn test_filters_differ_compares_union_of_keys() {
        assert!(filters_differ(&filter(&[]), &filter(&[("q", "ann")])));
        assert!(filters_differ(&filter(&[("q", "ann")]), &filter(&[])));
        assert!(filters_differ(
            &filter(&[("q", "ann")]),
            &filter(&[("q", "ann"), ("age", "30")])
        ));
        assert!(!filters_differ(
            &filter(&[("q", "ann")]),
            &filter(&[("q", "ann")])
        ));
    }

    #[test]
    fn test_empty_value_equals_missing_key() {
        assert!(!filters_differ(&filter(&[("q", "")]), &filter(&[])));
    }

    #[test]
    fn test_normalize_filter_trims_values() {
        let normalized = normalize_filter(filter(&[("q", "  ann \t")]));
        assert_eq!(normalized, filter(&[("q", "ann")]));
    }

    #[test]
    fn test_toggle_sort_cycle() {
        let asc = toggle_sort(&[], "age");
        assert_eq!(asc, vec![SortRule::ascending("age")]);

        let desc = toggle_sort(&asc, "age");
        assert_eq!(desc, vec![SortRule::descending("age")]);

        let cleared = toggle_sort(&desc, "age");
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_toggle_sort_new_column_replaces() {
        let sort_by = vec![
            SortRule::ascending("lastName"),
            SortRule::descending("age"),
        ];
        assert_eq!(
            toggle_sort(&sort_by, "firstName"),
            vec![SortRule::ascending("firstName")]
        );
    }

    #[test]
    fn test_reanchor_page_index_keeps_first_row() {
        // Row 30 is first on page 3 of size 10, and on page 1 of size 20.
        assert_eq!(reanchor_page_index(3, 10, 20), 1);
        assert_eq!(reanchor_page_index(1, 20, 5), 4);
        assert_eq!(reanchor_page_index(0, 10, 40), 0);
        assert_eq!(reanchor_page_index(2, 10, 0), 0);
    }

    #[test]
    fn test_query_state_wire_shape() {
        let state = QueryState::new(5)
            .with_page_index(2)
            .with_sort(vec![SortRule::descending("age")])
            .with_filter(filter(&[("q", "ann")]));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sortBy": [{"id": "age", "desc": true}],
                "pageIndex": 2,
                "pageSize": 5,
                "filter": {"q": "ann"}
            })
        );
    }
}
