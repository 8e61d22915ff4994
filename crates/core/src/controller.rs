//! Query state controller
//!
//! Owns the authoritative `QueryState` of a view. Every navigation intent
//! (page, page size, sort, filter) produces a new state which is settled
//! through `on_state_settled`: the controller either emits a corrected state
//! (page reset after a filter change) or exactly one `FetchIntent`.
//!
//! Events are delivered synchronously to a single listener registered with
//! `subscribe`, typically a closure that forwards fetch intents to the
//! coordinator.

use crate::config::PaginationConfig;
use crate::error::{Error, Result};
use crate::query::{
    normalize_filter, reanchor_page_index, reconcile, toggle_sort, FetchIntent, Filter,
    QueryState, Reconciliation, SortRule,
};
use crate::view::{ViewState, ViewStore};

/// Emitted by the controller when a settle completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The filter changed off the first page; the state was rewritten to
    /// page 0 and no fetch was issued for the stale page.
    PageReset(QueryState),
    /// Data for this state must be loaded.
    Fetch(FetchIntent),
}

type Listener = Box<dyn FnMut(ControllerEvent) + Send>;

pub struct QueryStateController {
    config: PaginationConfig,
    store: ViewStore,
    current: QueryState,
    /// State of the last emitted fetch intent.
    last_fetched: Option<QueryState>,
    listener: Option<Listener>,
}

impl std::fmt::Debug for QueryStateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStateController")
            .field("config", &self.config)
            .field("current", &self.current)
            .field("last_fetched", &self.last_fetched)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl QueryStateController {
    /// Create a controller for an unsorted, unfiltered first page using the
    /// configured initial page size. The view starts out loading.
    pub fn new(config: PaginationConfig) -> Result<Self> {
        config.validate()?;

        let current = QueryState::new(config.initial_page_size);
        let store = ViewStore::new(ViewState::initial(current.clone()));

        Ok(Self {
            config,
            store,
            current,
            last_fetched: None,
            listener: None,
        })
    }

    /// Register the listener receiving every `ControllerEvent`. A later call
    /// replaces the previous listener.
    pub fn subscribe(&mut self, listener: impl FnMut(ControllerEvent) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn state(&self) -> &QueryState {
        &self.current
    }

    /// Handle to the shared view snapshot.
    pub fn store(&self) -> ViewStore {
        self.store.clone()
    }

    /// Initial load.
    pub fn start(&mut self) {
        let current = self.current.clone();
        self.on_state_settled(None, current);
    }

    /// Replace the filter wholesale with the trimmed `raw` filter.
    pub fn submit_filter(&mut self, raw: Filter) {
        let filter = normalize_filter(raw);
        let next = self.current.clone().with_filter(filter);
        self.apply(next);
    }

    /// Navigate to a zero-based page, clamped to the page count of the last
    /// successful fetch.
    pub fn go_to_page(&mut self, page_index: usize) {
        let last = self.store.snapshot().total_pages.saturating_sub(1);
        let next = self.current.clone().with_page_index(page_index.min(last));
        self.apply(next);
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.go_to_page(self.current.page_index + 1);
        }
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.go_to_page(self.current.page_index - 1);
        }
    }

    pub fn first_page(&mut self) {
        self.go_to_page(0);
    }

    pub fn last_page(&mut self) {
        let total_pages = self.store.snapshot().total_pages;
        self.go_to_page(total_pages.saturating_sub(1));
    }

    pub fn can_previous_page(&self) -> bool {
        self.current.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.current.page_index + 1 < self.store.snapshot().total_pages
    }

    /// Change the page size, keeping the first visible row on screen.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(Error::InvalidPageSize(page_size));
        }

        let page_index =
            reanchor_page_index(self.current.page_index, self.current.page_size, page_size);
        let mut next = self.current.clone().with_page_index(page_index);
        next.page_size = page_size;
        self.apply(next);
        Ok(())
    }

    /// Header click on `field`: ascending, then descending, then unsorted.
    pub fn toggle_sort(&mut self, field: &str) {
        let sort_by = toggle_sort(&self.current.sort_by, field);
        let next = self.current.clone().with_sort(sort_by);
        self.apply(next);
    }

    /// Replace the sort specification, keeping the caller's column order.
    pub fn set_sort(&mut self, sort_by: Vec<SortRule>) {
        let next = self.current.clone().with_sort(sort_by);
        self.apply(next);
    }

    /// Request the current state again, e.g. after a transport failure.
    pub fn retry(&mut self) {
        let intent = FetchIntent::new(self.current.clone(), false);
        self.issue(intent);
    }

    /// Reconciliation entry point.
    ///
    /// `previous` is the state of the last fetch, absent on initial load.
    /// Emits at most one `FetchIntent`; a filter change away from the first
    /// page emits a `PageReset` first and then settles the corrected state.
    pub fn on_state_settled(&mut self, previous: Option<QueryState>, current: QueryState) {
        match reconcile(previous.as_ref(), &current) {
            Reconciliation::ResetPage(corrected) => {
                self.publish(corrected.clone());
                self.emit(ControllerEvent::PageReset(corrected.clone()));
                self.on_state_settled(previous, corrected);
            }
            Reconciliation::Fetch(intent) => {
                self.publish(intent.state.clone());
                self.issue(intent);
            }
        }
    }

    fn apply(&mut self, next: QueryState) {
        if next == self.current {
            return;
        }
        self.publish(next.clone());
        let previous = self.last_fetched.clone();
        self.on_state_settled(previous, next);
    }

    fn publish(&mut self, state: QueryState) {
        self.current = state.clone();
        self.store.update(|view| view.with_query_state(state));
    }

    fn issue(&mut self, intent: FetchIntent) {
        log::debug!(
            "fetch intent: page {} size {} filter_changed={}",
            intent.state.page_index,
            intent.state.page_size,
            intent.filter_changed
        );
        self.last_fetched = Some(intent.state.clone());
        self.store.update(ViewState::with_loading);
        self.emit(ControllerEvent::Fetch(intent));
    }

    fn emit(&mut self, event: ControllerEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}
