use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pageflow_core::error::Error as CoreError;
use pageflow_core::query::FetchIntent;
use pageflow_core::sequence::SequenceGate;
use pageflow_core::view::{FetchResult, ViewState, ViewStore};

use crate::transport::Transport;

/// What happened to a fetch once its result arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The result was the latest issued and now backs the view.
    Applied(Arc<ViewState>),
    /// The latest request failed; the view kept its data and raised the
    /// error flag.
    Failed(Arc<ViewState>),
    /// A newer request was issued meanwhile; the result was dropped.
    Stale { sequence: u64, latest: u64 },
}

/// Issues one fetch per intent and lets only the latest one reach the view.
///
/// Older requests are never cancelled. They may still be in flight when a
/// newer one is issued; their results are discarded on arrival.
pub struct FetchCoordinator {
    gate: Mutex<SequenceGate>,
    store: ViewStore,
    transport: Arc<dyn Transport>,
}

impl FetchCoordinator {
    pub fn new(store: ViewStore, transport: Arc<dyn Transport>) -> Self {
        Self {
            gate: Mutex::new(SequenceGate::new()),
            store,
            transport,
        }
    }

    /// Latest sequence issued so far.
    pub fn latest(&self) -> u64 {
        self.lock_gate().latest()
    }

    /// Stamp `intent` with a fresh sequence and mark the view as loading.
    ///
    /// Any sequence already carried by the intent is replaced, so resubmitting
    /// an old intent supersedes everything still pending.
    pub fn issue(&self, intent: FetchIntent) -> FetchIntent {
        let mut gate = self.lock_gate();
        let sequence = gate.issue();
        self.store.update(ViewState::with_loading);
        log::debug!(
            "issued sequence {sequence} for page {}",
            intent.state.page_index
        );
        intent.with_sequence(sequence)
    }

    /// Issue `intent` now and return the future performing the request.
    ///
    /// The sequence is assigned before this returns, so intents keep the order
    /// in which `execute` was called even when the futures are spawned and
    /// polled in a different order.
    pub fn execute(
        self: &Arc<Self>,
        intent: FetchIntent,
    ) -> impl Future<Output = Result<FetchOutcome, CoreError>> + Send + 'static {
        let intent = self.issue(intent);
        let coordinator = Arc::clone(self);
        async move { coordinator.resolve(intent).await }
    }

    async fn resolve(&self, intent: FetchIntent) -> Result<FetchOutcome, CoreError> {
        let sequence = intent.sequence;
        let result = match self.transport.fetch(&intent.state).await {
            Ok(page) => FetchResult::Success { sequence, page },
            Err(err) => FetchResult::Failure {
                sequence,
                error: CoreError::TransportFailure(err.to_string()).to_string(),
            },
        };
        self.complete(result)
    }

    /// Apply a result if, and only if, it belongs to the latest request.
    ///
    /// Returns `CoreError::SequenceAhead` for a sequence that was never issued.
    pub fn complete(&self, result: FetchResult) -> Result<FetchOutcome, CoreError> {
        let gate = self.lock_gate();

        match gate.admit(result.sequence()) {
            Ok(()) => {
                let failed = matches!(result, FetchResult::Failure { .. });
                let view = self.store.update(|view| view.apply(result));
                if failed {
                    log::warn!(
                        "fetch {} failed: {}",
                        view.sequence,
                        view.error.as_deref().unwrap_or_default()
                    );
                    Ok(FetchOutcome::Failed(view))
                } else {
                    Ok(FetchOutcome::Applied(view))
                }
            }
            Err(CoreError::StaleResult { sequence, latest }) => {
                log::debug!("discarding stale result {sequence}, latest is {latest}");
                Ok(FetchOutcome::Stale { sequence, latest })
            }
            Err(err) => {
                log::error!("{err}");
                Err(err)
            }
        }
    }

    fn lock_gate(&self) -> MutexGuard<'_, SequenceGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
