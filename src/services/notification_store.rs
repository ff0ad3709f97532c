use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::domain::errors::{FeedError, FeedResult};
use crate::domain::ports::notification_api::NotificationApi;
use crate::models::NotificationRecord;

/// Where a feed sits in its fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Error,
}

/// Paging state of one feed instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub items: Vec<NotificationRecord>,
    pub offset: usize,
    pub page_size: usize,
    pub exhausted: bool,
    pub loading: bool,
    pub error: Option<FeedError>,
    /// Bumped on every reset; responses from an older generation are dropped
    pub generation: u64,
}

impl FeedState {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            page_size,
            exhausted: false,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn phase(&self) -> FeedPhase {
        if self.loading {
            FeedPhase::Loading
        } else if self.error.is_some() {
            FeedPhase::Error
        } else {
            FeedPhase::Idle
        }
    }
}

/// Why a load request was turned away without touching the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
}

impl SkipReason {
    fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InFlight => "in_flight",
            SkipReason::Exhausted => "exhausted",
        }
    }
}

/// Result of a load call, for callers that want more than polling `error`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was applied; holds the number of records returned
    Loaded(usize),
    Skipped(SkipReason),
    /// The request failed and the error was stored on the feed
    Failed,
    /// A reset happened while the request was in flight
    Discarded,
}

#[derive(Debug, Clone, Copy)]
enum ApplyMode {
    Replace,
    Append,
}

/// Holds the loading flag for one request and releases it if the request
/// future is dropped before a response is applied.
struct InFlight<'a> {
    state: &'a watch::Sender<FeedState>,
    generation: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let generation = self.generation;
        self.state.send_if_modified(|state| {
            if state.generation == generation && state.loading {
                state.loading = false;
                true
            } else {
                false
            }
        });
    }
}

/// Paginated view of the notifications resource for a single presenter.
///
/// The `loading` flag is checked and set under the watch channel's lock
/// before the request is issued, so at most one fetch per store is in
/// flight no matter how many tasks call into it.
pub struct NotificationStore {
    api: Arc<dyn NotificationApi>,
    state: watch::Sender<FeedState>,
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationApi>, page_size: usize) -> Self {
        let (state, _) = watch::channel(FeedState::new(page_size.max(1)));
        Self { api, state }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Render binding; dropping the receiver detaches it
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Stream of states, starting with the current one
    pub fn changes(&self) -> WatchStream<FeedState> {
        WatchStream::new(self.state.subscribe())
    }

    pub fn page_size(&self) -> usize {
        self.state.borrow().page_size
    }

    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<FeedError> {
        self.state.borrow().error.clone()
    }

    /// Single list request; does not touch the feed state
    pub async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> FeedResult<Vec<NotificationRecord>> {
        debug!("Fetching notifications skip={} limit={}", offset, limit);
        match self.api.list_notifications(offset, limit).await {
            Ok(page) => {
                metrics::counter!("notification_feed_fetches_total", "outcome" => "success")
                    .increment(1);
                debug!("Fetched {} notifications at offset {}", page.len(), offset);
                Ok(page)
            }
            Err(e) => {
                metrics::counter!("notification_feed_fetches_total", "outcome" => "failure")
                    .increment(1);
                warn!("Fetching notifications at offset {} failed: {}", offset, e);
                Err(e)
            }
        }
    }

    /// Fetch the first page and replace the feed with it.
    ///
    /// On failure the current items are kept and `error` is set.
    pub async fn load_initial(&self) -> LoadOutcome {
        let mut ticket = None;
        self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            ticket = Some(state.generation);
            true
        });

        let Some(generation) = ticket else {
            return self.skipped(SkipReason::InFlight);
        };

        let page_size = self.page_size();
        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            settled: false,
        };
        let result = self.fetch_page(0, page_size).await;
        in_flight.settled = true;
        self.apply(generation, ApplyMode::Replace, result)
    }

    /// Fetch the next page and append it.
    ///
    /// No-op while a fetch is in flight or once the feed is exhausted.
    pub async fn load_more(&self) -> LoadOutcome {
        let mut ticket = None;
        let mut skip = None;
        self.state.send_if_modified(|state| {
            if state.loading {
                skip = Some(SkipReason::InFlight);
                return false;
            }
            if state.exhausted {
                skip = Some(SkipReason::Exhausted);
                return false;
            }
            state.loading = true;
            ticket = Some((state.generation, state.offset, state.page_size));
            true
        });

        let Some((generation, offset, page_size)) = ticket else {
            return self.skipped(skip.unwrap_or(SkipReason::InFlight));
        };

        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            settled: false,
        };
        let result = self.fetch_page(offset, page_size).await;
        in_flight.settled = true;
        self.apply(generation, ApplyMode::Append, result)
    }

    /// Drop all paging progress. Any fetch still in flight will be discarded.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            state.items.clear();
            state.offset = 0;
            state.exhausted = false;
            state.error = None;
            state.loading = false;
            state.generation += 1;
        });
        debug!("Notification feed reset");
    }

    /// Reset and reload the first page, after a mutation elsewhere
    pub async fn refresh(&self) -> LoadOutcome {
        info!("Refreshing notification feed");
        self.reset();
        self.load_initial().await
    }

    fn skipped(&self, reason: SkipReason) -> LoadOutcome {
        metrics::counter!("notification_feed_skipped_total", "reason" => reason.as_str())
            .increment(1);
        debug!("Notification load skipped: {}", reason.as_str());
        LoadOutcome::Skipped(reason)
    }

    fn apply(
        &self,
        generation: u64,
        mode: ApplyMode,
        result: FeedResult<Vec<NotificationRecord>>,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::Discarded;
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.loading = false;

            match result {
                Ok(page) => {
                    let returned = page.len();
                    match mode {
                        ApplyMode::Replace => {
                            state.items = page;
                            state.offset = returned;
                        }
                        ApplyMode::Append => {
                            warn_on_overlap(&state.items, &page);
                            state.items.extend(page);
                            state.offset += returned;
                        }
                    }
                    state.exhausted = returned < state.page_size;
                    state.error = None;
                    outcome = LoadOutcome::Loaded(returned);
                }
                Err(e) => {
                    state.error = Some(e);
                    outcome = LoadOutcome::Failed;
                }
            }
            true
        });

        if outcome == LoadOutcome::Discarded {
            debug!("Discarding notification page from generation {}", generation);
        }
        outcome
    }
}

// Offsets shift when records are created or deleted mid-session, which can
// repeat a record across pages. Order is the server's; nothing is dropped.
fn warn_on_overlap(existing: &[NotificationRecord], page: &[NotificationRecord]) {
    let seen: HashSet<i64> = existing.iter().map(|record| record.id).collect();
    let repeated = page.iter().filter(|record| seen.contains(&record.id)).count();
    if repeated > 0 {
        warn!(
            "{} notification(s) on the next page were already loaded; the feed changed while paging",
            repeated
        );
    }
}
