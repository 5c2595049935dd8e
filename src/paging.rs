//! Incremental list loading.
//!
//! `PagingController` owns the accumulated catalog and a small state machine:
//!
//! ```text
//! Idle ──start──► Loading ──ok──► Ready{loading_more=false}
//!                    │                 │  ▲
//!                    └─err─► Failed    │  └─ok/err── Ready{loading_more=true}
//!                              │       └──load_more──────────┘
//!                              └─retry──► Loading
//! refresh: any state ──► Loading (items cleared)
//! ```
//!
//! Fetches run on spawned tasks and report back through a channel the
//! controller owns; completions are applied by `on_event`, which is the only
//! place the item list changes. At most one fetch is outstanding at any time:
//! `loading_more` / `Loading` gate new requests and every (re)start aborts the
//! previous task and bumps a generation so late completions are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::AbortHandle;

use crate::classify::ErrorClassifier;
use crate::client::CatalogClient;
use crate::connectivity::ConnectivityProbe;
use crate::constants::{api, app};
use crate::error::{ErrorCategory, Failure, TransportFault};
use crate::projection::{project, DisplayState};
use crate::types::{CatalogItem, PageRequest};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    /// Never loaded
    Idle,
    /// First page in flight, no data yet
    Loading,
    Ready {
        /// Server order, unique by id
        items: Vec<CatalogItem>,
        loading_more: bool,
        can_load_more: bool,
    },
    Failed(Failure),
}

/// Outcome of an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A fetch was started for this request
    Issued(PageRequest),
    /// Offline: the fetch was skipped and the failure applied immediately
    ShortCircuited,
    /// Not valid in the current state; nothing changed
    Ignored,
}

/// Transient, non-destructive failure signal (a failed load-more)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub category: ErrorCategory,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Initial,
    More,
}

/// Completion of a spawned page fetch
#[derive(Debug)]
pub struct PageEvent {
    generation: u64,
    kind: FetchKind,
    request: PageRequest,
    result: Result<Vec<CatalogItem>, TransportFault>,
}

struct InFlight {
    generation: u64,
    request: PageRequest,
    handle: AbortHandle,
}

pub struct PagingController {
    client: Arc<dyn CatalogClient>,
    probe: Arc<dyn ConnectivityProbe>,
    classifier: ErrorClassifier,
    limit: usize,

    state: LoadState,
    query: String,
    seen_ids: HashSet<String>,
    next_offset: usize,

    generation: u64,
    in_flight: Option<InFlight>,
    events_tx: mpsc::UnboundedSender<PageEvent>,
    events_rx: mpsc::UnboundedReceiver<PageEvent>,

    display_tx: watch::Sender<DisplayState>,
    notice_tx: broadcast::Sender<Notice>,
    last_notice: Option<Notice>,
}

impl PagingController {
    /// Controller with the default page size
    pub fn new(
        client: Arc<dyn CatalogClient>,
        probe: Arc<dyn ConnectivityProbe>,
        classifier: ErrorClassifier,
    ) -> Self {
        Self::with_limit(client, probe, classifier, api::DEFAULT_LIMIT)
    }

    pub fn with_limit(
        client: Arc<dyn CatalogClient>,
        probe: Arc<dyn ConnectivityProbe>,
        classifier: ErrorClassifier,
        limit: usize,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (display_tx, _) = watch::channel(project(&LoadState::Idle, ""));
        let (notice_tx, _) = broadcast::channel(app::NOTICE_CAPACITY);
        Self {
            client,
            probe,
            classifier,
            limit: limit.max(1),
            state: LoadState::Idle,
            query: String::new(),
            seen_ids: HashSet::new(),
            next_offset: 0,
            generation: 0,
            in_flight: None,
            events_tx,
            events_rx,
            display_tx,
            notice_tx,
            last_notice: None,
        }
    }

    // ----- getters -----
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Offset the next load-more will request
    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub fn items(&self) -> &[CatalogItem] {
        match &self.state {
            LoadState::Ready { items, .. } => items,
            _ => &[],
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_load_more(&self) -> bool {
        matches!(
            self.state,
            LoadState::Ready {
                loading_more: false,
                can_load_more: true,
                ..
            }
        )
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    /// Current projection of `(state, query)`
    pub fn display(&self) -> DisplayState {
        project(&self.state, &self.query)
    }

    /// Receiver that is updated whenever the projection changes
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display_tx.subscribe()
    }

    /// Receiver of transient load-more failure notices
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    // ----- intents -----

    /// First load. Only valid from `Idle`.
    pub fn start(&mut self) -> Dispatch {
        if self.state != LoadState::Idle {
            log::debug!("[paging] start ignored in state {}", self.state_name());
            return Dispatch::Ignored;
        }
        self.begin_initial()
    }

    /// Re-issue the first load after a failure. Only valid from `Failed`.
    pub fn retry(&mut self) -> Dispatch {
        if !matches!(self.state, LoadState::Failed(_)) {
            log::debug!("[paging] retry ignored in state {}", self.state_name());
            return Dispatch::Ignored;
        }
        self.begin_initial()
    }

    /// Drop everything loaded so far and load the first page again. Valid from any state.
    pub fn refresh(&mut self) -> Dispatch {
        log::info!("[paging] refresh from state {}", self.state_name());
        self.begin_initial()
    }

    /// Fetch the next page. A silent no-op unless `Ready` with
    /// `loading_more == false` and `can_load_more == true`.
    pub fn load_more(&mut self) -> Dispatch {
        if !self.can_load_more() {
            log::debug!(
                "[paging] load_more ignored (state={}, in_flight={})",
                self.state_name(),
                self.in_flight.is_some()
            );
            return Dispatch::Ignored;
        }

        if !self.probe.is_available() {
            let failure = self.classifier.offline();
            log::warn!("[paging] load_more skipped: offline");
            self.emit_notice(&failure);
            return Dispatch::ShortCircuited;
        }

        if let LoadState::Ready { loading_more, .. } = &mut self.state {
            *loading_more = true;
        }
        let request = PageRequest {
            limit: self.limit,
            offset: self.next_offset,
        };
        self.spawn_fetch(FetchKind::More, request);
        self.publish();
        Dispatch::Issued(request)
    }

    /// Update the search query. Never fetches; only the projection changes.
    pub fn set_search_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.query {
            return;
        }
        log::debug!("[paging] search query {:?}", text);
        self.query = text;
        self.publish();
    }

    // ----- completions -----

    /// Wait for the outstanding fetch (if any) and apply it.
    /// Returns `false` when nothing was in flight.
    pub async fn settle(&mut self) -> bool {
        while self.in_flight.is_some() {
            match self.events_rx.recv().await {
                Some(ev) => {
                    if self.on_event(ev) {
                        return true;
                    }
                }
                None => return false,
            }
        }
        false
    }

    /// Apply every completion that has already arrived, without waiting.
    /// Returns how many changed the state.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(ev) = self.events_rx.try_recv() {
            if self.on_event(ev) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one completion. Completions that do not belong to the current
    /// in-flight fetch are dropped. Returns whether the event was applied.
    pub fn on_event(&mut self, ev: PageEvent) -> bool {
        let current = match &self.in_flight {
            Some(f) if f.generation == ev.generation && f.request == ev.request => true,
            _ => false,
        };
        if !current || ev.generation != self.generation {
            log::debug!(
                "[paging] dropping stale completion gen={} ({}), current gen={}",
                ev.generation,
                ev.request,
                self.generation
            );
            return false;
        }
        self.in_flight = None;

        match (ev.kind, ev.result) {
            (FetchKind::Initial, Ok(page)) => {
                let returned = page.len();
                let items = self.dedup(page);
                let can_load_more = returned == self.limit;
                self.next_offset = returned;
                log::info!(
                    "[paging] first page: {} items (can_load_more={})",
                    items.len(),
                    can_load_more
                );
                self.state = LoadState::Ready {
                    items,
                    loading_more: false,
                    can_load_more,
                };
            }
            (FetchKind::Initial, Err(fault)) => {
                let failure = self.classifier.failure(&fault);
                log::warn!(
                    "[paging] first page failed ({}): {}",
                    failure.category,
                    fault
                );
                self.state = LoadState::Failed(failure);
            }
            (FetchKind::More, Ok(page)) => {
                let returned = page.len();
                let fresh = self.dedup(page);
                let can_more = returned == self.limit;
                if let LoadState::Ready {
                    items,
                    loading_more,
                    can_load_more,
                } = &mut self.state
                {
                    let dropped = returned - fresh.len();
                    items.extend(fresh);
                    *loading_more = false;
                    *can_load_more = can_more;
                    self.next_offset += returned;
                    log::info!(
                        "[paging] page at offset {}: {} items, {} duplicate(s) dropped, total {} (can_load_more={})",
                        ev.request.offset,
                        returned,
                        dropped,
                        items.len(),
                        can_more
                    );
                }
            }
            (FetchKind::More, Err(fault)) => {
                if let LoadState::Ready { loading_more, .. } = &mut self.state {
                    *loading_more = false;
                }
                let failure = self.classifier.failure(&fault);
                log::warn!(
                    "[paging] page at offset {} failed ({}): {}",
                    ev.request.offset,
                    failure.category,
                    fault
                );
                self.emit_notice(&failure);
            }
        }
        self.publish();
        true
    }

    // ----- internals -----

    fn begin_initial(&mut self) -> Dispatch {
        self.cancel_in_flight();
        self.generation += 1;
        self.seen_ids.clear();
        self.next_offset = 0;
        self.last_notice = None;

        if !self.probe.is_available() {
            log::warn!("[paging] first load skipped: offline");
            self.state = LoadState::Failed(self.classifier.offline());
            self.publish();
            return Dispatch::ShortCircuited;
        }

        self.state = LoadState::Loading;
        let request = PageRequest::first(self.limit);
        self.spawn_fetch(FetchKind::Initial, request);
        self.publish();
        Dispatch::Issued(request)
    }

    fn spawn_fetch(&mut self, kind: FetchKind, request: PageRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.events_tx.clone();
        let generation = self.generation;
        log::info!("[paging] fetch {:?} gen={} {}", kind, generation, request);

        let handle = tokio::spawn(async move {
            let result = client.fetch_page(request).await;
            // Receiver gone means the controller was dropped
            let _ = tx.send(PageEvent {
                generation,
                kind,
                request,
                result,
            });
        });
        self.in_flight = Some(InFlight {
            generation,
            request,
            handle: handle.abort_handle(),
        });
    }

    fn cancel_in_flight(&mut self) {
        if let Some(f) = self.in_flight.take() {
            log::debug!("[paging] aborting in-flight fetch gen={} ({})", f.generation, f.request);
            f.handle.abort();
        }
    }

    /// Keep only items whose id has not been seen; first occurrence wins.
    fn dedup(&mut self, page: Vec<CatalogItem>) -> Vec<CatalogItem> {
        page.into_iter()
            .filter(|item| self.seen_ids.insert(item.id.clone()))
            .collect()
    }

    fn emit_notice(&mut self, failure: &Failure) {
        let notice = Notice {
            category: failure.category,
            message: failure.message.clone(),
        };
        // No receivers is fine: the notice is also kept as last_notice
        let _ = self.notice_tx.send(notice.clone());
        self.last_notice = Some(notice);
    }

    fn publish(&self) {
        let next = project(&self.state, &self.query);
        self.display_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn state_name(&self) -> &'static str {
        match &self.state {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Ready { loading_more: true, .. } => "ready(loading_more)",
            LoadState::Ready { .. } => "ready",
            LoadState::Failed(_) => "failed",
        }
    }
}

impl Drop for PagingController {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}
