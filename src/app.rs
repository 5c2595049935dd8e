use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::AbortHandle;

use crate::classify::ErrorClassifier;
use crate::client::CatalogClient;
use crate::connectivity::ConnectivityProbe;
use crate::constants::app as consts;
use crate::detail::load_detail;
use crate::error::Failure;
use crate::paging::{Dispatch, Notice, PagingController};
use crate::projection::DisplayState;
use crate::types::{CatalogDetail, CatalogItem};
use crate::util_text::image_url;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Detail overlay content
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loading { id: String, name: String },
    Ready(CatalogDetail),
    Failed { id: String, name: String, failure: Failure },
}

#[derive(Debug)]
pub enum AppEvent {
    DetailLoaded {
        seq: u64,
        result: Result<CatalogDetail, Failure>,
    },
}

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

pub struct App {
    quit: bool,
    fps: u32,
    input_mode: InputMode,

    controller: PagingController,
    display_rx: watch::Receiver<DisplayState>,
    notices_rx: broadcast::Receiver<Notice>,
    display: DisplayState,
    selection: usize,

    // Detail overlay: seq identifies the request the overlay is waiting for
    client: Arc<dyn CatalogClient>,
    probe: Arc<dyn ConnectivityProbe>,
    classifier: ErrorClassifier,
    detail: Option<DetailView>,
    detail_seq: u64,
    detail_task: Option<AbortHandle>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,

    image_base_url: String,
    toast_message: Option<(String, Instant)>,
    spinner: usize,
}

impl App {
    pub fn new(
        controller: PagingController,
        client: Arc<dyn CatalogClient>,
        probe: Arc<dyn ConnectivityProbe>,
        classifier: ErrorClassifier,
        image_base_url: String,
        fps: u32,
    ) -> Self {
        let mut display_rx = controller.subscribe();
        let notices_rx = controller.subscribe_notices();
        let display = display_rx.borrow_and_update().clone();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            quit: false,
            fps,
            input_mode: InputMode::Normal,
            controller,
            display_rx,
            notices_rx,
            display,
            selection: 0,
            client,
            probe,
            classifier,
            detail: None,
            detail_seq: 0,
            detail_task: None,
            events_tx,
            events_rx,
            image_base_url,
            toast_message: None,
            spinner: 0,
        }
    }

    // ----- getters -----
    pub fn fps(&self) -> u32 {
        self.fps
    }
    pub fn quit_flag(&self) -> bool {
        self.quit
    }
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }
    pub fn display(&self) -> &DisplayState {
        &self.display
    }
    pub fn selection(&self) -> usize {
        self.selection
    }
    pub fn search_query(&self) -> &str {
        self.controller.query()
    }
    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }
    pub fn controller(&self) -> &PagingController {
        &self.controller
    }
    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }
    pub fn spinner_frame(&self) -> &'static str {
        SPINNER[self.spinner % SPINNER.len()]
    }
    pub fn loaded_count(&self) -> usize {
        self.controller.items().len()
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.display.items().get(self.selection)
    }

    pub fn selected_image_url(&self) -> Option<String> {
        self.selected_item()
            .map(|item| image_url(&self.image_base_url, &item.id))
    }

    /// Show a toast notification for a couple of seconds
    pub fn show_toast(&mut self, msg: String) {
        self.toast_message = Some((msg, Instant::now()));
    }

    /// Get current toast message if still active
    pub fn toast_message(&self) -> Option<&str> {
        const TOAST_DURATION: Duration = Duration::from_secs(consts::TOAST_DURATION_SECS);
        self.toast_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < TOAST_DURATION {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    // ----- lifecycle -----

    pub fn start(&mut self, initial_query: &str) {
        if !initial_query.is_empty() {
            self.controller.set_search_query(initial_query);
        }
        self.controller.start();
        self.sync();
    }

    /// Apply finished fetches and refresh the snapshot (once per frame)
    pub fn tick(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
        self.controller.poll_events();
        while let Ok(ev) = self.events_rx.try_recv() {
            self.on_event(ev);
        }
        self.sync();
    }

    /// Wait for the outstanding page fetch and apply it
    pub async fn settle(&mut self) -> bool {
        let applied = self.controller.settle().await;
        self.sync();
        applied
    }

    /// Wait for the outstanding detail fetch and apply it
    pub async fn settle_detail(&mut self) -> bool {
        if !matches!(self.detail, Some(DetailView::Loading { .. })) {
            return false;
        }
        match self.events_rx.recv().await {
            Some(ev) => {
                self.on_event(ev);
                true
            }
            None => false,
        }
    }

    pub fn on_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::DetailLoaded { seq, result } => {
                if seq != self.detail_seq {
                    log::debug!("[app] dropping stale detail result seq={seq}");
                    return;
                }
                self.detail_task = None;
                let (id, name) = match &self.detail {
                    Some(DetailView::Loading { id, name }) => (id.clone(), name.clone()),
                    // Overlay closed meanwhile
                    _ => return,
                };
                self.detail = Some(match result {
                    Ok(detail) => DetailView::Ready(detail),
                    Err(failure) => DetailView::Failed { id, name, failure },
                });
            }
        }
    }

    /// Pull the latest projection and any transient notices from the controller
    fn sync(&mut self) {
        if self.display_rx.has_changed().unwrap_or(false) {
            self.display = self.display_rx.borrow_and_update().clone();
        }
        loop {
            match self.notices_rx.try_recv() {
                Ok(notice) => self.show_toast(notice.message),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    log::debug!("[app] skipped {n} notices");
                }
                Err(_) => break,
            }
        }
        let len = self.display.items().len();
        if len == 0 {
            self.selection = 0;
        } else if self.selection >= len {
            self.selection = len - 1;
        }
    }

    // ----- navigation -----

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }
    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }
    pub fn select_down(&mut self) {
        self.move_selection(consts::GRID_COLUMNS as isize);
    }
    pub fn select_up(&mut self) {
        self.move_selection(-(consts::GRID_COLUMNS as isize));
    }
    pub fn select_first(&mut self) {
        self.selection = 0;
    }
    pub fn select_last(&mut self) {
        self.selection = self.display.items().len().saturating_sub(1);
        self.maybe_load_more();
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.display.items().len();
        if len == 0 {
            return;
        }
        let next = self.selection as isize + delta;
        self.selection = next.clamp(0, len as isize - 1) as usize;
        self.maybe_load_more();
    }

    /// Reaching the last row of the grid asks for the next page
    fn maybe_load_more(&mut self) {
        let len = self.display.items().len();
        if len == 0 || !self.display.can_load_more() || self.display.is_loading_more() {
            return;
        }
        if self.selection + consts::GRID_COLUMNS >= len {
            if let Dispatch::Issued(req) = self.controller.load_more() {
                log::debug!("[app] load more at selection {} -> {}", self.selection, req);
            }
            self.sync();
        }
    }

    // ----- search -----

    pub fn enter_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn search_add_char(&mut self, c: char) {
        let mut q = self.controller.query().to_string();
        q.push(c);
        self.set_query(q);
    }

    pub fn search_backspace(&mut self) {
        let mut q = self.controller.query().to_string();
        q.pop();
        self.set_query(q);
    }

    /// Keep the query, leave input mode
    pub fn search_commit(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Clear the query and leave input mode
    pub fn search_cancel(&mut self) {
        self.set_query(String::new());
        self.input_mode = InputMode::Normal;
    }

    fn set_query(&mut self, q: String) {
        self.controller.set_search_query(q);
        self.selection = 0;
        self.sync();
    }

    // ----- intents -----

    /// Retry a failed first load, otherwise start over
    pub fn retry_or_refresh(&mut self) {
        let dispatch = if matches!(self.display, DisplayState::Error { .. }) {
            self.controller.retry()
        } else {
            self.controller.refresh()
        };
        log::info!("[app] retry/refresh -> {:?}", dispatch);
        self.selection = 0;
        self.sync();
    }

    pub fn open_detail(&mut self) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        self.abort_detail();
        self.detail_seq += 1;
        let seq = self.detail_seq;
        self.detail = Some(DetailView::Loading {
            id: item.id.clone(),
            name: item.name.clone(),
        });

        let client = Arc::clone(&self.client);
        let probe = Arc::clone(&self.probe);
        let classifier = self.classifier.clone();
        let tx = self.events_tx.clone();
        let handle = tokio::spawn(async move {
            let result = load_detail(client, probe, classifier, item.id).await;
            let _ = tx.send(AppEvent::DetailLoaded { seq, result });
        });
        self.detail_task = Some(handle.abort_handle());
    }

    pub fn close_detail(&mut self) {
        self.abort_detail();
        self.detail = None;
    }

    fn abort_detail(&mut self) {
        if let Some(task) = self.detail_task.take() {
            task.abort();
        }
    }

    pub fn copy_image_url(&mut self) {
        let Some(url) = self.selected_image_url() else {
            return;
        };
        if crate::clipboard::copy_to_clipboard(&url) {
            self.show_toast(format!("Copied {url}"));
        } else {
            self.show_toast("Copy failed".to_string());
        }
    }

    pub fn quit(&mut self) {
        self.close_detail();
        self.quit = true;
    }
}
