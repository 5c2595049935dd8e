#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use dexterm::classify::ErrorClassifier;
use dexterm::client::CatalogClient;
use dexterm::connectivity::StaticProbe;
use dexterm::error::TransportFault;
use dexterm::paging::PagingController;
use dexterm::types::{CatalogDetail, CatalogItem, PageRequest, SpriteRefs};

pub type PageResult = Result<Vec<CatalogItem>, TransportFault>;

/// In-memory catalog: page results are served in queue order, details by id.
///
/// With a gate, every `fetch_page` parks until `release` hands it a permit,
/// which lets a test hold a fetch in flight while it issues more intents.
pub struct ScriptedClient {
    pages: Mutex<VecDeque<PageResult>>,
    details: Mutex<HashMap<String, Result<CatalogDetail, TransportFault>>>,
    requests: Mutex<Vec<PageRequest>>,
    detail_requests: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
    completed: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(pages: Vec<PageResult>) -> Arc<Self> {
        Arc::new(Self::build(pages, None))
    }

    pub fn gated(pages: Vec<PageResult>) -> Arc<Self> {
        Arc::new(Self::build(pages, Some(Semaphore::new(0))))
    }

    fn build(pages: Vec<PageResult>, gate: Option<Semaphore>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            details: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            detail_requests: Mutex::new(Vec::new()),
            gate,
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_detail(self: Arc<Self>, id: &str, result: Result<CatalogDetail, TransportFault>) -> Arc<Self> {
        self.details.lock().unwrap().insert(id.to_string(), result);
        self
    }

    /// Let `n` parked (or future) page fetches proceed
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn detail_requests(&self) -> Vec<String> {
        self.detail_requests.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for ScriptedClient {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<CatalogItem>, TransportFault> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        let next = self.pages.lock().unwrap().pop_front();
        self.completed.fetch_add(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_detail(&self, id: &str) -> Result<CatalogDetail, TransportFault> {
        self.detail_requests.lock().unwrap().push(id.to_string());
        self.details
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(TransportFault::Status {
                status: 404,
                body: "Not Found".into(),
            }))
    }
}

/// Items `#start..start+count` named `mon-<id>`
pub fn page(start: usize, count: usize) -> Vec<CatalogItem> {
    (start..start + count)
        .map(|i| CatalogItem::new((i + 1).to_string(), format!("mon-{}", i + 1)))
        .collect()
}

pub fn item(id: &str, name: &str) -> CatalogItem {
    CatalogItem::new(id, name)
}

pub fn detail(id: &str, name: &str) -> CatalogDetail {
    CatalogDetail {
        id: id.to_string(),
        name: name.to_string(),
        height: Some(4),
        weight: Some(60),
        base_experience: Some(112),
        types: vec!["electric".into()],
        abilities: vec!["static".into()],
        stats: Vec::new(),
        sprites: SpriteRefs::default(),
    }
}

pub fn timeout() -> TransportFault {
    TransportFault::Timeout("operation timed out".into())
}

/// Controller wired to a scripted client and a switchable probe
pub fn controller(
    client: &Arc<ScriptedClient>,
    probe: &Arc<StaticProbe>,
    limit: usize,
) -> PagingController {
    let classifier = ErrorClassifier::new(probe.clone());
    PagingController::with_limit(client.clone(), probe.clone(), classifier, limit)
}

/// Give spawned tasks a chance to run on the current-thread test runtime
pub async fn yield_now(times: usize) {
    for _ in 0..times {
        tokio::task::yield_now().await;
    }
}
