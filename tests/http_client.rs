use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use dexterm::classify::ErrorClassifier;
use dexterm::client::{CatalogClient, HttpCatalogClient};
use dexterm::connectivity::StaticProbe;
use dexterm::error::TransportFault;
use dexterm::paging::{LoadState, PagingController};
use dexterm::types::PageRequest;

const NAMES: [&str; 5] = ["bulbasaur", "ivysaur", "venusaur", "charmander", "charmeleon"];

#[derive(Clone, Default)]
struct Hits {
    flaky: Arc<AtomicUsize>,
    gone: Arc<AtomicUsize>,
}

async fn list(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: usize = q.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let offset: usize = q.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let results: Vec<Value> = NAMES
        .iter()
        .enumerate()
        .skip(offset)
        .take(limit)
        .map(|(i, name)| {
            json!({
                "name": name,
                "url": format!("https://pokeapi.co/api/v2/pokemon/{}/", i + 1),
            })
        })
        .collect();
    Json(json!({
        "count": NAMES.len(),
        "next": null,
        "previous": null,
        "results": results,
    }))
}

async fn detail(Path(id): Path<String>) -> impl IntoResponse {
    if id != "25" {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    Json(json!({
        "id": 25,
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "base_experience": 112,
        "types": [{ "slot": 1, "type": { "name": "electric", "url": "" } }],
        "abilities": [
            { "ability": { "name": "static", "url": "" }, "is_hidden": false },
            { "ability": { "name": "lightning-rod", "url": "" }, "is_hidden": true }
        ],
        "stats": [{ "base_stat": 35, "stat": { "name": "hp", "url": "" } }],
        "sprites": {
            "front_default": "https://img.example/25.png",
            "other": { "official-artwork": { "front_default": "https://img.example/art/25.png" } }
        }
    }))
    .into_response()
}

/// Fails with 503 on the first hit, then serves the list
async fn flaky_list(
    State(hits): State<Hits>,
    query: Query<HashMap<String, String>>,
) -> axum::response::Response {
    if hits.flaky.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response();
    }
    list(query).await.into_response()
}

/// Full page whose middle entry has no resource URL
async fn list_with_bad_entry() -> Json<Value> {
    Json(json!({
        "count": 3,
        "results": [
            { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" },
            { "name": "missingno", "url": "" },
            { "name": "venusaur", "url": "https://pokeapi.co/api/v2/pokemon/3/" }
        ]
    }))
}

async fn gone_list(State(hits): State<Hits>) -> impl IntoResponse {
    hits.gone.fetch_add(1, Ordering::SeqCst);
    (StatusCode::GONE, "gone for good")
}

async fn serve() -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/api/v2/pokemon", get(list))
        .route("/api/v2/pokemon/:id", get(detail))
        .route("/flaky/pokemon", get(flaky_list))
        .route("/broken/pokemon", get(|| async { "<html>oops</html>" }))
        .route("/noid/pokemon", get(list_with_bad_entry))
        .route("/gone/pokemon", get(gone_list))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn client(addr: SocketAddr, prefix: &str, retries: u32) -> HttpCatalogClient {
    HttpCatalogClient::new(
        &format!("http://{addr}/{prefix}/"),
        Duration::from_secs(5),
        retries,
    )
    .unwrap()
}

#[tokio::test]
async fn fetches_pages_in_server_order() {
    let (addr, _) = serve().await;
    let client = client(addr, "api/v2", 0);
    assert_eq!(client.base_url().path(), "/api/v2/");

    let first = client.fetch_page(PageRequest { limit: 3, offset: 0 }).await.unwrap();
    let ids: Vec<&str> = first.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(first[0].name, "bulbasaur");

    let rest = client.fetch_page(PageRequest { limit: 3, offset: 3 }).await.unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[1].name, "charmeleon");

    let past_end = client.fetch_page(PageRequest { limit: 3, offset: 9 }).await.unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn fetches_detail() {
    let (addr, _) = serve().await;
    let client = client(addr, "api/v2", 0);

    let d = client.fetch_detail("25").await.unwrap();
    assert_eq!(d.name, "pikachu");
    assert_eq!(d.types, vec!["electric"]);
    assert_eq!(d.abilities, vec!["static", "lightning-rod (hidden)"]);
    assert_eq!(d.stats[0].base, 35);
    assert_eq!(
        d.sprites.official_artwork.as_deref(),
        Some("https://img.example/art/25.png")
    );
}

#[tokio::test]
async fn not_found_is_a_status_fault() {
    let (addr, _) = serve().await;
    let client = client(addr, "api/v2", 2);

    let err = client.fetch_detail("9999").await.unwrap_err();
    match &err {
        TransportFault::Status { status, body } => {
            assert_eq!(*status, 404);
            assert_eq!(body, "Not Found");
        }
        other => panic!("unexpected fault {other:?}"),
    }
}

#[tokio::test]
async fn transient_status_is_retried() {
    let (addr, hits) = serve().await;
    let client = client(addr, "flaky", 1);

    let items = client.fetch_page(PageRequest { limit: 2, offset: 0 }).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(hits.flaky.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn transient_status_surfaces_when_retries_run_out() {
    let (addr, hits) = serve().await;
    let client = client(addr, "flaky", 0);

    let err = client.fetch_page(PageRequest { limit: 2, offset: 0 }).await.unwrap_err();
    assert!(matches!(err, TransportFault::Status { status: 503, .. }));
    assert_eq!(hits.flaky.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (addr, hits) = serve().await;
    let client = client(addr, "gone", 3);

    let err = client.fetch_page(PageRequest::first(2)).await.unwrap_err();
    assert!(matches!(err, TransportFault::Status { status: 410, .. }));
    assert_eq!(hits.gone.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_body_is_a_decode_fault() {
    let (addr, _) = serve().await;
    let client = client(addr, "broken", 0);

    let err = client.fetch_page(PageRequest::first(2)).await.unwrap_err();
    assert!(matches!(err, TransportFault::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_a_connect_fault() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(addr, "api/v2", 0);

    let err = client.fetch_page(PageRequest::first(2)).await.unwrap_err();
    assert!(matches!(err, TransportFault::Connect(_)), "got {err:?}");
}

#[tokio::test]
async fn entry_without_id_fails_the_page() {
    let (addr, _) = serve().await;
    let client = client(addr, "noid", 0);

    let err = client.fetch_page(PageRequest::first(3)).await.unwrap_err();
    assert!(matches!(err, TransportFault::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn entry_without_id_does_not_end_paging_early() {
    let (addr, _) = serve().await;
    let probe = Arc::new(StaticProbe::online());
    let mut ctl = PagingController::with_limit(
        Arc::new(client(addr, "noid", 0)),
        probe.clone(),
        ErrorClassifier::new(probe),
        3,
    );

    ctl.start();
    assert!(ctl.settle().await);
    match ctl.state() {
        LoadState::Failed(failure) => assert!(failure.retryable),
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(ctl.next_offset(), 0);
    assert!(ctl.items().is_empty());
}
