//! dexterm - terminal browser for a paginated creature catalog
//!
//! The library holds everything except the terminal entrypoint:
//! - **Paging**: `PagingController` owns the accumulated list, dedup and
//!   the single outstanding page fetch
//! - **Projection**: pure mapping from load state + search text to what
//!   the screen shows
//! - **Transport**: `CatalogClient` seam with a reqwest implementation,
//!   plus connectivity probing and error classification
//!
//! The TUI binary needs the `native` feature:
//! ```bash
//! cargo run --features native --bin dexterm
//! ```

// Core modules
pub mod constants;
pub mod error;
pub mod types;
pub mod util_text;

// Configuration (CLI > env > file > defaults)
pub mod config;

// Transport
pub mod classify;
pub mod client;
pub mod connectivity;
pub mod net;

// Paging and presentation state
pub mod detail;
pub mod filter;
pub mod paging;
pub mod projection;

// Terminal front-end
pub mod app;
pub mod clipboard;
pub mod ui;

// Re-export commonly used types
pub use app::{App, InputMode};
pub use classify::ErrorClassifier;
pub use client::{CatalogClient, HttpCatalogClient};
pub use config::Config;
pub use connectivity::{ConnectivityProbe, StaticProbe, TcpProbe};
pub use error::{ErrorCategory, Failure, TransportFault};
pub use paging::{Dispatch, LoadState, Notice, PagingController};
pub use projection::DisplayState;
pub use types::{CatalogDetail, CatalogItem, PageRequest};
