//! Application constants
//!
//! Centralized defaults for the catalog API, user-facing strings, error
//! keywords and UI timing used throughout the application.

/// Catalog API defaults
pub mod api {
    /// Base URL of the public catalog API (list and detail endpoints hang off it)
    pub const BASE_URL: &str = "https://pokeapi.co/api/v2/";

    /// Path segment of the list/detail resource, relative to `BASE_URL`
    pub const RESOURCE: &str = "pokemon";

    /// Base URL for list item artwork; the image for an item is `<base><id>.png`
    pub const IMAGE_BASE_URL: &str =
        "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/";

    /// Page size of every list fetch unless configured otherwise
    pub const DEFAULT_LIMIT: usize = 151;

    /// Offset of the first page
    pub const DEFAULT_OFFSET: usize = 0;

    /// Upper bound accepted for a configured page size
    pub const MAX_LIMIT: usize = 1000;

    /// Default per-request transport timeout (milliseconds)
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    /// Default number of transport-level retries for 429/5xx/IO failures
    pub const DEFAULT_RETRIES: u32 = 2;

    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("dexterm/", env!("CARGO_PKG_VERSION"));
}

/// Connectivity probe defaults
pub mod probe {
    /// TCP connect timeout for the reachability check (milliseconds)
    pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

    /// How long a probe answer is reused before probing again (milliseconds)
    pub const CACHE_MS: u64 = 2000;
}

/// User-facing message strings
pub mod messages {
    pub const NO_INTERNET: &str = "No Internet Connection";

    pub const TIMEOUT: &str = "Request timed out. Please try again.";

    /// Fallback when a fault carries no text of its own
    pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

    /// Shown when the catalog (or the current search) has no entries
    pub const NO_ENTRIES: &str = "No entries found";

    pub const LOADING: &str = "Loading catalog…";
}

/// Substrings used by the fallback text heuristic of the error classifier.
/// Matched against the lower-cased fault message.
pub mod keywords {
    pub const TIMEOUT: &[&str] = &["timeout", "timed out"];

    pub const NO_CONNECTIVITY: &[&str] = &["no internet", "network", "unreachable"];
}

/// Application state and behavior constants
pub mod app {
    /// Duration to show toast notifications (seconds)
    pub const TOAST_DURATION_SECS: u64 = 2;

    /// Number of columns in the catalog grid
    pub const GRID_COLUMNS: usize = 2;

    /// Capacity of the transient notice channel
    pub const NOTICE_CAPACITY: usize = 16;
}

/// UI layout constants
pub mod ui {
    /// Minimum terminal width in columns for usable display
    pub const MIN_WIDTH: u16 = 40;

    /// Minimum terminal height in rows for usable display
    pub const MIN_HEIGHT: u16 = 10;
}
