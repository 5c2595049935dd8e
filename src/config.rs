use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{api, probe};

/// dexterm - terminal browser for a paginated creature catalog
///
/// Configuration priority: CLI args > Environment variables > Config file > Defaults
#[derive(Parser, Debug, Default)]
#[command(name = "dexterm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse a paginated creature catalog in the terminal", long_about = None)]
pub struct CliArgs {
    /// TOML config file
    #[arg(long, env = "DEXTERM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog API base URL
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Base URL for item artwork (<base><id>.png)
    #[arg(long, env = "IMAGE_BASE_URL")]
    pub image_base_url: Option<String>,

    /// Items per page (1-1000)
    #[arg(long, env = "PAGE_LIMIT")]
    pub page_limit: Option<usize>,

    /// Request timeout in milliseconds (1000-60000)
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Transport retries on 429/5xx/connection errors (0-10)
    #[arg(long, env = "REQUEST_RETRIES")]
    pub request_retries: Option<u32>,

    /// Connectivity probe timeout in milliseconds (100-10000)
    #[arg(long, env = "PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Skip the connectivity probe and treat the network as available
    #[arg(long, env = "ASSUME_ONLINE")]
    pub assume_online: Option<bool>,

    /// Initial search query
    #[arg(long, env = "DEFAULT_SEARCH")]
    pub search: Option<String>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "RENDER_FPS")]
    pub render_fps: Option<u32>,

    /// Log file (the TUI owns the terminal)
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the loaded catalog as JSON instead of starting the TUI
    #[arg(long)]
    pub headless: bool,

    /// Pages to load in headless mode (1-50)
    #[arg(long)]
    pub pages: Option<usize>,
}

/// Config file layout; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_base_url: Option<String>,
    pub image_base_url: Option<String>,
    pub page_limit: Option<usize>,
    pub request_timeout_ms: Option<u64>,
    pub request_retries: Option<u32>,
    pub probe_timeout_ms: Option<u64>,
    pub assume_online: Option<bool>,
    pub search: Option<String>,
    pub render_fps: Option<u32>,
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub image_base_url: String,
    pub page_limit: usize,
    pub request_timeout_ms: u64,
    pub request_retries: u32,
    pub probe_timeout_ms: u64,
    pub assume_online: bool,
    pub default_search: String,
    pub render_fps: u32,
    pub log_file: PathBuf,
    pub headless: bool,
    pub headless_pages: usize,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format: parseable, http(s), with a host
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    let parsed = url::Url::parse(url).with_context(|| format!("{name} is not a valid URL"))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        "http" | "https" => Err(anyhow!("{name} has no host")),
        _ => Err(anyhow!("{name} must start with http:// or https://")),
    }
}

/// Load configuration from CLI args, environment and optional config file
pub fn load() -> Result<Config> {
    resolve(CliArgs::parse())
}

/// Read and parse a TOML config file
pub fn load_file(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}

/// Merge parsed args with the config file they point at (if any) and defaults
pub fn resolve(args: CliArgs) -> Result<Config> {
    let file = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            load_file(path)?
        }
        None => FileConfig::default(),
    };
    merge(args, file)
}

/// CLI/env values win over file values; defaults fill the rest
pub fn merge(args: CliArgs, file: FileConfig) -> Result<Config> {
    let api_base_url = args
        .api_base_url
        .or(file.api_base_url)
        .unwrap_or_else(|| api::BASE_URL.to_string());
    validate_url(&api_base_url, "API_BASE_URL")?;

    let image_base_url = args
        .image_base_url
        .or(file.image_base_url)
        .unwrap_or_else(|| api::IMAGE_BASE_URL.to_string());
    validate_url(&image_base_url, "IMAGE_BASE_URL")?;

    let page_limit = args
        .page_limit
        .or(file.page_limit)
        .unwrap_or(api::DEFAULT_LIMIT);
    let page_limit = validate_in_range(page_limit, 1, api::MAX_LIMIT, "PAGE_LIMIT")?;

    let request_timeout_ms = args
        .request_timeout_ms
        .or(file.request_timeout_ms)
        .unwrap_or(api::DEFAULT_TIMEOUT_MS);
    let request_timeout_ms =
        validate_in_range(request_timeout_ms, 1000, 60000, "REQUEST_TIMEOUT_MS")?;

    let request_retries = args
        .request_retries
        .or(file.request_retries)
        .unwrap_or(api::DEFAULT_RETRIES);
    let request_retries = validate_in_range(request_retries, 0, 10, "REQUEST_RETRIES")?;

    let probe_timeout_ms = args
        .probe_timeout_ms
        .or(file.probe_timeout_ms)
        .unwrap_or(probe::DEFAULT_TIMEOUT_MS);
    let probe_timeout_ms = validate_in_range(probe_timeout_ms, 100, 10000, "PROBE_TIMEOUT_MS")?;

    let render_fps = args.render_fps.or(file.render_fps).unwrap_or(30);
    let render_fps = validate_in_range(render_fps, 1, 120, "RENDER_FPS")?;

    let headless_pages = validate_in_range(args.pages.unwrap_or(1), 1, 50, "PAGES")?;

    Ok(Config {
        api_base_url,
        image_base_url,
        page_limit,
        request_timeout_ms,
        request_retries,
        probe_timeout_ms,
        assume_online: args.assume_online.or(file.assume_online).unwrap_or(false),
        default_search: args.search.or(file.search).unwrap_or_default(),
        render_fps,
        log_file: args
            .log_file
            .or(file.log_file)
            .unwrap_or_else(|| PathBuf::from("dexterm.log")),
        headless: args.headless,
        headless_pages,
    })
}
