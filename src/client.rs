//! Remote catalog access: the `CatalogClient` seam and its HTTP implementation.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::Config;
use crate::constants::api;
use crate::error::TransportFault;
use crate::net::send_with_backoff;
use crate::types::{CatalogDetail, CatalogItem, DetailResponse, ListResponse, NamedResource, PageRequest};

/// The two remote calls the browser needs.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of list items, in server order
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<CatalogItem>, TransportFault>;

    /// Fetch the detail record of one item
    async fn fetch_detail(&self, id: &str) -> Result<CatalogDetail, TransportFault>;
}

/// `CatalogClient` over the public REST API
pub struct HttpCatalogClient {
    base_url: url::Url,
    http: reqwest::Client,
    retries: u32,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration, retries: u32) -> anyhow::Result<Self> {
        let mut base = url::Url::parse(base_url)?;
        // Url::join drops the last segment unless the base ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .user_agent(api::USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base,
            http,
            retries,
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Self::new(
            &cfg.api_base_url,
            Duration::from_millis(cfg.request_timeout_ms),
            cfg.request_retries,
        )
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// `<base>pokemon?limit=..&offset=..`
    pub fn page_url(&self, request: PageRequest) -> Result<url::Url, TransportFault> {
        let mut url = self
            .base_url
            .join(api::RESOURCE)
            .map_err(|e| TransportFault::Other(format!("invalid list URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("limit", &request.limit.to_string())
            .append_pair("offset", &request.offset.to_string());
        Ok(url)
    }

    /// `<base>pokemon/<id>`
    pub fn detail_url(&self, id: &str) -> Result<url::Url, TransportFault> {
        let path = format!("{}/{}", api::RESOURCE, urlencoding::encode(id));
        self.base_url
            .join(&path)
            .map_err(|e| TransportFault::Other(format!("invalid detail URL: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: url::Url,
        label: &str,
    ) -> Result<T, TransportFault> {
        log::debug!("[client] GET {url}");
        let response = send_with_backoff(self.http.get(url), label, self.retries).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportFault::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransportFault::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<CatalogItem>, TransportFault> {
        let url = self.page_url(request)?;
        let list: ListResponse = self.get_json(url, "list").await?;

        // An entry without an id fails the page; dropping it would shift every later offset
        let items = list
            .results
            .into_iter()
            .map(|r: NamedResource| {
                let url = r.url.clone();
                r.into_item().ok_or_else(|| {
                    TransportFault::Decode(format!("list entry without id: {url:?}"))
                })
            })
            .collect::<Result<Vec<CatalogItem>, TransportFault>>()?;

        log::info!(
            "[client] page {} -> {} items (of {} total)",
            request,
            items.len(),
            list.count.map(|c| c.to_string()).unwrap_or_else(|| "?".into())
        );
        Ok(items)
    }

    async fn fetch_detail(&self, id: &str) -> Result<CatalogDetail, TransportFault> {
        let url = self.detail_url(id)?;
        let detail: DetailResponse = self.get_json(url, "detail").await?;
        log::info!("[client] detail {} ({})", detail.id, detail.name);
        Ok(detail.into())
    }
}
