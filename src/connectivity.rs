//! Network reachability probes consulted before every remote call.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

/// Synchronous, side-effect free reachability check.
pub trait ConnectivityProbe: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Fixed answer, switchable at runtime. Used with `--assume-online` and in tests.
#[derive(Debug)]
pub struct StaticProbe {
    online: AtomicBool,
}

impl StaticProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}

impl ConnectivityProbe for StaticProbe {
    fn is_available(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

/// Reachability of the API host: a TCP connect with a short timeout.
/// The answer is reused for `cache_for` so a burst of intents probes once.
/// Only the very first call probes inline; after that a stale answer is
/// returned as is while one refresh runs on the blocking pool.
pub struct TcpProbe {
    inner: Arc<TcpTarget>,
}

struct TcpTarget {
    host: String,
    port: u16,
    timeout: Duration,
    cache_for: Duration,
    last: Mutex<Option<(Instant, bool)>>,
    refreshing: AtomicBool,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration, cache_for: Duration) -> Self {
        Self {
            inner: Arc::new(TcpTarget {
                host: host.into(),
                port,
                timeout,
                cache_for,
                last: Mutex::new(None),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    /// Probe the host (and scheme default port) of an API base URL
    pub fn for_base_url(base_url: &str, timeout: Duration, cache_for: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow!("base URL has no host: {base_url}"))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| anyhow!("base URL has no port: {base_url}"))?;
        Ok(Self::new(host, port, timeout, cache_for))
    }

    pub fn host(&self) -> &str {
        &self.inner.host
    }

    pub fn port(&self) -> u16 {
        self.inner.port
    }

    fn refresh_in_background(&self) {
        if self.inner.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        let target = Arc::clone(&self.inner);
        let job = move || {
            target.refresh();
            target.refreshing.store(false, Ordering::Release);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            // No runtime to hand off to: the caller is not an event loop
            Err(_) => job(),
        }
    }
}

impl TcpTarget {
    fn probe(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                log::debug!("[probe] resolve {} failed: {e}", self.host);
                return false;
            }
        };
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(_) => return true,
                Err(e) => log::debug!("[probe] connect {addr} failed: {e}"),
            }
        }
        false
    }

    fn cached(&self) -> Option<(Instant, bool)> {
        match self.last.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Probe now and store the answer. The lock is not held while probing.
    fn refresh(&self) -> bool {
        let online = self.probe();
        if !online {
            log::warn!("[probe] {}:{} unreachable", self.host, self.port);
        }
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some((Instant::now(), online));
        online
    }
}

impl ConnectivityProbe for TcpProbe {
    fn is_available(&self) -> bool {
        match self.inner.cached() {
            Some((at, online)) if at.elapsed() < self.inner.cache_for => online,
            Some((_, online)) => {
                self.refresh_in_background();
                online
            }
            None => self.inner.refresh(),
        }
    }
}
