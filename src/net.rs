//! Small helpers for rate-limit friendly networking.

use rand::{thread_rng, Rng};
use std::time::Duration;

/// Send a request, retrying transient failures (429, 5xx, transport errors)
/// with jittered exponential backoff. Non-transient responses are returned
/// as-is for the caller to interpret.
pub async fn send_with_backoff(
    rb: reqwest::RequestBuilder,
    label: &str,
    max_retries: u32,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut attempt = 0u32;
    loop {
        // Bodies we send are always cloneable; a streaming body gets one shot.
        let Some(req) = rb.try_clone() else {
            return rb.send().await;
        };
        match req.send().await {
            Ok(r) => {
                if is_transient_status(r.status().as_u16()) && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "[net] {} {} retry={} backoff={}ms",
                        r.status().as_u16(),
                        label,
                        attempt,
                        back_ms
                    );
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Ok(r);
            }
            Err(e) => {
                // Decode/builder errors will not improve on retry.
                if (e.is_timeout() || e.is_connect() || e.is_request()) && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "[net] err {} retry={} backoff={}ms : {}",
                        label,
                        attempt,
                        back_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Err(e);
            }
        }
    }
}

pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn backoff_delay_ms(attempt: u32) -> u64 {
    let base = 300u64.saturating_mul(1u64 << (attempt.clamp(1, 5) - 1)); // 300,600,1200,2400,4800
    let jitter: u64 = thread_rng().gen_range(0..=250);
    base + jitter
}
