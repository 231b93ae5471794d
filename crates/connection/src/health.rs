//! One-shot HTTP reachability probe of the backend.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use companion_protocol::constants::HEALTH_TIMEOUT;

use crate::url::health_url;

/// Outcome of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Reachable,
    Unreachable,
}

impl Reachability {
    pub fn is_reachable(self) -> bool {
        self == Self::Reachable
    }
}

/// `GET <host>/health` with the default timeout.
pub async fn probe(host_url: &str) -> Reachability {
    probe_with_timeout(host_url, HEALTH_TIMEOUT).await
}

/// `GET <host>/health`. Only a 2xx answer within `timeout` counts as
/// reachable; any transport error, timeout or other status does not.
pub async fn probe_with_timeout(host_url: &str, timeout: Duration) -> Reachability {
    let url = health_url(host_url);
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(c) => c,
        Err(e) => {
            debug!("failed to build HTTP client: {e}");
            return Reachability::Unreachable;
        }
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!(%url, "backend reachable");
            Reachability::Reachable
        }
        Ok(resp) => {
            debug!(%url, status = %resp.status(), "health check failed");
            Reachability::Unreachable
        }
        Err(e) => {
            debug!(%url, "health check error: {e}");
            Reachability::Unreachable
        }
    }
}
