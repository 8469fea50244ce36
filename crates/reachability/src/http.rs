//! HTTP-based probe for hosts without a native reachability API.

use crate::probe::{ProbeError, ReachabilityProbe};
use crate::state::ReachabilityFlags;
use async_trait::async_trait;
use std::time::Duration;

/// Default timeout for a single probe request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes a host with an HTTPS `HEAD` request.
///
/// Any HTTP response, whatever its status, proves a path exists. Connect and
/// timeout failures mean unreachable. Anything else (bad host name, TLS
/// setup) is a query failure and maps to `Unknown`. Interface type is not
/// observable this way, so reachable hosts always report as non-cellular.
pub struct HttpProbe {
    client: reqwest::Client,
    internet_host: String,
}

impl HttpProbe {
    /// `internet_host` is probed when asked about general internet access.
    pub fn new(internet_host: impl Into<String>) -> Result<Self, ProbeError> {
        Self::with_timeout(internet_host, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(
        internet_host: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Query(e.to_string()))?;
        Ok(Self {
            client,
            internet_host: internet_host.into(),
        })
    }

    fn url_for(&self, host: Option<&str>) -> String {
        let host = host.unwrap_or(&self.internet_host);
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}/", host)
        }
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn query(&self, host: Option<&str>) -> Result<ReachabilityFlags, ProbeError> {
        let url = self.url_for(host);
        match self.client.head(&url).send().await {
            Ok(_) => Ok(ReachabilityFlags::wifi()),
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::trace!(url = %url, error = %e, "probe failed to connect");
                Ok(ReachabilityFlags::unreachable())
            }
            Err(e) => Err(ProbeError::Query(e.to_string())),
        }
    }
}
