//! Runtime configuration, resolved once at startup from explicit values and
//! environment fallbacks. Nothing else in the workspace reads the
//! environment.

use std::time::Duration;

use crate::model::ParsedService;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:8080";

/// Settings shared by the dynamic server and the waiter engine.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Explicit base URL override. When unset the URL is derived per service
    /// by [`RuntimeConfig::base_url_for`].
    pub base_url: Option<String>,
    /// Bearer token sent as `Authorization: Bearer <key>` when SigV4 is not
    /// in play.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Region used for SigV4 signing and endpoint derivation.
    pub region: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Resolve configuration from explicit values, falling back to
    /// `API_BASE_URL`, `API_KEY`, `API_TIMEOUT` (milliseconds) and
    /// `AWS_REGION`.
    pub fn resolve(
        base_url: Option<String>,
        api_key: Option<String>,
        region: Option<String>,
        timeout_ms: Option<u64>,
    ) -> Self {
        let base_url = base_url.or_else(|| std::env::var("API_BASE_URL").ok());
        let api_key = api_key.or_else(|| std::env::var("API_KEY").ok());
        let region = region
            .or_else(|| std::env::var("AWS_REGION").ok())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let timeout_ms = timeout_ms
            .or_else(|| {
                std::env::var("API_TIMEOUT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self {
            base_url,
            api_key,
            timeout: Duration::from_millis(timeout_ms),
            region,
        }
    }

    /// Base URL precedence: explicit configuration, then the AWS endpoint
    /// derived from the service's endpoint prefix (with any host prefix
    /// prepended), then localhost.
    pub fn base_url_for(&self, service: &ParsedService) -> String {
        if let Some(url) = &self.base_url {
            return url.clone();
        }
        if let Some(prefix) = &service.endpoint_prefix {
            let host_prefix = service.host_prefix.as_deref().unwrap_or("");
            return format!(
                "https://{host_prefix}{prefix}.{}.amazonaws.com",
                self.region
            );
        }
        DEFAULT_LOCAL_BASE_URL.to_string()
    }
}
