//! Outbound HTTP execution for synthesized requests.

use reqwest::Method;
use serde_json::Value;
use smithy_mcp_common::{Result, RuntimeConfig, SmithyMcpError};

use crate::request::SynthesizedRequest;
use crate::sigv4::SigV4Signer;

/// Thin wrapper over a shared `reqwest::Client` carrying the configured
/// timeout and bearer token.
pub struct ApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SmithyMcpError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
        })
    }

    /// Send a synthesized request. With a signer the request is SigV4
    /// signed; otherwise the configured API key rides along as a bearer
    /// token. Non-2xx responses surface as `ApiRequest` errors carrying the
    /// status and body; JSON responses deserialize, anything else comes back
    /// as a string value.
    pub async fn execute(
        &self,
        request: &SynthesizedRequest,
        signer: Option<&SigV4Signer>,
    ) -> Result<Value> {
        let response = if let Some(signer) = signer {
            let signed = signer.sign_request(request)?;
            let outbound = reqwest::Request::try_from(signed)
                .map_err(|e| SmithyMcpError::Transport(e.to_string()))?;
            self.http
                .execute(outbound)
                .await
                .map_err(|e| SmithyMcpError::Transport(e.to_string()))?
        } else {
            let method = Method::from_bytes(request.method.as_bytes())
                .map_err(|e| SmithyMcpError::Transport(format!("{}: {e}", request.method)))?;
            let mut builder = self
                .http
                .request(method, request.url.clone())
                .header("Content-Type", "application/json")
                .header("Accept", "application/json");
            for (key, value) in &request.headers {
                builder = builder.header(key, value);
            }
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }
            builder
                .send()
                .await
                .map_err(|e| SmithyMcpError::Transport(e.to_string()))?
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmithyMcpError::ApiRequest {
                status: status.as_u16(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if is_json {
            response
                .json()
                .await
                .map_err(|e| SmithyMcpError::Transport(e.to_string()))
        } else {
            let text = response
                .text()
                .await
                .map_err(|e| SmithyMcpError::Transport(e.to_string()))?;
            Ok(Value::String(text))
        }
    }
}
