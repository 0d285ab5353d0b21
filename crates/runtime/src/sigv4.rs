//! AWS SigV4 request signing with ambient credentials.

use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use smithy_mcp_common::{Result, SmithyMcpError};

use crate::request::SynthesizedRequest;

/// Signs outbound requests for one service/region pair. Credentials are
/// resolved once from the default provider chain at construction.
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Resolve ambient credentials (environment, shared config, instance
    /// metadata) and build a signer.
    pub async fn load(service: &str, region: &str) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let provider = config.credentials_provider().ok_or_else(|| {
            SmithyMcpError::Configuration(
                "SigV4 signing requested but no AWS credentials provider is available".to_string(),
            )
        })?;
        let credentials = provider.provide_credentials().await.map_err(|e| {
            SmithyMcpError::Configuration(format!("Failed to resolve AWS credentials: {e}"))
        })?;
        Ok(Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        })
    }

    #[cfg(test)]
    fn for_testing(service: &str, region: &str) -> Self {
        Self {
            credentials: Credentials::new("AKIDEXAMPLE", "secret", None, None, "static"),
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Sign a synthesized request, returning the equivalent `http` request
    /// with the signature headers applied.
    pub fn sign_request(&self, request: &SynthesizedRequest) -> Result<http::Request<String>> {
        let body = request.body.clone().unwrap_or_default();

        let mut headers: Vec<(String, String)> = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("accept".to_string(), "application/json".to_string()),
        ];
        if let Some(host) = request.url.host_str() {
            headers.push(("host".to_string(), host.to_string()));
        }
        headers.extend(request.headers.iter().cloned());

        let signable = SignableRequest::new(
            &request.method,
            request.url.as_str(),
            headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            SignableBody::Bytes(body.as_bytes()),
        )
        .map_err(|e| SmithyMcpError::Configuration(format!("Unsignable request: {e}")))?;

        let identity = self.credentials.clone().into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(&self.service)
            .time(std::time::SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| SmithyMcpError::Configuration(format!("SigV4 parameters: {e}")))?;

        let (instructions, _signature) = sign(signable, &params.into())
            .map_err(|e| SmithyMcpError::Configuration(format!("SigV4 signing failed: {e}")))?
            .into_parts();

        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (k, v) in &headers {
            builder = builder.header(k, v);
        }
        let mut signed = builder
            .body(body)
            .map_err(|e| SmithyMcpError::Configuration(format!("Invalid request: {e}")))?;
        instructions.apply_to_request_http1x(&mut signed);
        Ok(signed)
    }
}
