//! HTTP render adapter.
//!
//! Posts the render job as JSON to `{endpoint}/render` and expects
//! `{"video_url": "..."}` back.

use std::sync::Arc;
use std::time::Duration;

use adforge_core::{AppConfig, BackendDescriptor};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::backend::{BackendRegistry, RenderBackend, RenderJob, RenderOutput};
use crate::error::RenderError;
use crate::retry::retry_with_backoff;

/// Client settings shared by every HTTP render backend.
#[derive(Clone)]
pub struct HttpRenderConfig {
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub user_agent: String,
    pub api_key: Option<String>,
}

impl HttpRenderConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.render_request_timeout_secs,
            max_retries: config.render_max_retries,
            backoff_base_ms: config.render_retry_backoff_base_ms,
            user_agent: config.user_agent.clone(),
            api_key: config.render_api_key.clone(),
        }
    }
}

impl std::fmt::Debug for HttpRenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRenderConfig")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("user_agent", &self.user_agent)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

pub struct HttpRenderBackend {
    client: Client,
    backend_id: String,
    render_url: Url,
    api_key: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpRenderBackend {
    /// # Errors
    ///
    /// Returns [`RenderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`RenderError::InvalidEndpoint`] if `endpoint` is not a
    /// valid base URL.
    pub fn new(
        backend_id: &str,
        endpoint: &str,
        config: &HttpRenderConfig,
    ) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let normalised = format!("{}/", endpoint.trim_end_matches('/'));
        let render_url = Url::parse(&normalised)
            .and_then(|base| base.join("render"))
            .map_err(|e| RenderError::InvalidEndpoint {
                backend: backend_id.to_owned(),
                reason: format!("'{endpoint}': {e}"),
            })?;

        Ok(Self {
            client,
            backend_id: backend_id.to_owned(),
            render_url,
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    #[must_use]
    pub fn render_url(&self) -> &Url {
        &self.render_url
    }

    async fn post_once(&self, job: &RenderJob) -> Result<RenderOutput, RenderError> {
        let mut request = self.client.post(self.render_url.clone()).json(job);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RenderError::RateLimited {
                backend: self.backend_id.clone(),
            });
        }
        if status.is_server_error() {
            return Err(RenderError::ServerError {
                backend: self.backend_id.clone(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(RenderError::UnexpectedStatus {
                backend: self.backend_id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let output: RenderOutput =
            serde_json::from_slice(&body).map_err(|e| RenderError::Deserialize {
                context: format!(
                    "render response from {} for variation {}",
                    self.backend_id, job.variation_index
                ),
                source: e,
            })?;
        if output.video_url.trim().is_empty() {
            return Err(RenderError::Rejected {
                backend: self.backend_id.clone(),
                reason: "empty video_url".to_owned(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl RenderBackend for HttpRenderBackend {
    async fn render(&self, job: &RenderJob) -> Result<RenderOutput, RenderError> {
        tracing::debug!(
            backend = %self.backend_id,
            variation = job.variation_index,
            url = %self.render_url,
            "posting render job"
        );
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.post_once(job)).await
    }
}

/// Build a registry of HTTP adapters for every descriptor with an endpoint.
///
/// Descriptors without an endpoint are skipped with a warning.
///
/// # Errors
///
/// Returns the first [`RenderError`] raised while building an adapter.
pub fn build_http_registry(
    descriptors: &[BackendDescriptor],
    config: &HttpRenderConfig,
) -> Result<BackendRegistry, RenderError> {
    let mut registry = BackendRegistry::new();
    for descriptor in descriptors {
        let Some(endpoint) = descriptor.endpoint.as_deref() else {
            tracing::warn!(backend = %descriptor.id, "skipping backend without endpoint");
            continue;
        };
        let adapter = HttpRenderBackend::new(&descriptor.id, endpoint, config)?;
        registry.register(descriptor.clone(), Arc::new(adapter));
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HttpRenderConfig {
        HttpRenderConfig {
            request_timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 0,
            user_agent: "adforge-test".to_owned(),
            api_key: Some("secret".to_owned()),
        }
    }

    #[test]
    fn render_url_appends_path_once() {
        for endpoint in ["https://render.example.com", "https://render.example.com/"] {
            let backend = HttpRenderBackend::new("cloud-a", endpoint, &config()).unwrap();
            assert_eq!(
                backend.render_url().as_str(),
                "https://render.example.com/render"
            );
        }
    }

    #[test]
    fn render_url_keeps_base_path() {
        let backend =
            HttpRenderBackend::new("cloud-a", "https://example.com/api/v1", &config()).unwrap();
        assert_eq!(backend.render_url().as_str(), "https://example.com/api/v1/render");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            HttpRenderBackend::new("cloud-a", "not a url", &config()),
            Err(RenderError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
