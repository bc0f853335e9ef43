//! Execution context shared by every flow invocation.
//!
//! [`ExecCtx`] carries the HTTP client, the model backend, the service base
//! URL and an optional per-invocation deadline. It is built once at startup
//! and never mutated afterwards, so one context serves concurrent calls.

use crate::client::{Backend, HttpBackend};
use crate::error::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared execution context for flow invocations.
///
/// # Example
///
/// ```
/// use flowai_studio::ExecCtx;
/// use std::time::Duration;
///
/// let ctx = ExecCtx::builder("http://localhost:3400/")
///     .deadline(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// assert_eq!(ctx.base_url, "http://localhost:3400");
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone, uses `Arc` internally).
    pub client: Client,
    /// Base URL of the generation service, without trailing slash.
    pub base_url: String,
    /// Model backend. Default: [`HttpBackend`] without credentials.
    pub backend: Arc<dyn Backend>,
    /// Upper bound on one whole flow invocation, batch fan-out included.
    pub deadline: Option<Duration>,
}

impl ExecCtx {
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            timeout: None,
            deadline: None,
        }
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    timeout: Option<Duration>,
    deadline: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Set the HTTP client. If not set, one is built with [`timeout`](Self::timeout).
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use the gateway backend with bearer authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(HttpBackend::new().with_api_key(key)));
        self
    }

    /// Use the Gemini REST backend.
    #[cfg(feature = "gemini")]
    pub fn gemini(mut self, api_key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(crate::client::GeminiBackend::new(api_key)));
        self
    }

    /// Per-request HTTP timeout. Default: 60 seconds.
    ///
    /// Ignored when a custom client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Deadline for a whole flow invocation. Default: none.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Result<ExecCtx> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
                .build()?,
        };
        Ok(ExecCtx {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(HttpBackend::new())),
            deadline: self.deadline,
        })
    }
}

/// Strip trailing slashes and a trailing `/generate` so backends can append
/// their own paths without doubling them.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/generate")
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockBackend;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:3400/"), "http://localhost:3400");
        assert_eq!(normalize_base_url("http://localhost:3400/generate"), "http://localhost:3400");
        assert_eq!(normalize_base_url(" https://ai.example.com "), "https://ai.example.com");
    }

    #[test]
    fn test_defaults() {
        let ctx = ExecCtx::builder("http://localhost:3400").build().unwrap();
        assert_eq!(ctx.backend.name(), "http");
        assert!(ctx.deadline.is_none());
    }

    #[test]
    fn test_custom_backend_and_deadline() {
        let ctx = ExecCtx::builder("http://unused")
            .backend(Arc::new(MockBackend::default()))
            .deadline(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(ctx.backend.name(), "mock");
        assert_eq!(ctx.deadline, Some(Duration::from_millis(250)));
        let dbg = format!("{:?}", ctx);
        assert!(dbg.contains("mock"));
    }
}
