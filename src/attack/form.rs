//! Login-form submission seam.
//!
//! The web engine talks to targets through the `FormSubmitter` trait so
//! tests can script verdicts without a live endpoint. The reqwest-backed
//! implementation keeps one client per proxy endpoint, with cookies on,
//! so sessions survive rotation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use reqwest::{Client, Proxy};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error("failed to build http client: {0}")]
    ClientBuild(String),
    #[error("request failed: {0}")]
    Transport(String),
}

/// One outbound submission, fully resolved by the engine.
#[derive(Debug, Clone)]
pub struct FormRequest {
    pub url: Url,
    pub fields: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

/// What came back, reduced to the parts the verdict logic needs.
#[derive(Debug, Clone)]
pub struct FormReply {
    pub status: u16,
    pub body: String,
}

impl FormReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, request: &FormRequest) -> Result<FormReply, SubmitError>;
}

/// Reqwest-backed submitter with a client cached per proxy endpoint.
pub struct HttpFormSubmitter {
    connect_timeout: Duration,
    clients: Mutex<HashMap<Option<String>, Client>>,
}

impl HttpFormSubmitter {
    pub fn new() -> Self {
        Self::with_connect_timeout(Duration::from_secs(5))
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client(&self, proxy: Option<&str>) -> Result<Client, SubmitError> {
        let mut guard = self.clients.lock().await;
        let key = proxy.map(|endpoint| endpoint.to_string());
        if let Some(client) = guard.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .cookie_store(true)
            .connect_timeout(self.connect_timeout);

        if let Some(endpoint) = proxy {
            let proxy = Proxy::all(endpoint)
                .map_err(|err| SubmitError::ClientBuild(err.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|err| SubmitError::ClientBuild(err.to_string()))?;
        guard.insert(key, client.clone());
        Ok(client)
    }
}

impl Default for HttpFormSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormSubmitter for HttpFormSubmitter {
    async fn submit(&self, request: &FormRequest) -> Result<FormReply, SubmitError> {
        let client = self.client(request.proxy.as_deref()).await?;
        let fields: HashMap<&str, &str> = request
            .fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        let response = client
            .post(request.url.as_str())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .form(&fields)
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        Ok(FormReply::new(status, body))
    }
}
