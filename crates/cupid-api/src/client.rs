use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use cupid_types::api::{CreateMessageRequest, LoginRequest, LoginResponse, MessagePage};

use crate::error::{ApiError, RawFailure, classify};

pub const DEFAULT_API_URL: &str = "https://love-backend-two.vercel.app";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// The three remote operations the client consumes. Controllers are generic
/// over this so tests can drive them with in-process fakes.
#[async_trait]
pub trait MessagesApi: Send + Sync {
    /// `POST /api/login`.
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// `GET /api/messages?page=<page>` with a bearer token.
    async fn list_messages(&self, page: u32, token: &str) -> Result<MessagePage, ApiError>;

    /// `POST /api/messages`. Resolves to the HTTP status of an accepted request.
    async fn create_message(&self, req: &CreateMessageRequest) -> Result<u16, ApiError>;
}

/// HTTP implementation of [`MessagesApi`] on `reqwest`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

#[async_trait]
impl MessagesApi for ApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(self.endpoint("login"))
            .json(req)
            .send()
            .await
            .map_err(no_response)?;
        decode(response).await
    }

    async fn list_messages(&self, page: u32, token: &str) -> Result<MessagePage, ApiError> {
        let response = self
            .http
            .get(self.endpoint("messages"))
            .query(&[("page", page)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(no_response)?;
        let status = response.status().as_u16();
        let page: MessagePage = decode(response).await?;

        if let Some(id) = page.duplicate_id() {
            warn!("Page {} lists record {} more than once", page.current_page, id);
            return Err(ApiError::invalid_body(status, format!("duplicate record id {}", id)));
        }
        debug!(
            "Fetched page {}/{} ({} records)",
            page.current_page,
            page.total_pages,
            page.messages.len()
        );
        Ok(page)
    }

    async fn create_message(&self, req: &CreateMessageRequest) -> Result<u16, ApiError> {
        let response = self
            .http
            .post(self.endpoint("messages"))
            .json(req)
            .send()
            .await
            .map_err(no_response)?;
        let status = response.status();
        if !status.is_success() {
            return Err(failure(response).await);
        }
        Ok(status.as_u16())
    }
}

fn no_response(e: reqwest::Error) -> ApiError {
    classify(RawFailure::NoResponse { detail: e.to_string() })
}

async fn failure(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify(RawFailure::Response {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(failure(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::invalid_body(status.as_u16(), e))
}
