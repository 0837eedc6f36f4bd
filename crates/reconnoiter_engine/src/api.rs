use std::time::Duration;

use reconnoiter_core::JobSession;
use reconnoiter_logging::{recon_debug, recon_info};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::wire::{CreateComparisonRequest, CreateComparisonResponse, StatusResponse};
use crate::{ApiError, CreatedJob};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; RepoReconnoiter/1.0)";
const USER_TOKEN_HEADER: &str = "X-User-Token";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Root of the JSON API, e.g. `http://localhost:3001/api`.
    pub base_url: Url,
    /// Sent as `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    /// Sent as `X-User-Token`; also the credential for the realtime channel.
    pub user_token: Option<String>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            user_token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The two backend calls the tracker needs.
#[async_trait::async_trait]
pub trait ComparisonApi: Send + Sync {
    async fn create_comparison(&self, query: &str) -> Result<CreatedJob, ApiError>;

    async fn comparison_status(&self, session: &JobSession) -> Result<StatusResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestComparisonApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestComparisonApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::InvalidUrl(format!("{} cannot be a base", self.settings.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn status_url(&self, session: &JobSession) -> Result<Url, ApiError> {
        match session.poll_endpoint.as_deref() {
            Some(hint) => resolve_hint(&self.settings.base_url, hint),
            None => self.endpoint(&["comparisons", "status", session.session_id.as_str()]),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(key) = self.settings.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        if let Some(token) = self
            .settings
            .user_token
            .as_deref()
            .filter(|token| !token.is_empty())
        {
            request = request.header(USER_TOKEN_HEADER, token);
        }
        request
    }
}

#[async_trait::async_trait]
impl ComparisonApi for ReqwestComparisonApi {
    async fn create_comparison(&self, query: &str) -> Result<CreatedJob, ApiError> {
        let url = self.endpoint(&["comparisons"])?;
        recon_debug!("POST {url}");
        let response = self
            .authorize(self.client.post(url))
            .json(&CreateComparisonRequest { query })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let created: CreateComparisonResponse = read_json(response).await?;
        let job = CreatedJob::from(created);
        recon_info!(session = job.session_id; "comparison created");
        Ok(job)
    }

    async fn comparison_status(&self, session: &JobSession) -> Result<StatusResponse, ApiError> {
        let url = self.status_url(session)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

/// Resolves a server-provided endpoint against a configured one. Absolute
/// hints replace the base, relative ones resolve like a link.
pub(crate) fn resolve_hint(base: &Url, hint: &str) -> Result<Url, ApiError> {
    base.join(hint)
        .map_err(|err| ApiError::InvalidUrl(format!("{hint}: {err}")))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = backend_message(&body).unwrap_or_else(|| {
            format!(
                "API Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        });
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Pulls `error.message` or a bare `error` string out of an error body.
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .filter(|message| !message.trim().is_empty())
        .map(ToOwned::to_owned)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Network(err.to_string())
}
