//! Backend seam - request/response calls against the dashboard server
//!
//! The backend owns all durable state. Every call here either returns the
//! server's full snapshot or reports success via HTTP status.

use crate::error::BackendError;
use async_trait::async_trait;
use pocp_types::{
    endpoints, AddressesResponse, LeaderboardResponse, RegisterRequest, RewardsResponse,
    RosterResponse, StatusResponse, SubmitTimeRequest, ValidatorResponse,
};
use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Calls the dashboard needs from the authoritative server
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_roster(&self) -> Result<RosterResponse>;

    async fn fetch_leaderboard(&self) -> Result<LeaderboardResponse>;

    async fn fetch_rewards(&self) -> Result<RewardsResponse>;

    /// Addresses offered by the registration picker
    async fn fetch_addresses(&self) -> Result<AddressesResponse>;

    async fn register(&self, request: &RegisterRequest) -> Result<()>;

    async fn submit_time(&self, request: &SubmitTimeRequest) -> Result<()>;

    async fn select_validator(&self) -> Result<ValidatorResponse>;

    async fn reset_round(&self) -> Result<()>;
}

/// Longest body excerpt carried in an error
const BODY_SNIPPET_LEN: usize = 256;

/// JSON-over-HTTP backend client
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for the backend at `base_url`.
    ///
    /// A path in `base_url` is kept as a prefix for every endpoint.
    pub fn try_new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        // joining replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T> {
        tracing::debug!("GET {}", path);
        let response = self.http.get(self.url(path)?).send().await?;
        let text = Self::success_body(response).await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode {
            endpoint: path,
            reason: e.to_string(),
        })
    }

    async fn post<Q: Serialize + Sync>(&self, path: &'static str, body: Option<&Q>) -> Result<()> {
        tracing::debug!("POST {}", path);
        let mut request = self.http.post(self.url(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::success_body(response).await?;
        Ok(())
    }

    /// Read the body, turning a non-success status into an error
    async fn success_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        let message = serde_json::from_str::<StatusResponse>(&text)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| text.chars().take(BODY_SNIPPET_LEN).collect());

        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_roster(&self) -> Result<RosterResponse> {
        self.get_json(endpoints::MINERS).await
    }

    async fn fetch_leaderboard(&self) -> Result<LeaderboardResponse> {
        self.get_json(endpoints::LEADERBOARD).await
    }

    async fn fetch_rewards(&self) -> Result<RewardsResponse> {
        self.get_json(endpoints::REWARDS).await
    }

    async fn fetch_addresses(&self) -> Result<AddressesResponse> {
        self.get_json(endpoints::ADDRESSES).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.post(endpoints::REGISTER, Some(request)).await
    }

    async fn submit_time(&self, request: &SubmitTimeRequest) -> Result<()> {
        self.post(endpoints::SUBMIT_TIME, Some(request)).await
    }

    async fn select_validator(&self) -> Result<ValidatorResponse> {
        self.get_json(endpoints::SELECT_VALIDATOR).await
    }

    async fn reset_round(&self) -> Result<()> {
        self.post::<()>(endpoints::RESET_ROUND, None).await
    }
}
