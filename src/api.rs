//! HTTP access to the ISO builder and the rig dashboard.
//!
//! [`MinerApi`] is the port the controllers poll through; [`HttpMinerApi`]
//! is the `reqwest` implementation used by the binary.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use thiserror::Error;
use tracing::debug;

use crate::types::{BuildAccepted, BuildConfig, BuildStatus, DashboardStatus};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// The builder answered but refused the build.
    #[error("{0}")]
    Rejected(String),
}

/// Link served by the builder for a finished image.
pub fn download_path(filename: &str) -> String {
    format!("/api/download/{filename}")
}

pub trait MinerApi: Send + Sync {
    /// `POST /api/build-iso`, returning the assigned build id.
    fn submit_build(
        &self,
        config: &BuildConfig,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// `GET /api/build-status/{build_id}`.
    fn build_status(
        &self,
        build_id: &str,
    ) -> impl Future<Output = Result<BuildStatus, ApiError>> + Send;

    /// `GET /api/status`.
    fn dashboard_status(&self) -> impl Future<Output = Result<DashboardStatus, ApiError>> + Send;
}

impl<T: MinerApi> MinerApi for Arc<T> {
    fn submit_build(
        &self,
        config: &BuildConfig,
    ) -> impl Future<Output = Result<String, ApiError>> + Send {
        (**self).submit_build(config)
    }

    fn build_status(
        &self,
        build_id: &str,
    ) -> impl Future<Output = Result<BuildStatus, ApiError>> + Send {
        (**self).build_status(build_id)
    }

    fn dashboard_status(&self) -> impl Future<Output = Result<DashboardStatus, ApiError>> + Send {
        (**self).dashboard_status()
    }
}

#[derive(Debug, Clone)]
pub struct HttpMinerApi {
    client: Client,
    base_url: String,
}

impl HttpMinerApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Reduces the submit reply to a build id, or the reason there is none.
fn accepted_build_id(accepted: BuildAccepted) -> Result<String, ApiError> {
    if !accepted.success {
        return Err(ApiError::Rejected(
            accepted.error.unwrap_or_else(|| "Build failed".to_string()),
        ));
    }
    accepted
        .build_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Rejected("server did not return a build id".to_string()))
}

impl MinerApi for HttpMinerApi {
    fn submit_build(
        &self,
        config: &BuildConfig,
    ) -> impl Future<Output = Result<String, ApiError>> + Send {
        let request = self.client.post(self.url("/api/build-iso")).json(config);
        async move {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ApiError::Status {
                    code: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("").to_string(),
                });
            }
            let accepted: BuildAccepted = Self::decode(resp).await?;
            if let Some(message) = &accepted.message {
                debug!(message = %message, "build accepted");
            }
            accepted_build_id(accepted)
        }
    }

    fn build_status(
        &self,
        build_id: &str,
    ) -> impl Future<Output = Result<BuildStatus, ApiError>> + Send {
        let request = self.client.get(self.url(&format!("/api/build-status/{build_id}")));
        async move {
            // error statuses still carry a status body ("not_found", "error")
            let resp = request.send().await?;
            Self::decode(resp).await
        }
    }

    fn dashboard_status(&self) -> impl Future<Output = Result<DashboardStatus, ApiError>> + Send {
        let request = self.client.get(self.url("/api/status"));
        async move {
            let resp = request.send().await?;
            Self::decode(resp).await
        }
    }
}
