use crate::config::Config;
use crate::error::ServiceError;
use crate::events::{AnswerOutcome, AnswerResponse, QueryRequest, RetrieveResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The external question-answering backend, seen only through its HTTP contract
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Ask a question. Never fails: every transport problem becomes
    /// [`AnswerOutcome::Failure`].
    async fn answer(&self, request: &QueryRequest) -> AnswerOutcome;
}

/// Access to the passages the service grounds its answers on
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    async fn retrieve(&self, request: &QueryRequest) -> Result<RetrieveResponse, ServiceError>;
}

/// reqwest-backed client for the answer service
#[derive(Clone)]
pub struct HttpAnswerService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAnswerService {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /answer`, keeping the failure detail
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_answer(&self, request: &QueryRequest) -> Result<AnswerResponse, ServiceError> {
        let body = self.post_json("answer", request).await?;
        Ok(AnswerResponse::from_value(body))
    }

    async fn post_json(&self, route: &str, request: &QueryRequest) -> Result<serde_json::Value, ServiceError> {
        let url = format!("{}/{}", self.base_url, route);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let value = serde_json::from_slice(&bytes)?;
        debug!(%url, "Received response from answer service");
        Ok(value)
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn answer(&self, request: &QueryRequest) -> AnswerOutcome {
        match self.fetch_answer(request).await {
            Ok(response) => response.into_outcome(),
            Err(e) => {
                warn!(error = %e, "Answer request failed");
                AnswerOutcome::Failure
            }
        }
    }
}

#[async_trait]
impl PassageRetriever for HttpAnswerService {
    /// `POST /retrieve`: the passages the service would answer from
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn retrieve(&self, request: &QueryRequest) -> Result<RetrieveResponse, ServiceError> {
        let body = self.post_json("retrieve", request).await?;
        Ok(serde_json::from_value(body)?)
    }
}
