use serde::Deserialize;
use tracing::debug;

use super::types::ServiceError;

/// Read-only client for the parent dashboard endpoints
pub struct ParentClient {
    base_url: String,
    client: reqwest::Client,
}

/// One row in the session list
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub id: i64,
    pub timestamp: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawingSummary {
    pub id: i64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetail {
    pub prompt: String,
    pub timestamp: String,
    #[serde(default)]
    pub drawings: Vec<DrawingSummary>,
}

/// Auto-generated recap of one session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecap {
    pub prompt: String,
    pub num_drawings: i64,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub top_tags: Vec<String>,
    #[serde(default)]
    pub highlights: String,
}

impl ParentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ServiceError> {
        debug!("GET {}{}", self.base_url, path);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ServiceError> {
        self.get_json("/sessions").await
    }

    pub async fn session(&self, id: i64) -> Result<SessionDetail, ServiceError> {
        self.get_json(&format!("/session/{}", id)).await
    }

    pub async fn recap(&self, id: i64) -> Result<SessionRecap, ServiceError> {
        self.get_json(&format!("/recap/{}", id)).await
    }

    /// Raw image bytes for one drawing
    pub async fn image(&self, drawing_id: i64) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/image/{}", self.base_url, drawing_id))
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
