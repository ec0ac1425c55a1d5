//! Submitters: the platform HTTP API and the offline outbox

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{Config, RecordId, RecordPrefix, Workspace};
use crate::wizard::submit::{SubmitError, SubmitRequest, SubmitResponse, Submitter};

/// Endpoints that only make sense against a live server
const ONLINE_ONLY_SUFFIX: &str = "/start-game";

/// Platform API client
pub struct HttpSubmitter {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpSubmitter {
    /// Create a submitter for `base_url` authenticating with a bearer token
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Transport(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create a submitter from the layered configuration
    pub fn from_config(config: &Config, token: impl Into<String>) -> Result<Self, SubmitError> {
        let base_url = config.api_url().ok_or(SubmitError::MissingApiUrl)?;
        Self::new(
            base_url,
            token,
            Duration::from_secs(config.timeout_seconds()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&request.body)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            warn!("API error: {} - {}", status, message);
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(SubmitResponse {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// A payload parked for later delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: RecordId,
    pub endpoint: String,
    pub created: DateTime<Utc>,
    pub author: String,
    pub payload: Value,
}

/// Offline submitter writing payloads into the workspace outbox
pub struct OutboxSubmitter {
    workspace: Workspace,
    author: String,
}

impl OutboxSubmitter {
    pub fn new(workspace: Workspace, author: impl Into<String>) -> Self {
        Self {
            workspace,
            author: author.into(),
        }
    }

    /// Read back every parked entry, oldest first
    pub fn entries(&self) -> Vec<OutboxEntry> {
        let mut entries: Vec<OutboxEntry> = self
            .workspace
            .iter_record_files(RecordPrefix::Eval)
            .filter_map(|path| {
                let text = std::fs::read_to_string(&path).ok()?;
                match serde_yml::from_str(&text) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("skipping unreadable outbox entry {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();
        entries.sort_by(|a, b| a.created.cmp(&b.created));
        entries
    }
}

#[async_trait]
impl Submitter for OutboxSubmitter {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        if request.endpoint.ends_with(ONLINE_ONLY_SUFFIX) {
            return Err(SubmitError::Offline(request.endpoint));
        }

        let entry = OutboxEntry {
            id: RecordId::new(RecordPrefix::Eval),
            endpoint: request.endpoint,
            created: Utc::now(),
            author: self.author.clone(),
            payload: request.body,
        };
        let path = self.workspace.record_path(&entry.id);
        let outbox_err = |message: String| SubmitError::Outbox {
            path: path.clone(),
            message,
        };

        let yaml = serde_yml::to_string(&entry).map_err(|e| outbox_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| outbox_err(e.to_string()))?;
        }
        std::fs::write(&path, yaml).map_err(|e| outbox_err(e.to_string()))?;
        debug!("parked {} at {}", entry.id, path.display());

        Ok(SubmitResponse {
            status: 201,
            body: json!({ "evaluation": { "evaluation_id": entry.id.to_string() } }),
        })
    }

    fn name(&self) -> &'static str {
        "outbox"
    }
}
