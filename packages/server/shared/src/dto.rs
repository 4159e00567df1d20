use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inbound request accepted by both `/generate` and `/deploy`.
/// Immutable once accepted; `project_name` doubles as the remote
/// repository name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub project_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    /// Opaque key/value passthrough forwarded to the webhook payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Overrides the server-configured webhook URL for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
    /// Overrides the server-configured notification recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_email: Option<String>,
    /// Compared against the server-side shared secret when one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// 202 body returned by the asynchronous `/generate` endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateAccepted {
    pub status: String,
    pub project_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_repo_html: Option<String>,
}

/// Remote repository coordinates returned after a successful
/// create + commit. Held only for the duration of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub clone_url: String,
    pub html_url: String,
    pub full_name: String,
}

/// Subset of the GitHub user profile the service cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub html_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub secret_key: String,
}
