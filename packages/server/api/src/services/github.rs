use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use shared::dto::{GithubUser, RepositoryInfo};
use std::time::Duration;

use crate::error::PublishError;
use crate::services::generator::ArtifactSet;

const GITHUB_API: &str = "https://api.github.com";
const COMMIT_MESSAGE: &str = "Initial commit (generated)";
const COMMIT_BRANCH: &str = "main";

/// Remote repository capability. Injected into `AppState` at
/// construction so nothing downstream branches on whether a publisher
/// exists; tests swap in counting mocks.
#[async_trait]
pub trait RepoPublisher: Send + Sync {
    /// One remote identity lookup for the given bearer token.
    async fn whoami(&self, token: &str) -> Result<GithubUser, PublishError>;

    /// Creates the repository and commits every file. A partial commit
    /// failure propagates as-is; the possibly incomplete remote repo is
    /// not rolled back.
    async fn publish(
        &self,
        token: &str,
        repo_name: &str,
        files: &ArtifactSet,
    ) -> Result<RepositoryInfo, PublishError>;

    /// Opens a follow-up issue on an existing repository and returns its
    /// html URL.
    async fn create_followup_issue(
        &self,
        token: &str,
        full_name: &str,
        title: &str,
        body: &str,
    ) -> Result<String, PublishError>;

    /// Looks a repository up by `owner/name`; `None` when it does not
    /// exist.
    async fn find_repo(
        &self,
        token: &str,
        full_name: &str,
    ) -> Result<Option<RepositoryInfo>, PublishError>;
}

#[derive(Deserialize)]
struct RepoResponse {
    clone_url: String,
    html_url: String,
    full_name: String,
}

impl From<RepoResponse> for RepositoryInfo {
    fn from(r: RepoResponse) -> Self {
        RepositoryInfo {
            clone_url: r.clone_url,
            html_url: r.html_url,
            full_name: r.full_name,
        }
    }
}

#[derive(Deserialize)]
struct IssueResponse {
    html_url: String,
}

/// Publisher backed by the GitHub REST API over reqwest.
pub struct GithubPublisher {
    client: reqwest::Client,
}

impl GithubPublisher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("scaffold-api")
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn auth(&self, req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("token {}", token))
            .header("Accept", "application/vnd.github+json")
    }
}

impl Default for GithubPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepoPublisher for GithubPublisher {
    async fn whoami(&self, token: &str) -> Result<GithubUser, PublishError> {
        let resp = self
            .auth(self.client.get(format!("{}/user", GITHUB_API)), token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PublishError::Remote {
                action: "look up the authenticated user",
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json::<GithubUser>().await?)
    }

    async fn publish(
        &self,
        token: &str,
        repo_name: &str,
        files: &ArtifactSet,
    ) -> Result<RepositoryInfo, PublishError> {
        // 1. Create the private repository under the token's user
        let resp = self
            .auth(self.client.post(format!("{}/user/repos", GITHUB_API)), token)
            .json(&json!({
                "name": repo_name,
                "private": true,
                "auto_init": false,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PublishError::Remote {
                action: "create the repository",
                status: resp.status().as_u16(),
            });
        }

        let repo: RepoResponse = resp.json().await?;

        // 2. Commit each file via the contents API
        for (path, content) in files {
            let encoded = base64::engine::general_purpose::STANDARD.encode(content);
            let resp = self
                .auth(
                    self.client.put(format!(
                        "{}/repos/{}/contents/{}",
                        GITHUB_API, repo.full_name, path
                    )),
                    token,
                )
                .json(&json!({
                    "message": COMMIT_MESSAGE,
                    "content": encoded,
                    "branch": COMMIT_BRANCH,
                }))
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(PublishError::Remote {
                    action: "commit a generated file",
                    status: resp.status().as_u16(),
                });
            }
        }

        Ok(repo.into())
    }

    async fn create_followup_issue(
        &self,
        token: &str,
        full_name: &str,
        title: &str,
        body: &str,
    ) -> Result<String, PublishError> {
        let resp = self
            .auth(
                self.client
                    .post(format!("{}/repos/{}/issues", GITHUB_API, full_name)),
                token,
            )
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PublishError::Remote {
                action: "create the follow-up issue",
                status: resp.status().as_u16(),
            });
        }

        let issue: IssueResponse = resp.json().await?;
        Ok(issue.html_url)
    }

    async fn find_repo(
        &self,
        token: &str,
        full_name: &str,
    ) -> Result<Option<RepositoryInfo>, PublishError> {
        let resp = self
            .auth(
                self.client
                    .get(format!("{}/repos/{}", GITHUB_API, full_name)),
                token,
            )
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            return Err(PublishError::Remote {
                action: "look up the repository",
                status: resp.status().as_u16(),
            });
        }

        let repo: RepoResponse = resp.json().await?;
        Ok(Some(repo.into()))
    }
}

/// No-op stand-in used when no real publisher is wired up. Every
/// operation reports the capability as unavailable.
pub struct NullPublisher;

#[async_trait]
impl RepoPublisher for NullPublisher {
    async fn whoami(&self, _token: &str) -> Result<GithubUser, PublishError> {
        Err(PublishError::Unavailable)
    }

    async fn publish(
        &self,
        _token: &str,
        _repo_name: &str,
        _files: &ArtifactSet,
    ) -> Result<RepositoryInfo, PublishError> {
        Err(PublishError::Unavailable)
    }

    async fn create_followup_issue(
        &self,
        _token: &str,
        _full_name: &str,
        _title: &str,
        _body: &str,
    ) -> Result<String, PublishError> {
        Err(PublishError::Unavailable)
    }

    async fn find_repo(
        &self,
        _token: &str,
        _full_name: &str,
    ) -> Result<Option<RepositoryInfo>, PublishError> {
        Err(PublishError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_publisher_reports_capability_unavailable() {
        let publisher = NullPublisher;
        let files: ArtifactSet = vec![("README.md".to_string(), "x".to_string())];

        assert!(matches!(
            publisher.whoami("tok").await,
            Err(PublishError::Unavailable)
        ));
        assert!(matches!(
            publisher.publish("tok", "demo", &files).await,
            Err(PublishError::Unavailable)
        ));
        assert!(matches!(
            publisher
                .create_followup_issue("tok", "octo/demo", "t", "b")
                .await,
            Err(PublishError::Unavailable)
        ));
    }

    #[test]
    fn repo_response_maps_onto_repository_info() {
        let repo: RepositoryInfo = RepoResponse {
            clone_url: "https://github.com/octo/demo.git".to_string(),
            html_url: "https://github.com/octo/demo".to_string(),
            full_name: "octo/demo".to_string(),
        }
        .into();

        assert_eq!(repo.full_name, "octo/demo");
        assert_eq!(repo.clone_url, "https://github.com/octo/demo.git");
    }
}
