use shared::dto::{GenerationRequest, RepositoryInfo};
use std::sync::Arc;

use crate::config::Config;
use crate::error::PublishError;
use crate::services::generator;
use crate::services::github::RepoPublisher;
use crate::services::notify::{Notifier, WebhookPayload};
use crate::state::AppState;

/// Runs the generation pipeline for one accepted request:
/// synthesize -> publish -> best-effort fan-out (issue, webhook, email,
/// in that fixed order). Publish success is a precondition for any
/// fan-out step; fan-out failures are inspected, logged and discarded
/// individually so none of them blocks another or the final outcome.
///
/// Secret and session checks happen in the handlers before a pipeline
/// is ever constructed.
pub struct Orchestrator {
    config: Arc<Config>,
    publisher: Arc<dyn RepoPublisher>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        publisher: Arc<dyn RepoPublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            publisher,
            notifier,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.config.clone(),
            state.publisher.clone(),
            state.notifier.clone(),
        )
    }

    /// Synchronous pipeline run. Returns the published repository on
    /// success; a publish failure aborts before any notification fires.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        token: &str,
    ) -> Result<RepositoryInfo, PublishError> {
        let files = generator::synthesize(
            &request.description,
            request.requirements.as_deref(),
        );

        let repo = self
            .publisher
            .publish(token, &request.project_name, &files)
            .await?;

        tracing::info!(
            "published {} ({} files), starting notification fan-out",
            repo.full_name,
            files.len()
        );

        if self.config.enable_github_issue {
            let title = format!("Generation completed for {}", request.project_name);
            let body = format!(
                "Repository: {}\n\nMetadata: {:?}",
                repo.html_url,
                request.metadata.clone().unwrap_or_default()
            );
            if let Err(e) = self
                .publisher
                .create_followup_issue(token, &repo.full_name, &title, &body)
                .await
            {
                tracing::warn!("issue creation failed for {}: {}", repo.full_name, e);
            }
        }

        if let Some(url) = request
            .notify_url
            .as_deref()
            .or(self.config.webhook_url.as_deref())
        {
            let payload = WebhookPayload {
                project_name: request.project_name.clone(),
                repo_url: repo.clone_url.clone(),
                metadata: request.metadata.clone().unwrap_or_default(),
            };
            if let Err(e) = self.notifier.notify_webhook(url, &payload).await {
                tracing::warn!("webhook notification to {} failed: {}", url, e);
            }
        }

        if let Some(recipient) = request
            .notify_email
            .as_deref()
            .or(self.config.mail_to.as_deref())
        {
            let subject = format!("Repo created: {}", request.project_name);
            let body = format!(
                "Project: {}\nRepo: {}\nClone: {}\n",
                request.project_name, repo.html_url, repo.clone_url
            );
            if let Err(e) = self.notifier.notify_email(&subject, &body, recipient).await {
                tracing::warn!("email notification to {} failed: {}", recipient, e);
            }
        }

        Ok(repo)
    }

    /// Asynchronous mode: schedules the pipeline on a detached task.
    /// The handle is returned but the caller deliberately does not
    /// await it; a failure after acknowledgement is only visible in
    /// the logs.
    pub fn spawn(
        self,
        request: GenerationRequest,
        token: String,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            match self.run(&request, &token).await {
                Ok(repo) => {
                    tracing::info!("background generation finished: {}", repo.full_name)
                }
                Err(e) => tracing::error!(
                    "background generation for {} failed: {}",
                    request.project_name,
                    e
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::services::generator::ArtifactSet;
    use async_trait::async_trait;
    use shared::dto::GithubUser;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    type EventLog = Arc<Mutex<Vec<&'static str>>>;

    fn repo_info() -> RepositoryInfo {
        RepositoryInfo {
            clone_url: "https://github.com/octo/demo.git".to_string(),
            html_url: "https://github.com/octo/demo".to_string(),
            full_name: "octo/demo".to_string(),
        }
    }

    fn request(name: &str) -> GenerationRequest {
        GenerationRequest {
            project_name: name.to_string(),
            description: "a test app".to_string(),
            requirements: None,
            metadata: None,
            notify_url: None,
            notify_email: None,
            secret_key: None,
        }
    }

    #[derive(Default)]
    struct MockPublisher {
        events: EventLog,
        publish_calls: AtomicUsize,
        publish_done: AtomicUsize,
        published_file_count: AtomicUsize,
        issue_calls: AtomicUsize,
        fail_publish: bool,
        fail_issue: bool,
        publish_gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl RepoPublisher for MockPublisher {
        async fn whoami(&self, _token: &str) -> Result<GithubUser, PublishError> {
            Ok(GithubUser {
                login: "octo".to_string(),
                html_url: "https://github.com/octo".to_string(),
            })
        }

        async fn publish(
            &self,
            _token: &str,
            _repo_name: &str,
            files: &ArtifactSet,
        ) -> Result<RepositoryInfo, PublishError> {
            self.publish_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.publish_gate {
                gate.notified().await;
            }
            if self.fail_publish {
                return Err(PublishError::Remote {
                    action: "create the repository",
                    status: 422,
                });
            }
            self.published_file_count.store(files.len(), Ordering::SeqCst);
            self.events.lock().unwrap().push("publish");
            self.publish_done.fetch_add(1, Ordering::SeqCst);
            Ok(repo_info())
        }

        async fn create_followup_issue(
            &self,
            _token: &str,
            _full_name: &str,
            _title: &str,
            _body: &str,
        ) -> Result<String, PublishError> {
            self.issue_calls.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("issue");
            if self.fail_issue {
                return Err(PublishError::Remote {
                    action: "create the follow-up issue",
                    status: 500,
                });
            }
            Ok("https://github.com/octo/demo/issues/1".to_string())
        }

        async fn find_repo(
            &self,
            _token: &str,
            _full_name: &str,
        ) -> Result<Option<RepositoryInfo>, PublishError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        events: EventLog,
        webhook_calls: AtomicUsize,
        email_calls: AtomicUsize,
        fail_webhook: bool,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify_webhook(
            &self,
            _url: &str,
            _payload: &WebhookPayload,
        ) -> Result<(), DeliveryError> {
            self.webhook_calls.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("webhook");
            if self.fail_webhook {
                let err = "not-an-address"
                    .parse::<lettre::message::Mailbox>()
                    .unwrap_err();
                return Err(DeliveryError::Address(err));
            }
            Ok(())
        }

        async fn notify_email(
            &self,
            _subject: &str,
            _body: &str,
            _recipient: &str,
        ) -> Result<(), DeliveryError> {
            self.email_calls.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("email");
            Ok(())
        }
    }

    fn orchestrator(
        config: Config,
        publisher: MockPublisher,
        notifier: MockNotifier,
    ) -> (Orchestrator, Arc<MockPublisher>, Arc<MockNotifier>) {
        let publisher = Arc::new(publisher);
        let notifier = Arc::new(notifier);
        let orch = Orchestrator::new(
            Arc::new(config),
            publisher.clone() as Arc<dyn RepoPublisher>,
            notifier.clone() as Arc<dyn Notifier>,
        );
        (orch, publisher, notifier)
    }

    #[tokio::test]
    async fn end_to_end_publishes_two_files_and_reports_repo() {
        let events: EventLog = Default::default();
        let (orch, publisher, _notifier) = orchestrator(
            Config::default(),
            MockPublisher {
                events: events.clone(),
                ..Default::default()
            },
            MockNotifier {
                events: events.clone(),
                ..Default::default()
            },
        );

        let repo = orch.run(&request("demo"), "tok").await.unwrap();

        assert_eq!(repo.full_name, "octo/demo");
        assert_eq!(publisher.publish_calls.load(Ordering::SeqCst), 1);
        // README.md + app.py only; no requirements were given.
        assert_eq!(publisher.published_file_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fan_out_steps_survive_issue_failure() {
        let events: EventLog = Default::default();
        let (orch, publisher, notifier) = orchestrator(
            Config::default(),
            MockPublisher {
                events: events.clone(),
                fail_issue: true,
                ..Default::default()
            },
            MockNotifier {
                events: events.clone(),
                ..Default::default()
            },
        );

        let mut req = request("demo");
        req.notify_url = Some("https://eval.example.com/hook".to_string());
        req.notify_email = Some("dev@example.com".to_string());

        let repo = orch.run(&req, "tok").await.unwrap();

        assert_eq!(repo.full_name, "octo/demo");
        assert_eq!(publisher.issue_calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.webhook_calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.email_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn webhook_failure_does_not_block_email() {
        let events: EventLog = Default::default();
        let (orch, _publisher, notifier) = orchestrator(
            Config::default(),
            MockPublisher {
                events: events.clone(),
                ..Default::default()
            },
            MockNotifier {
                events: events.clone(),
                fail_webhook: true,
                ..Default::default()
            },
        );

        let mut req = request("demo");
        req.notify_url = Some("https://eval.example.com/hook".to_string());
        req.notify_email = Some("dev@example.com".to_string());

        orch.run(&req, "tok").await.unwrap();

        assert_eq!(notifier.webhook_calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.email_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["publish", "issue", "webhook", "email"]
        );
    }

    #[tokio::test]
    async fn publish_failure_aborts_before_any_notification() {
        let events: EventLog = Default::default();
        let (orch, publisher, notifier) = orchestrator(
            Config::default(),
            MockPublisher {
                events: events.clone(),
                fail_publish: true,
                ..Default::default()
            },
            MockNotifier {
                events: events.clone(),
                ..Default::default()
            },
        );

        let mut req = request("demo");
        req.notify_url = Some("https://eval.example.com/hook".to_string());
        req.notify_email = Some("dev@example.com".to_string());

        let result = orch.run(&req, "tok").await;

        assert!(result.is_err());
        assert_eq!(publisher.issue_calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.webhook_calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.email_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn issue_step_skipped_when_disabled() {
        let events: EventLog = Default::default();
        let config = Config {
            enable_github_issue: false,
            ..Config::default()
        };
        let (orch, publisher, _notifier) = orchestrator(
            config,
            MockPublisher {
                events: events.clone(),
                ..Default::default()
            },
            MockNotifier {
                events: events.clone(),
                ..Default::default()
            },
        );

        orch.run(&request("demo"), "tok").await.unwrap();
        assert_eq!(publisher.issue_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn spawn_returns_before_publish_completes() {
        let gate = Arc::new(Notify::new());
        let events: EventLog = Default::default();
        let (orch, publisher, _notifier) = orchestrator(
            Config::default(),
            MockPublisher {
                events: events.clone(),
                publish_gate: Some(gate.clone()),
                ..Default::default()
            },
            MockNotifier {
                events: events.clone(),
                ..Default::default()
            },
        );
        let publisher_view = publisher.clone();

        let handle = orch.spawn(request("demo"), "tok".to_string());

        // The background publish is parked on the gate, so control came
        // back here with the pipeline still incomplete.
        assert_eq!(publisher_view.publish_done.load(Ordering::SeqCst), 0);

        gate.notify_one();
        handle.await.unwrap();
        assert_eq!(publisher_view.publish_done.load(Ordering::SeqCst), 1);
    }
}
