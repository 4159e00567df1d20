use crate::config::Config;
use crate::services::github::{GithubPublisher, RepoPublisher};
use crate::services::notify::{HttpNotifier, Notifier};
use std::sync::Arc;

/// Shared, read-only request context: the startup configuration plus
/// the injected publisher/notifier capabilities.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publisher: Arc<dyn RepoPublisher>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Wires the real GitHub publisher and HTTP/SMTP notifier. Tests
    /// build the struct directly with mock capabilities instead.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let publisher: Arc<dyn RepoPublisher> = Arc::new(GithubPublisher::new());
        let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(config.clone()));
        Self {
            config,
            publisher,
            notifier,
        }
    }
}
