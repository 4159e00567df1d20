use std::env;

/// Wire format for the outbound webhook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFormat {
    Json,
    /// Formspree-style: form fields with metadata flattened to a JSON string.
    Formspree,
}

impl WebhookFormat {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("formspree") {
            WebhookFormat::Formspree
        } else {
            WebhookFormat::Json
        }
    }
}

/// Immutable service configuration, built once from the environment at
/// startup and injected everywhere via `AppState`. No other code reads
/// environment variables at request time.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub github_redirect_uri: String,
    /// Fallback bearer token for endpoints that accept a server token
    /// instead of a session credential (`/check/{project_name}`).
    pub github_token: Option<String>,
    /// Used for the expected-repo URL when the identity lookup fails.
    pub github_user_hint: Option<String>,
    /// Shared secret requests may be validated against.
    pub secret_key: Option<String>,
    /// Session cookie signing secret; a random key is generated at
    /// startup when unset.
    pub session_secret: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_format: WebhookFormat,
    pub enable_github_issue: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub mail_from: Option<String>,
    pub mail_to: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            github_client_id: None,
            github_client_secret: None,
            github_redirect_uri: "http://localhost:8000/auth/callback".to_string(),
            github_token: None,
            github_user_hint: None,
            secret_key: None,
            session_secret: None,
            webhook_url: None,
            webhook_format: WebhookFormat::Json,
            enable_github_issue: true,
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
            mail_from: None,
            mail_to: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            port: env_opt("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            github_client_id: env_opt("GITHUB_CLIENT_ID"),
            github_client_secret: env_opt("GITHUB_CLIENT_SECRET"),
            github_redirect_uri: env_opt("GITHUB_REDIRECT_URI")
                .unwrap_or(defaults.github_redirect_uri),
            github_token: env_opt("GITHUB_TOKEN"),
            github_user_hint: env_opt("GITHUB_USER_HINT"),
            secret_key: env_opt("SECRET_KEY"),
            session_secret: env_opt("SESSION_SECRET"),
            webhook_url: env_opt("EVAL_SERVER_URL"),
            webhook_format: env_opt("EVAL_FORMAT")
                .map(|v| WebhookFormat::parse(&v))
                .unwrap_or(defaults.webhook_format),
            enable_github_issue: env_opt("ENABLE_GITHUB_ISSUE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.enable_github_issue),
            smtp_host: env_opt("SMTP_HOST"),
            smtp_port: env_opt("SMTP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.smtp_port),
            smtp_user: env_opt("SMTP_USER"),
            smtp_pass: env_opt("SMTP_PASS"),
            mail_from: env_opt("MAIL_FROM"),
            mail_to: env_opt("MAIL_TO"),
        }
    }

    /// True when a server secret is configured and the request supplied a
    /// different one. A request that omits the secret passes the check.
    pub fn secret_mismatch(&self, supplied: Option<&str>) -> bool {
        match (self.secret_key.as_deref(), supplied) {
            (Some(expected), Some(got)) => expected != got,
            _ => false,
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing_accepts_common_truthy_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn webhook_format_defaults_to_json() {
        assert_eq!(WebhookFormat::parse("formspree"), WebhookFormat::Formspree);
        assert_eq!(WebhookFormat::parse("FormSpree"), WebhookFormat::Formspree);
        assert_eq!(WebhookFormat::parse("json"), WebhookFormat::Json);
        assert_eq!(WebhookFormat::parse("anything-else"), WebhookFormat::Json);
    }

    #[test]
    fn secret_mismatch_only_when_both_sides_present_and_unequal() {
        let mut config = Config::default();
        assert!(!config.secret_mismatch(None));
        assert!(!config.secret_mismatch(Some("whatever")));

        config.secret_key = Some("expected".to_string());
        assert!(!config.secret_mismatch(None));
        assert!(!config.secret_mismatch(Some("expected")));
        assert!(config.secret_mismatch(Some("wrong")));
    }
}
