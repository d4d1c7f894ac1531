//! Configuration types for bulk-import

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Downstream task queue endpoints and delivery settings
///
/// Groups the HTTP targets each kind of task is enqueued to.
/// Used as a nested sub-config within [`ImportConfig`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskQueueConfig {
    /// Endpoint that receives content-fetch tasks for URL items
    #[serde(default)]
    pub content_fetch_url: String,

    /// Endpoint that receives direct save tasks for already-extracted content
    #[serde(default)]
    pub save_page_url: String,

    /// Endpoint that receives user email tasks
    #[serde(default)]
    pub email_user_url: String,

    /// Per-request timeout for task enqueue calls (default: 10s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            content_fetch_url: String::new(),
            save_page_url: String::new(),
            email_user_url: String::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Notification boundary settings
///
/// The email task requires a signed auth token; the signing secret is a
/// deployment requirement, validated at service construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Secret used to sign the auth token attached to email tasks
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Lifetime of the signed auth token (default: 24h)
    #[serde(default = "default_token_ttl")]
    pub token_ttl: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: default_token_ttl(),
        }
    }
}

/// Top-level configuration for the import service
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Downstream task queue settings
    #[serde(default)]
    pub tasks: TaskQueueConfig,

    /// Notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl ImportConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the offending key if a required
    /// endpoint or the notification signing secret is missing.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.content_fetch_url.is_empty() {
            return Err(missing("content fetch endpoint", "tasks.content_fetch_url"));
        }
        if self.tasks.save_page_url.is_empty() {
            return Err(missing("save page endpoint", "tasks.save_page_url"));
        }
        if self.tasks.email_user_url.is_empty() {
            return Err(missing("email task endpoint", "tasks.email_user_url"));
        }
        match &self.notify.jwt_secret {
            Some(secret) if !secret.is_empty() => {}
            _ => return Err(missing("notification signing secret", "notify.jwt_secret")),
        }
        if self.tasks.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request timeout must be non-zero".to_string(),
                key: Some("tasks.request_timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn missing(what: &str, key: &str) -> Error {
    Error::Config {
        message: format!("{} is not set", what),
        key: Some(key.to_string()),
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(60 * 60 * 24)
}
