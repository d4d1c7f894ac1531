//! Terminal run notifications
//!
//! Every run that reached parsing ends with exactly one email: failure when
//! one or fewer items were imported, completion otherwise. The email is
//! delivered as a downstream task authenticated with a short-lived signed
//! token, so the email service can trust the user id it is addressed to.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::ImportConfig;
use crate::error::{Error, Result};
use crate::tasks::TaskQueue;
use crate::types::EmailTaskPayload;

/// Claims of the auth token attached to email tasks
#[derive(Debug, Serialize)]
struct Claims<'a> {
    uid: &'a str,
    exp: i64,
}

/// Sends the terminal notification for an import run
pub struct Notifier {
    queue: Arc<dyn TaskQueue>,
    email_user_url: String,
    secret: String,
    token_ttl: Duration,
}

impl Notifier {
    /// Create a notifier from validated configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the signing secret is absent. This is a
    /// deployment error and is raised here, at construction, rather than
    /// surfacing mid-run.
    pub fn new(queue: Arc<dyn TaskQueue>, config: &ImportConfig) -> Result<Self> {
        let secret = match &config.notify.jwt_secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => {
                return Err(Error::Config {
                    message: "notification signing secret is not set".to_string(),
                    key: Some("notify.jwt_secret".to_string()),
                });
            }
        };
        Ok(Self {
            queue,
            email_user_url: config.tasks.email_user_url.clone(),
            secret,
            token_ttl: config.notify.token_ttl,
        })
    }

    /// Notify the user that the run produced nothing worth keeping
    pub async fn send_failed(&self, user_id: &str) -> Result<()> {
        info!(user = user_id, "sending import failure email");
        self.send(
            user_id,
            EmailTaskPayload {
                subject: "Your import failed.".to_string(),
                body: "There was an error importing your file. Please make sure you \
                       uploaded the correct file type and try again."
                    .to_string(),
            },
        )
        .await
    }

    /// Notify the user of a completed run, with both counts
    pub async fn send_completed(&self, user_id: &str, imported: u32, failed: u32) -> Result<()> {
        info!(user = user_id, imported, failed, "sending import completion email");
        self.send(
            user_id,
            EmailTaskPayload {
                subject: "Your import has completed processing".to_string(),
                body: format!(
                    "{} URLs have been processed and should be available in your \
                     library. {} URLs failed to be parsed.",
                    imported, failed
                ),
            },
        )
        .await
    }

    async fn send(&self, user_id: &str, payload: EmailTaskPayload) -> Result<()> {
        let headers = self.auth_headers(user_id)?;
        self.queue
            .enqueue(
                &self.email_user_url,
                serde_json::to_value(&payload)?,
                Some(headers),
            )
            .await?;
        Ok(())
    }

    /// Build the signed auth cookie the email service expects
    fn auth_headers(&self, user_id: &str) -> Result<HeaderMap> {
        let exp = Utc::now().timestamp() + self.token_ttl.as_secs() as i64;
        let claims = Claims { uid: user_id, exp };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("auth={}", token))
                .map_err(|e| Error::Other(format!("invalid auth header: {}", e)))?,
        );
        Ok(headers)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NotifyConfig, TaskQueueConfig};
    use crate::tasks::HttpTaskQueue;
    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ImportConfig {
        ImportConfig {
            tasks: TaskQueueConfig {
                content_fetch_url: format!("{}/fetch", server.uri()),
                save_page_url: format!("{}/save", server.uri()),
                email_user_url: format!("{}/email", server.uri()),
                ..Default::default()
            },
            notify: NotifyConfig {
                jwt_secret: Some("test-secret".to_string()),
                ..Default::default()
            },
        }
    }

    fn queue() -> Arc<dyn TaskQueue> {
        Arc::new(HttpTaskQueue::new(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn missing_secret_fails_at_construction() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.notify.jwt_secret = None;
        assert!(matches!(
            Notifier::new(queue(), &config),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn failure_email_carries_the_failure_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(queue(), &config_for(&server)).unwrap();
        notifier.send_failed("user-1").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["subject"], "Your import failed.");
        // Auth cookie is attached
        let cookie = requests[0].headers.get("cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with("auth="));
    }

    #[tokio::test]
    async fn completion_email_interpolates_both_counts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(queue(), &config_for(&server)).unwrap();
        notifier.send_completed("user-1", 12, 3).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["subject"], "Your import has completed processing");
        let text = body["body"].as_str().unwrap();
        assert!(text.contains("12 URLs have been processed"));
        assert!(text.contains("3 URLs failed"));
    }

    #[tokio::test]
    async fn auth_token_is_verifiable_with_the_shared_secret() {
        use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

        let server = MockServer::start().await;
        let notifier = Notifier::new(queue(), &config_for(&server)).unwrap();
        let headers = notifier.auth_headers("user-1").unwrap();
        let cookie = headers.get(COOKIE).unwrap().to_str().unwrap();
        let token = cookie.strip_prefix("auth=").unwrap();

        #[derive(Debug, serde::Deserialize)]
        struct DecodedClaims {
            uid: String,
            exp: i64,
        }

        let decoded = decode::<DecodedClaims>(
            token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.uid, "user-1");
        assert!(decoded.claims.exp > Utc::now().timestamp());
    }
}
