//! Outbound email for the InnoBridge server.
//!
//! Delivery goes through an HTTP mail API; the [`Mailer`] trait keeps the
//! transport swappable so the verification flow can be tested without a
//! network.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::MailConfig;
use crate::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, text_body: &str) -> Result<(), AppError>;
}

pub struct EmailClient {
    http_client: reqwest::Client,
    api_base_url: String,
    sender: String,
    api_token: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::MailError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.clone(),
            sender: config.sender.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl Mailer for EmailClient {
    async fn send(&self, recipient: &str, subject: &str, text_body: &str) -> Result<(), AppError> {
        let url = format!("{}/email", self.api_base_url);
        let request = SendEmailRequest {
            from: &self.sender,
            to: recipient,
            subject,
            text_body,
        };

        self.http_client
            .post(&url)
            .header("X-Api-Token", &self.api_token)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::MailError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EmailClient {
        EmailClient::new(&MailConfig {
            api_base_url: server.uri(),
            sender: "no-reply@test.example".to_string(),
            api_token: "test_token".to_string(),
            timeout_ms: 1_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_to_mail_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .and(header_exists("X-Api-Token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .send("alice@example.com", "Verify your email", "click the link")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .send("alice@example.com", "Verify your email", "click the link")
            .await;

        assert!(matches!(result, Err(AppError::MailError(_))));
    }
}
