use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

use crate::db::models::Account;
use crate::db::operations::AccountRepo;
use crate::error::AppError;
use crate::mail::Mailer;

/// Generates an opaque 128-bit verification token, URL-safe encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Outcome of the email dispatch. The token is persisted either way; the
/// resend path is the recovery mechanism for failed deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
}

pub struct TokenIssuer {
    repo: Arc<dyn AccountRepo>,
    mailer: Arc<dyn Mailer>,
    public_base_url: String,
}

impl TokenIssuer {
    pub fn new(repo: Arc<dyn AccountRepo>, mailer: Arc<dyn Mailer>, public_base_url: String) -> Self {
        Self {
            repo,
            mailer,
            public_base_url,
        }
    }

    /// Stores a fresh token on the account (overwriting any prior one) and
    /// sends the verification email. A mail-transport failure is reported in
    /// the returned [`Delivery`] but never rolls back the stored token.
    pub async fn issue(&self, account: &Account) -> Result<(String, Delivery), AppError> {
        let token = generate_token();
        self.repo.set_verification_token(account.id, &token).await?;

        let link = self.verification_link(&token)?;
        let subject = "Verify your email address";
        let body = format!(
            "Hello {},\n\nPlease confirm your email address by clicking this link:\n\n{}\n\n\
             If you did not create an account, you can ignore this message.",
            account.display_name(),
            link
        );

        match self.mailer.send(&account.email, subject, &body).await {
            Ok(()) => {
                info!("Verification email sent to {}", account.email);
                Ok((token, Delivery::Sent))
            }
            Err(e) => {
                error!("Failed to send verification email to {}: {}", account.email, e);
                Ok((token, Delivery::Failed))
            }
        }
    }

    fn verification_link(&self, token: &str) -> Result<Url, AppError> {
        let base = Url::parse(&self.public_base_url)
            .map_err(|e| AppError::InternalError(format!("Invalid public base URL: {}", e)))?;
        base.join(&format!("/email/verify/{}", token))
            .map_err(|e| AppError::InternalError(format!("Invalid verification link: {}", e)))
    }
}
