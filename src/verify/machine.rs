use std::sync::Arc;
use tracing::info;

use crate::db::operations::AccountRepo;
use crate::error::{AppError, VerifyError};

/// Result of redeeming a verification token. `AlreadyVerified` is
/// informational, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Verified,
    AlreadyVerified,
}

pub struct VerificationService {
    repo: Arc<dyn AccountRepo>,
}

impl VerificationService {
    pub fn new(repo: Arc<dyn AccountRepo>) -> Self {
        Self { repo }
    }

    /// Redeems a verification token: sets the verified flag and clears the
    /// token. Unknown, malformed, and already-consumed tokens are all
    /// `InvalidToken`; the token is cleared on first success, so a repeat
    /// redemption of the same token lands there too, never at
    /// `AlreadyVerified`.
    pub async fn redeem(&self, token: &str) -> Result<RedeemOutcome, AppError> {
        let account = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::VerifyError(VerifyError::InvalidToken))?;

        // Normally unreachable: a verified account holds no token. Kept as a
        // guard in case a token survives verification through manual edits.
        if account.is_verified {
            return Ok(RedeemOutcome::AlreadyVerified);
        }

        self.repo.mark_verified(account.id).await?;
        info!("Email verified for {}", account.email);
        Ok(RedeemOutcome::Verified)
    }
}
