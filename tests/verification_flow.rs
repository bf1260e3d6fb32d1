//! End-to-end verification flow over an in-memory account repository:
//! issue a token, redeem it, and confirm consumed tokens stay dead.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{FakeMailer, InMemoryAccounts};
use innobridge_server::db::{Account, Role};
use innobridge_server::error::{AppError, VerifyError};
use innobridge_server::verify::{Delivery, RedeemOutcome, TokenIssuer, VerificationService};

fn new_account(email: &str, role: Role) -> Account {
    Account::new(
        email.to_string(),
        "Alice".to_string(),
        "Nguyen".to_string(),
        "hash".to_string(),
        role,
    )
}

fn services(
    repo: Arc<InMemoryAccounts>,
    mailer: Arc<FakeMailer>,
) -> (TokenIssuer, VerificationService) {
    let issuer = TokenIssuer::new(
        repo.clone(),
        mailer,
        "http://localhost:8080".to_string(),
    );
    let verifier = VerificationService::new(repo);
    (issuer, verifier)
}

#[test_log::test(tokio::test)]
async fn test_fresh_token_redeems_exactly_once() {
    let repo = Arc::new(InMemoryAccounts::default());
    let mailer = Arc::new(FakeMailer::default());
    let (issuer, verifier) = services(repo.clone(), mailer.clone());

    let account = new_account("alice@example.com", Role::Investor);
    let account_id = account.id;
    repo.insert(account.clone());

    let (token, delivery) = issuer.issue(&account).await.unwrap();
    assert_eq!(delivery, Delivery::Sent);

    // The email carries the verification link with this token
    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice@example.com");
    assert!(sent[0].1.contains(&format!("/email/verify/{}", token)));

    // First redemption verifies the account and clears the token
    let outcome = verifier.redeem(&token).await.unwrap();
    assert_eq!(outcome, RedeemOutcome::Verified);

    let stored = repo.get(account_id).unwrap();
    assert!(stored.is_verified);
    assert!(stored.verification_token.is_none());

    // A second redemption of the consumed token is InvalidToken, never
    // AlreadyVerified
    let result = verifier.redeem(&token).await;
    assert!(matches!(
        result,
        Err(AppError::VerifyError(VerifyError::InvalidToken))
    ));
}

#[test_log::test(tokio::test)]
async fn test_unassigned_token_is_invalid() {
    let repo = Arc::new(InMemoryAccounts::default());
    let mailer = Arc::new(FakeMailer::default());
    let (_, verifier) = services(repo, mailer);

    let result = verifier.redeem("never-issued").await;
    assert!(matches!(
        result,
        Err(AppError::VerifyError(VerifyError::InvalidToken))
    ));
}

#[test_log::test(tokio::test)]
async fn test_reissue_invalidates_prior_token() {
    let repo = Arc::new(InMemoryAccounts::default());
    let mailer = Arc::new(FakeMailer::default());
    let (issuer, verifier) = services(repo.clone(), mailer);

    let account = new_account("bob@example.com", Role::Company);
    repo.insert(account.clone());

    let (first_token, _) = issuer.issue(&account).await.unwrap();
    let (second_token, _) = issuer.issue(&account).await.unwrap();
    assert_ne!(first_token, second_token);

    // The overwritten token no longer resolves
    let result = verifier.redeem(&first_token).await;
    assert!(matches!(
        result,
        Err(AppError::VerifyError(VerifyError::InvalidToken))
    ));

    let outcome = verifier.redeem(&second_token).await.unwrap();
    assert_eq!(outcome, RedeemOutcome::Verified);
}

#[test_log::test(tokio::test)]
async fn test_failed_delivery_leaves_token_redeemable() {
    let repo = Arc::new(InMemoryAccounts::default());
    let mailer = Arc::new(FakeMailer::default());
    mailer.fail_next.store(true, Ordering::SeqCst);
    let (issuer, verifier) = services(repo.clone(), mailer.clone());

    let account = new_account("carol@example.com", Role::University);
    repo.insert(account.clone());

    let (token, delivery) = issuer.issue(&account).await.unwrap();
    assert_eq!(delivery, Delivery::Failed);
    assert!(mailer.sent.lock().unwrap().is_empty());

    // The token survived the outage; the resend path would reuse this flow
    let outcome = verifier.redeem(&token).await.unwrap();
    assert_eq!(outcome, RedeemOutcome::Verified);
}
