//! Shared in-memory fakes for the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use innobridge_server::db::{Account, AccountRepo, Session};
use innobridge_server::error::{AccountError, AppError};
use innobridge_server::Mailer;

/// In-memory stand-in for the Postgres-backed store. Enforces the same
/// case-insensitive email uniqueness the database index does.
#[derive(Default)]
pub struct InMemoryAccounts {
    pub accounts: Mutex<HashMap<Uuid, Account>>,
    pub sessions: Mutex<HashMap<String, Session>>,
}

impl InMemoryAccounts {
    pub fn insert(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }

    pub fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl AccountRepo for InMemoryAccounts {
    async fn create_registration(&self, account: &Account) -> Result<Account, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(AppError::AccountError(AccountError::DuplicateEmail));
        }
        accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .find(|a| a.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.get(id))
    }

    async fn set_verification_token(&self, account_id: Uuid, token: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(&account_id) {
            account.verification_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn mark_verified(&self, account_id: Uuid) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(&account_id) {
            account.is_verified = true;
            account.verification_token = None;
        }
        Ok(())
    }

    async fn record_login(&self, account_id: Uuid) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(&account_id) {
            account.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_session(&self, session: &Session) -> Result<Session, AppError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(session.clone())
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn update_session_activity(&self, token: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(token) {
            session.last_activity = Utc::now();
        }
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }
}

/// Mailer that records deliveries and can simulate one transport failure.
#[derive(Default)]
pub struct FakeMailer {
    pub fail_next: AtomicBool,
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, recipient: &str, _subject: &str, text_body: &str) -> Result<(), AppError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::MailError("simulated outage".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text_body.to_string()));
        Ok(())
    }
}
