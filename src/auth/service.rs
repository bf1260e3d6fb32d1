use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::{Account, Role, Session};
use crate::db::operations::AccountRepo;
use crate::error::{AccountError, AppError, AuthError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Account ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

pub struct AuthService {
    store: Arc<dyn AccountRepo>,
    jwt_secret: String,
    token_expiry_hours: i64,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountRepo>, jwt_secret: String, token_expiry_hours: i64) -> Self {
        Self {
            store,
            jwt_secret,
            token_expiry_hours,
        }
    }

    /// Creates an unverified account with its role profile row. Duplicate
    /// emails are rejected here when visible, and by the unique index under
    /// concurrent registrations.
    pub async fn register(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, AppError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AppError::ValidationError("Invalid email address".into()));
        }
        if password.len() < 8 {
            return Err(AppError::ValidationError(
                "Password must be at least 8 characters".into(),
            ));
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(AppError::AccountError(AccountError::DuplicateEmail));
        }

        let account = Account::new(
            email.to_string(),
            first_name.trim().to_string(),
            last_name.trim().to_string(),
            hash_password(password),
            role,
        );

        self.store.create_registration(&account).await
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, AppError> {
        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::AuthError(AuthError::InvalidCredentials))?;

        if !verify_password(password, &account.password_hash) {
            return Err(AppError::AuthError(AuthError::InvalidCredentials));
        }

        let token = self.generate_token(&account.id.to_string())?;

        let session = Session::new(account.id, token.clone(), self.token_expiry_hours);
        self.store.create_session(&session).await?;
        self.store.record_login(account.id).await?;

        Ok(token)
    }

    pub async fn validate_token(&self, token: &str) -> Result<Account, AppError> {
        // First check if session exists and is not expired
        let session = self
            .store
            .get_session_by_token(token)
            .await?
            .ok_or(AppError::AuthError(AuthError::InvalidToken))?;

        if session.is_expired() {
            return Err(AppError::AuthError(AuthError::TokenExpired));
        }

        // Validate JWT
        let claims = self.decode_token(token)?;

        let account_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::AuthError(AuthError::InvalidToken))?;
        let account = self
            .store
            .get_account_by_id(account_id)
            .await?
            .ok_or(AppError::AuthError(AuthError::Unauthorized))?;

        // Update session activity
        self.store.update_session_activity(token).await?;

        Ok(account)
    }

    pub async fn invalidate_token(&self, token: &str) -> Result<(), AppError> {
        self.store.delete_session(token).await
    }

    fn generate_token(&self, account_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.token_expiry_hours)).timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            exp,
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(claims.claims)
    }
}

/// Salted SHA-256 hash, stored as `base64(salt)$base64(digest)`.
fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", BASE64.encode(salt), BASE64.encode(digest))
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(digest)) = (BASE64.decode(salt_b64), BASE64.decode(digest_b64)) else {
        return false;
    };
    salted_digest(&salt, password) == digest
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::MockAccountRepo;

    fn service_over(repo: MockAccountRepo) -> AuthService {
        AuthService::new(Arc::new(repo), "test_secret".to_string(), 1)
    }

    #[tokio::test]
    async fn test_register_rejects_existing_email() {
        let existing = Account::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "Nguyen".to_string(),
            hash_password("first password"),
            Role::University,
        );

        let mut repo = MockAccountRepo::new();
        repo.expect_find_by_email()
            .withf(|email| email == "alice@example.com")
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create_registration().times(0);

        let service = service_over(repo);
        let result = service
            .register("alice@example.com", "Alice", "Nguyen", "second password", Role::Company)
            .await;
        assert!(matches!(
            result,
            Err(AppError::AccountError(AccountError::DuplicateEmail))
        ));
    }

    #[tokio::test]
    async fn test_register_creates_unverified_account() {
        let mut repo = MockAccountRepo::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create_registration()
            .withf(|account| !account.is_verified && account.verification_token.is_none())
            .times(1)
            .returning(|account| Ok(account.clone()));

        let service = service_over(repo);
        let account = service
            .register("bob@example.com", "Bob", "Okafor", "long enough", Role::Investor)
            .await
            .unwrap();
        assert_eq!(account.email, "bob@example.com");
        assert_eq!(account.role, Role::Investor);
        assert!(verify_password("long enough", &account.password_hash));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery");
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let first = hash_password("same password");
        let second = hash_password("same password");
        assert_ne!(first, second);
        assert!(verify_password("same password", &first));
        assert!(verify_password("same password", &second));
    }

    #[test]
    fn test_verify_rejects_malformed_hashes() {
        assert!(!verify_password("anything", "not-a-stored-hash"));
        assert!(!verify_password("anything", "bad base64$also bad"));
    }
}
