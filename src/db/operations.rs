use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{
    Account, CompanyProfile, InvestorProfile, Role, Session, UniversityProfile,
};
use crate::error::{AccountError, AppError, DatabaseError};

/// Persistence seam for the account, verification, and session flows. The
/// production implementation is [`AccountStore`]; tests substitute an
/// in-memory fake or a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Inserts the account and its role profile atomically; a concurrent
    /// duplicate email is rejected with `DuplicateEmail`.
    async fn create_registration(&self, account: &Account) -> Result<Account, AppError>;

    /// Case-insensitive exact match on email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Account>, AppError>;

    async fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Overwrites any prior token on the account.
    async fn set_verification_token(&self, account_id: Uuid, token: &str) -> Result<(), AppError>;

    /// Sets the verified flag and clears the token in one update.
    async fn mark_verified(&self, account_id: Uuid) -> Result<(), AppError>;

    async fn record_login(&self, account_id: Uuid) -> Result<(), AppError>;

    async fn create_session(&self, session: &Session) -> Result<Session, AppError>;

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, AppError>;

    async fn update_session_activity(&self, token: &str) -> Result<(), AppError>;

    async fn delete_session(&self, token: &str) -> Result<(), AppError>;
}

pub struct AccountStore {
    pool: Arc<PgPool>,
}

impl AccountStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn get_pool_status(&self) -> Result<PoolStatus, AppError> {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        let active = size - idle;

        Ok(PoolStatus {
            total_connections: size,
            active_connections: active,
            idle_connections: idle,
        })
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        Ok(self.pool.as_ref().begin().await?)
    }

    async fn create_account_with_transaction(
        &self,
        account: &Account,
        transaction: &mut Transaction<'_, Postgres>,
    ) -> Result<Account, AppError> {
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts
                (id, email, first_name, last_name, password_hash, role,
                 is_verified, verification_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_verified)
        .bind(&account.verification_token)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(created)
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn get_university_profile(
        &self,
        account_id: Uuid,
    ) -> Result<Option<UniversityProfile>, AppError> {
        let profile = sqlx::query_as::<_, UniversityProfile>(
            "SELECT * FROM university_profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(profile)
    }

    pub async fn upsert_university_profile(
        &self,
        profile: &UniversityProfile,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO university_profiles
                (account_id, institution_name, office_name, country,
                 therapeutic_focus_tags, trl_range_interest)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (account_id) DO UPDATE SET
                institution_name = EXCLUDED.institution_name,
                office_name = EXCLUDED.office_name,
                country = EXCLUDED.country,
                therapeutic_focus_tags = EXCLUDED.therapeutic_focus_tags,
                trl_range_interest = EXCLUDED.trl_range_interest
            "#,
        )
        .bind(profile.account_id)
        .bind(&profile.institution_name)
        .bind(&profile.office_name)
        .bind(&profile.country)
        .bind(&profile.therapeutic_focus_tags)
        .bind(&profile.trl_range_interest)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    pub async fn get_company_profile(
        &self,
        account_id: Uuid,
    ) -> Result<Option<CompanyProfile>, AppError> {
        let profile = sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(profile)
    }

    pub async fn upsert_company_profile(&self, profile: &CompanyProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO company_profiles (account_id, company_name, focus_areas)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id) DO UPDATE SET
                company_name = EXCLUDED.company_name,
                focus_areas = EXCLUDED.focus_areas
            "#,
        )
        .bind(profile.account_id)
        .bind(&profile.company_name)
        .bind(&profile.focus_areas)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    pub async fn get_investor_profile(
        &self,
        account_id: Uuid,
    ) -> Result<Option<InvestorProfile>, AppError> {
        let profile = sqlx::query_as::<_, InvestorProfile>(
            "SELECT * FROM investor_profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(profile)
    }

    pub async fn upsert_investor_profile(&self, profile: &InvestorProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO investor_profiles
                (account_id, fund_name, stages, ticket_size, therapeutic_areas, geography)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (account_id) DO UPDATE SET
                fund_name = EXCLUDED.fund_name,
                stages = EXCLUDED.stages,
                ticket_size = EXCLUDED.ticket_size,
                therapeutic_areas = EXCLUDED.therapeutic_areas,
                geography = EXCLUDED.geography
            "#,
        )
        .bind(profile.account_id)
        .bind(&profile.fund_name)
        .bind(&profile.stages)
        .bind(&profile.ticket_size)
        .bind(&profile.therapeutic_areas)
        .bind(&profile.geography)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AccountRepo for AccountStore {
    async fn create_registration(&self, account: &Account) -> Result<Account, AppError> {
        let mut transaction = self.begin_transaction().await?;

        let result = self
            .create_account_with_transaction(account, &mut transaction)
            .await;

        let created = match result {
            Ok(created) => created,
            Err(e) => {
                transaction.rollback().await?;
                return Err(match e {
                    AppError::DatabaseError(DatabaseError::Duplicate) => {
                        AppError::AccountError(AccountError::DuplicateEmail)
                    }
                    other => other,
                });
            }
        };

        let profile_result = match account.role {
            Role::University => {
                sqlx::query("INSERT INTO university_profiles (account_id) VALUES ($1)")
                    .bind(account.id)
                    .execute(&mut *transaction)
                    .await
            }
            Role::Company => {
                sqlx::query("INSERT INTO company_profiles (account_id) VALUES ($1)")
                    .bind(account.id)
                    .execute(&mut *transaction)
                    .await
            }
            Role::Investor => {
                sqlx::query("INSERT INTO investor_profiles (account_id) VALUES ($1)")
                    .bind(account.id)
                    .execute(&mut *transaction)
                    .await
            }
        };

        match profile_result {
            Ok(_) => {
                transaction.commit().await?;
                Ok(created)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(account)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        let account =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE verification_token = $1")
                .bind(token)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(account)
    }

    async fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(account)
    }

    async fn set_verification_token(&self, account_id: Uuid, token: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE accounts SET verification_token = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(token)
        .bind(Utc::now())
        .bind(account_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn mark_verified(&self, account_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET is_verified = TRUE, verification_token = NULL, updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(account_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn record_login(&self, account_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET last_login = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(account_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create_session(&self, session: &Session) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, account_id, token, expires_at, created_at, last_activity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(session.id)
        .bind(session.account_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.last_activity)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(session)
    }

    async fn update_session_activity(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET last_activity = $1 WHERE token = $2")
            .bind(Utc::now())
            .bind(token)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}
