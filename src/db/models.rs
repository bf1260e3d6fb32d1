use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of tenant roles. Registration and dashboard routing match on
/// this exhaustively, so adding a role is a compile-time checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    University,
    Company,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::University => "university",
            Role::Company => "company",
            Role::Investor => "investor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "university" => Ok(Role::University),
            "company" => Ok(Role::Company),
            "investor" => Ok(Role::Investor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    /// Present only while the account is unverified; cleared on redemption.
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(
        email: String,
        first_name: String,
        last_name: String,
        password_hash: String,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            first_name,
            last_name,
            password_hash,
            role,
            is_verified: false,
            verification_token: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

// The role column is stored as TEXT, so decode it by hand.
impl FromRow<'_, PgRow> for Account {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let role_str: String = row.try_get("role")?;
        let role = Role::from_str(&role_str).map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".into(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            password_hash: row.try_get("password_hash")?,
            role,
            is_verified: row.try_get("is_verified")?,
            verification_token: row.try_get("verification_token")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            last_login: row.try_get("last_login")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct UniversityProfile {
    #[serde(skip_deserializing)]
    pub account_id: Uuid,
    pub institution_name: String,
    pub office_name: String,
    pub country: String,
    /// Comma-separated tags, e.g. "Oncology, Neurology".
    pub therapeutic_focus_tags: String,
    /// e.g. "TRL 1-3, TRL 4-6".
    pub trl_range_interest: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct CompanyProfile {
    #[serde(skip_deserializing)]
    pub account_id: Uuid,
    pub company_name: String,
    pub focus_areas: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct InvestorProfile {
    #[serde(skip_deserializing)]
    pub account_id: Uuid,
    pub fund_name: String,
    pub stages: String,
    pub ticket_size: String,
    pub therapeutic_areas: String,
    pub geography: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub account_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(account_id: Uuid, token: String, expires_in_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            token,
            expires_at: now + chrono::Duration::hours(expires_in_hours),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
