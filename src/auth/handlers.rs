use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::db::models::Role;
use crate::db::operations::AccountRepo;
use crate::error::{AccountError, AppError, AuthError};
use crate::verify::Delivery;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub verified: bool,
    pub redirect: String,
}

/// POST /register
///
/// Creates the unverified account, fires the verification email, and points
/// the client at the pending page. A failed delivery still succeeds; the
/// resend endpoint is the recovery path.
pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email);

    let account = match state
        .auth_service
        .register(
            &req.email,
            &req.first_name,
            &req.last_name,
            &req.password,
            req.role,
        )
        .await
    {
        Ok(account) => account,
        Err(AppError::AccountError(AccountError::DuplicateEmail)) => {
            info!("Registration rejected, duplicate email: {}", req.email);
            return Ok(HttpResponse::Conflict().json(serde_json::json!({
                "notice": "An account with this email already exists."
            })));
        }
        Err(AppError::ValidationError(message)) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "notice": message
            })));
        }
        Err(e) => {
            error!("Registration failed for email: {}: {}", req.email, e);
            return Err(e);
        }
    };

    let (_, delivery) = state.issuer.issue(&account).await?;
    let notice = match delivery {
        Delivery::Sent => "A verification email has been sent. Please check your inbox.",
        Delivery::Failed => {
            "Your account was created, but the verification email could not be sent. \
             You can request a resend from the pending page."
        }
    };

    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, "/email/verification-pending"))
        .json(serde_json::json!({ "notice": notice })))
}

/// POST /auth/login
///
/// Unverified accounts may log in but are pointed back at the pending page.
pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);
    let token = match state.auth_service.authenticate(&req.email, &req.password).await {
        Ok(token) => token,
        Err(e @ AppError::AuthError(AuthError::InvalidCredentials)) => {
            info!("Login failed for email: {}", req.email);
            return Err(e);
        }
        Err(e) => {
            error!("Login failed for email: {}: {}", req.email, e);
            return Err(e);
        }
    };

    // authenticate succeeded, so the account exists
    let account = state
        .accounts
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::AuthError(AuthError::InvalidCredentials))?;

    let redirect = if account.is_verified {
        "/dashboard".to_string()
    } else {
        "/email/verification-pending".to_string()
    };

    info!("Login successful for email: {}", req.email);
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        verified: account.is_verified,
        redirect,
    }))
}

/// POST /auth/logout
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req)
        .ok_or(AppError::AuthError(AuthError::Unauthorized))?;

    // Invalidate the token
    state.auth_service.invalidate_token(token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully logged out"
    })))
}

/// Extracts the bearer token from the Authorization header, if any.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
