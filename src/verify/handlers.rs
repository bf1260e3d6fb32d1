use actix_web::cookie::Cookie;
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::handlers::bearer_token;
use crate::db::operations::AccountRepo;
use crate::error::{AppError, VerifyError};
use crate::verify::{Delivery, RedeemOutcome};
use crate::AppState;

/// GET /email/verify/{token}
///
/// Redeems the token and bounces the user to the login page with a notice;
/// a bad token never surfaces as a raw error payload.
pub async fn verify_email(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = path.into_inner();

    match state.verifier.redeem(&token).await {
        Ok(RedeemOutcome::Verified) => Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/login?notice=verified"))
            .json(serde_json::json!({
                "notice": "Your email address has been successfully verified. You can now log in."
            }))),
        Ok(RedeemOutcome::AlreadyVerified) => Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/login?notice=already_verified"))
            .json(serde_json::json!({
                "notice": "Your email address has already been verified."
            }))),
        Err(AppError::VerifyError(VerifyError::InvalidToken)) => {
            warn!("Verification attempt with invalid token");
            Ok(HttpResponse::SeeOther()
                .insert_header((LOCATION, "/login?notice=invalid_token"))
                .json(serde_json::json!({
                    "notice": "Invalid verification link or token expired."
                })))
        }
        Err(e) => Err(e),
    }
}

/// GET /email/verification-pending
///
/// Pending-state payload; an authenticated, verified account is sent onward
/// to its dashboard.
pub async fn verification_pending(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(token) = bearer_token(&req) {
        if let Ok(account) = state.auth_service.validate_token(token).await {
            if account.is_verified {
                return Ok(HttpResponse::SeeOther()
                    .insert_header((LOCATION, "/dashboard"))
                    .finish());
            }
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "pending",
        "notice": "A verification email has been sent. Please check your inbox."
    })))
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// POST /email/resend
///
/// Session-throttled reissue of the verification email. Every outcome is a
/// 200 with a user-facing notice; the throttle state is keyed by the `sid`
/// cookie, so it resets with a new session.
pub async fn resend_verification(
    req: HttpRequest,
    body: web::Json<ResendRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let email = body.email.trim();
    if email.is_empty() {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "sent": false,
            "notice": "Email address is required to resend verification."
        })));
    }

    let session_id = session_id_from(&req);
    let sid_cookie = Cookie::build("sid", session_id.to_string())
        .path("/")
        .http_only(true)
        .finish();

    // The limiter only runs for accounts that exist and are unverified.
    let account = match state.accounts.find_by_email(email).await? {
        Some(account) if !account.is_verified => account,
        _ => {
            return Ok(HttpResponse::Ok().cookie(sid_cookie).json(serde_json::json!({
                "sent": false,
                "notice": "No unverified account found with that email address."
            })));
        }
    };

    if let Err(e) = state.resend.check(session_id).await {
        info!("Resend throttled for session {}: {}", session_id, e);
        let mut payload = serde_json::json!({
            "sent": false,
            "throttled": true,
            "notice": e.to_string(),
        });
        if let VerifyError::ResendTooSoon { wait_secs } = e {
            payload["wait_secs"] = serde_json::json!(wait_secs);
        }
        return Ok(HttpResponse::Ok().cookie(sid_cookie).json(payload));
    }

    let (_, delivery) = state.issuer.issue(&account).await?;
    state.resend.record(session_id).await;

    let notice = match delivery {
        Delivery::Sent => format!(
            "A new verification email has been sent to {}. Please check your inbox.",
            email
        ),
        Delivery::Failed => {
            "We could not send the verification email right now. Please try again later."
                .to_string()
        }
    };

    Ok(HttpResponse::Ok().cookie(sid_cookie).json(serde_json::json!({
        "sent": delivery == Delivery::Sent,
        "notice": notice,
    })))
}

/// Session id for the resend throttle: the `sid` cookie when present and
/// well formed, otherwise a fresh id that the response sets as a cookie.
fn session_id_from(req: &HttpRequest) -> Uuid {
    req.cookie("sid")
        .and_then(|c| Uuid::parse_str(c.value()).ok())
        .unwrap_or_else(Uuid::new_v4)
}
