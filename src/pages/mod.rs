//! Role dashboards, notifications, and profile endpoints.
//!
//! Dashboard payloads carry placeholder data until the matching ingest
//! services exist; the shapes are what the frontend binds to.

pub mod publications;

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::handlers::bearer_token;
use crate::db::models::{Account, CompanyProfile, InvestorProfile, Role, UniversityProfile};
use crate::error::{AppError, AuthError};
use crate::AppState;

async fn current_account(req: &HttpRequest, state: &AppState) -> Result<Account, AppError> {
    let token = bearer_token(req).ok_or(AppError::AuthError(AuthError::Unauthorized))?;
    state.auth_service.validate_token(token).await
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub field: Option<String>,
}

/// GET /dashboard
///
/// Routes each role to its home view; the match is exhaustive, so a new
/// role cannot be added without deciding where it lands.
pub async fn dashboard(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = current_account(&req, &state).await?;

    if !account.is_verified {
        return Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/email/verification-pending"))
            .finish());
    }

    match account.role {
        Role::University => Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/dashboard/university"))
            .finish()),
        Role::Company => Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/dashboard/company"))
            .finish()),
        Role::Investor => Ok(HttpResponse::Ok().json(json!({
            "role": "Investor",
            "display_name": account.display_name(),
        }))),
    }
}

/// GET /dashboard/university
pub async fn university_home(
    req: HttpRequest,
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = current_account(&req, &state).await?;
    if account.role != Role::University {
        return Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/dashboard"))
            .finish());
    }

    let funding_updates = json!([
        {
            "title": "New Grant for AI Research",
            "description": "The National Science Foundation has awarded a $5M grant for advancements in AI.",
            "date_posted": "2 days ago"
        },
        {
            "title": "Biotechnology Funding Initiative",
            "description": "A new initiative by PharmaCorp to fund biotech startups and university research.",
            "date_posted": "1 week ago"
        }
    ]);

    let research_projects = json!([
        { "title": "Quantum Computing Advancements", "field": "Physics", "status": "Ongoing" },
        { "title": "CRISPR Gene Editing Applications", "field": "Biology", "status": "Ongoing" },
        { "title": "Sustainable Urban Development", "field": "Architecture", "status": "Completed" }
    ]);

    let all_companies = [
        ("Tech Innovators Inc.", vec!["AI", "Machine Learning"]),
        ("BioHealth Corp.", vec!["Biotechnology", "Patents"]),
        ("GreenEnergy Solutions", vec!["Renewable Energy", "Research"]),
        ("QuantumLeap Computing", vec!["Quantum Computing", "Patents"]),
    ];

    let current_query = query.q.clone().unwrap_or_default();
    let needle = current_query.to_lowercase();
    let companies: Vec<_> = all_companies
        .iter()
        .filter(|(name, focus)| {
            needle.is_empty()
                || name.to_lowercase().contains(&needle)
                || focus.iter().any(|f| f.to_lowercase().contains(&needle))
        })
        .map(|(name, focus)| json!({ "name": name, "focus": focus }))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "university_name": account.display_name(),
        "funding_updates": funding_updates,
        "research_projects": research_projects,
        "companies": companies,
        "current_query": current_query,
    })))
}

/// GET /dashboard/company
pub async fn company_home(
    req: HttpRequest,
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = current_account(&req, &state).await?;
    if account.role != Role::Company {
        return Ok(HttpResponse::SeeOther()
            .insert_header((LOCATION, "/dashboard"))
            .finish());
    }

    let all_projects = [
        (1, "AI-Powered Chatbot for Customer Service", "Artificial Intelligence",
         "Developing a chatbot using natural language processing to enhance customer support experience."),
        (2, "Sustainable Energy Management System", "Renewable Energy",
         "A system to monitor and optimize energy consumption for commercial buildings using IoT."),
        (3, "Blockchain for Supply Chain Traceability", "Blockchain",
         "Implementing a decentralized ledger to track products from origin to consumer."),
        (4, "Personalized Learning Platform", "Education Technology",
         "An adaptive platform that customizes learning paths based on student performance and preferences."),
        (5, "Predictive Maintenance for Industrial Machinery", "Manufacturing",
         "Using machine learning to predict equipment failures and optimize maintenance schedules."),
        (6, "Smart City Traffic Management", "Urban Planning",
         "Developing an intelligent system to alleviate traffic congestion using real-time data."),
    ];

    let current_query = query.q.clone().unwrap_or_default();
    let current_field = query.field.clone().unwrap_or_default();
    let needle = current_query.to_lowercase();

    let projects: Vec<_> = all_projects
        .iter()
        .filter(|(_, title, field, description)| {
            (needle.is_empty()
                || title.to_lowercase().contains(&needle)
                || description.to_lowercase().contains(&needle))
                && (current_field.is_empty() || *field == current_field)
        })
        .map(|(id, title, field, description)| {
            json!({ "id": id, "title": title, "field": field, "description": description })
        })
        .collect();

    let mut available_fields: Vec<&str> = all_projects.iter().map(|(_, _, field, _)| *field).collect();
    available_fields.sort_unstable();
    available_fields.dedup();

    Ok(HttpResponse::Ok().json(json!({
        "projects": projects,
        "current_query": current_query,
        "current_field": current_field,
        "available_fields": available_fields,
    })))
}

/// GET /notifications
pub async fn notifications(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    current_account(&req, &state).await?;

    Ok(HttpResponse::Ok().json(json!({
        "current_notifications": [
            "Your profile was updated.",
            "You have a new message from Admin.",
        ],
        "previous_notifications": [
            "Your password was changed a week ago.",
            "Welcome to the platform!",
        ],
    })))
}

/// GET /profile — the role-specific profile row for the caller.
pub async fn get_profile(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = current_account(&req, &state).await?;

    let payload = match account.role {
        Role::University => {
            let profile = state
                .accounts
                .get_university_profile(account.id)
                .await?
                .unwrap_or_default();
            json!({ "role": "university", "profile": profile })
        }
        Role::Company => {
            let profile = state
                .accounts
                .get_company_profile(account.id)
                .await?
                .unwrap_or_default();
            json!({ "role": "company", "profile": profile })
        }
        Role::Investor => {
            let profile = state
                .accounts
                .get_investor_profile(account.id)
                .await?
                .unwrap_or_default();
            json!({ "role": "investor", "profile": profile })
        }
    };

    Ok(HttpResponse::Ok().json(payload))
}

/// PUT /profile — upserts the role-specific profile row. The body shape
/// follows the caller's role.
pub async fn update_profile(
    req: HttpRequest,
    body: web::Json<serde_json::Value>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let account = current_account(&req, &state).await?;
    let body = body.into_inner();

    match account.role {
        Role::University => {
            let mut profile: UniversityProfile = serde_json::from_value(body)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
            profile.account_id = account.id;
            state.accounts.upsert_university_profile(&profile).await?;
        }
        Role::Company => {
            let mut profile: CompanyProfile = serde_json::from_value(body)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
            profile.account_id = account.id;
            state.accounts.upsert_company_profile(&profile).await?;
        }
        Role::Investor => {
            let mut profile: InvestorProfile = serde_json::from_value(body)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
            profile.account_id = account.id;
            state.accounts.upsert_investor_profile(&profile).await?;
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "notice": "Profile updated."
    })))
}
