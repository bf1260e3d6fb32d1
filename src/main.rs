use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use innobridge_server::auth::handlers::{login, logout, register};
use innobridge_server::pages::publications::search_publications;
use innobridge_server::pages::{
    company_home, dashboard, get_profile, notifications, university_home, update_profile,
};
use innobridge_server::verify::handlers::{
    resend_verification, verification_pending, verify_email,
};
use innobridge_server::{health_check, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> innobridge_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!("Starting server at {}:{}", config.server.host, config.server.port);

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Periodic maintenance: expired login sessions and idle resend states
    let maintenance_state = state.clone();
    tokio::spawn(async move {
        loop {
            match maintenance_state.accounts.cleanup_expired_sessions().await {
                Ok(removed) if removed > 0 => info!("Removed {} expired sessions", removed),
                Ok(_) => {}
                Err(e) => warn!("Session cleanup failed: {}", e),
            }

            maintenance_state.resend.cleanup(chrono::Duration::hours(2)).await;

            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;

    let workers = config.server.workers as usize;
    let environment = config.environment.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if environment == "development" {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
        } else {
            Cors::default()
                .allowed_origin("https://app.innobridge.example")
                .allowed_methods(vec!["GET", "POST", "PUT"])
                .allowed_headers(vec!["Authorization", "Content-Type"])
                .supports_credentials()
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/logout", web::post().to(logout))
            .route("/email/verify/{token}", web::get().to(verify_email))
            .route("/email/verification-pending", web::get().to(verification_pending))
            .route("/email/resend", web::post().to(resend_verification))
            .route("/dashboard", web::get().to(dashboard))
            .route("/dashboard/university", web::get().to(university_home))
            .route("/dashboard/company", web::get().to(company_home))
            .route("/notifications", web::get().to(notifications))
            .route("/publications/search", web::get().to(search_publications))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
