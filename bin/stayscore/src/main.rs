//! # StayScore Binary
//!
//! The entry point that assembles the application based on compile-time
//! features.

use actix_web::{web, App, HttpServer};
use ss_api::{middleware, routes, AppState};

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use ss_db_sqlite::SqliteReviewRepo;

#[cfg(feature = "auth-simple")]
use ss_auth_simple::SimpleIdentityProvider;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url = env_or("STAYSCORE_DATABASE_URL", "sqlite:stayscore.db");
    let bind_addr = env_or("STAYSCORE_BIND", "127.0.0.1:8080");
    let session_secret = env_or("STAYSCORE_SESSION_SECRET", "dev-secret-change-me");
    let admin_emails = env_or("STAYSCORE_ADMIN_EMAILS", "");

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteReviewRepo::new(&database_url)
        .await
        .expect("Failed to init SQLite");

    // 2. Initialize Identity Implementation
    #[cfg(feature = "auth-simple")]
    let identity = SimpleIdentityProvider::new(&session_secret, &admin_emails);

    // 3. Wrap in AppState (dynamic dispatch keeps the plugins swappable)
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        identity: Box::new(identity),
    });

    log::info!("StayScore starting on http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .configure(routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
