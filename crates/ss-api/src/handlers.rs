//! # ss-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Every handler resolves the viewer (if any) from the session token, then
//! delegates to the core review operations.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use ss_core::error::AppError;
use ss_core::filter::RawFilters;
use ss_core::models::User;
use ss_core::reviews::{self, NewReview};
use ss_core::traits::{IdentityProvider, ReviewRepo};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn ReviewRepo>,
    pub identity: Box<dyn IdentityProvider>,
}

/// Actix-facing wrapper for the core error type (orphan rule keeps the
/// `ResponseError` impl out of ss-core).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(_, _) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Retrieval(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Registers the full API surface.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/reviews", web::get().to(list_reviews))
            .route("/reviews", web::post().to(create_review))
            .route("/reviews", web::put().to(update_review))
            .route("/reviews/{id}", web::delete().to(delete_review))
            .route("/user", web::get().to(current_user))
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::put().to(put_settings))
            .route("/auth/check", web::get().to(auth_check)),
    );
}

/// Pulls the session token from the Authorization header (Bearer) or the
/// `session` cookie.
fn session_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| req.cookie("session").map(|c| c.value().to_string()))
}

/// Resolves the viewer, touching the account on the way (create-or-update
/// on sign-in). Returns the stored user plus their admin status.
async fn viewer(state: &AppState, req: &HttpRequest) -> Result<Option<(User, bool)>, ApiError> {
    let Some(token) = session_token(req) else {
        return Ok(None);
    };

    let Some(identity) = state
        .identity
        .resolve_session(&token)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    else {
        return Ok(None);
    };

    let user = state
        .repo
        .upsert_user(&identity)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let is_admin = user
        .email
        .as_deref()
        .map(|email| state.identity.is_admin(email))
        .unwrap_or(false);

    Ok(Some((user, is_admin)))
}

/// Same as [`viewer`], but unauthenticated requests are rejected.
async fn require_viewer(state: &AppState, req: &HttpRequest) -> Result<(User, bool), ApiError> {
    viewer(state, req)
        .await?
        .ok_or_else(|| ApiError(AppError::Unauthorized("authentication required".into())))
}

/// GET /api/reviews — filtered, redacted review listing, newest first.
async fn list_reviews(
    state: web::Data<AppState>,
    req: HttpRequest,
    filters: web::Query<RawFilters>,
) -> Result<HttpResponse, ApiError> {
    let session = viewer(&state, &req).await?;
    let (user, is_admin) = match &session {
        Some((user, is_admin)) => (Some(user), *is_admin),
        None => (None, false),
    };

    let views = reviews::list_reviews(state.repo.as_ref(), &filters, user, is_admin).await?;
    Ok(HttpResponse::Ok().json(views))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewBody {
    /// Required for PUT, ignored for POST.
    id: Option<Uuid>,
    location: String,
    rating: i64,
    content: String,
    images: Option<String>,
    anonymous: Option<bool>,
    dynamic_fields: Option<String>,
}

impl ReviewBody {
    fn into_new_review(self) -> NewReview {
        NewReview {
            location: self.location,
            rating: self.rating,
            content: self.content,
            images: self.images,
            anonymous: self.anonymous,
            dynamic_fields: self.dynamic_fields,
        }
    }
}

/// POST /api/reviews — submit a review as the authenticated user.
async fn create_review(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ReviewBody>,
) -> Result<HttpResponse, ApiError> {
    let (user, _) = require_viewer(&state, &req).await?;
    let review =
        reviews::create_review(state.repo.as_ref(), &user, body.into_inner().into_new_review())
            .await?;
    Ok(HttpResponse::Ok().json(review))
}

/// PUT /api/reviews — author-only full rewrite.
async fn update_review(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ReviewBody>,
) -> Result<HttpResponse, ApiError> {
    let (user, _) = require_viewer(&state, &req).await?;
    let body = body.into_inner();
    let id = body
        .id
        .ok_or_else(|| ApiError(AppError::Validation("review id is required".into())))?;

    let review =
        reviews::update_review(state.repo.as_ref(), &user, id, body.into_new_review()).await?;
    Ok(HttpResponse::Ok().json(review))
}

/// DELETE /api/reviews/{id} — author or admin, hard delete.
async fn delete_review(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let (user, is_admin) = require_viewer(&state, &req).await?;
    reviews::delete_review(state.repo.as_ref(), &user, is_admin, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Review deleted successfully" })))
}

/// GET /api/user — the synced account plus its three most recent reviews.
async fn current_user(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let (user, _) = require_viewer(&state, &req).await?;
    let recent = state
        .repo
        .recent_reviews_by_user(user.id, 3)
        .await
        .map_err(|e| AppError::Retrieval(e.to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "user": user, "reviews": recent })))
}

/// GET /api/settings — theme and anonymity preferences.
async fn get_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let (user, _) = require_viewer(&state, &req).await?;
    Ok(HttpResponse::Ok().json(json!({
        "darkMode": user.dark_mode,
        "anonymous": user.anonymous,
    })))
}

#[derive(Debug, Deserialize)]
struct SettingsBody {
    anonymous: bool,
}

/// PUT /api/settings — toggle the global anonymity preference.
async fn put_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SettingsBody>,
) -> Result<HttpResponse, ApiError> {
    let (user, _) = require_viewer(&state, &req).await?;
    let updated = state
        .repo
        .set_user_anonymous(user.id, body.anonymous)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError(AppError::NotFound("User".into(), user.id.to_string())))?;
    log::info!("user {} set anonymous={}", updated.id, updated.anonymous);
    Ok(HttpResponse::Ok().json(updated))
}

/// GET /api/auth/check — whether the request carries a valid session.
async fn auth_check(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let authenticated = viewer(&state, &req).await?.is_some();
    Ok(HttpResponse::Ok().json(json!({ "authenticated": authenticated })))
}
