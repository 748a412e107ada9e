//! # Review Operations
//!
//! The composed read path (compile filters → query the store → resolve
//! visibility per row) and the validated write paths. The read path is the
//! only place a store failure crosses the core boundary, as the single
//! `AppError::Retrieval` kind with no partial results.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::filter::{compile, RawFilters};
use crate::location::parse_location;
use crate::models::{Review, User};
use crate::traits::ReviewRepo;
use crate::visibility;

/// A review as presented to a viewer: matched by the compiled query and
/// already passed through the visibility resolver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub location: String,
    pub rating: i64,
    pub content: String,
    pub images: Vec<String>,
    pub dynamic_fields: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<Utc>,
    pub display_name: String,
    pub display_email: String,
    pub hide_identity: bool,
    /// Audit indicator: the review or author is configured anonymous, even
    /// when an admin or the owner sees the real identity.
    pub flagged_anonymous: bool,
    pub is_own: bool,
}

/// The single read path: raw filters in, redacted reviews out, newest first.
pub async fn list_reviews(
    repo: &dyn ReviewRepo,
    raw: &RawFilters,
    viewer: Option<&User>,
    is_admin: bool,
) -> Result<Vec<ReviewView>> {
    let query = compile(raw);
    log::debug!("compiled {} filter condition(s)", query.conditions().len());

    let rows = repo
        .list_reviews(&query)
        .await
        .map_err(|e| AppError::Retrieval(e.to_string()))?;

    let viewer_id = viewer.map(|u| u.id);
    Ok(rows
        .into_iter()
        .map(|(review, author)| {
            let vis = visibility::resolve(&review, &author, viewer_id, is_admin);
            ReviewView {
                images: review.image_urls(),
                dynamic_fields: review.dynamic_fields_value(),
                is_own: viewer_id == Some(review.user_id),
                id: review.id,
                location: review.location,
                rating: review.rating,
                content: review.content,
                created_at: review.created_at,
                display_name: vis.display_name,
                display_email: vis.display_email,
                hide_identity: vis.hide_identity,
                flagged_anonymous: vis.flagged_anonymous,
            }
        })
        .collect())
}

/// Fields accepted when submitting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub location: String,
    pub rating: i64,
    pub content: String,
    pub images: Option<String>,
    /// Unspecified falls back to the author's global preference.
    pub anonymous: Option<bool>,
    pub dynamic_fields: Option<String>,
}

fn validate(location: &str, rating: i64, content: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(AppError::Validation("location must not be empty".into()));
    }
    if !(1..=10).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between 1 and 10, got {rating}"
        )));
    }
    if content.chars().count() < 10 {
        return Err(AppError::Validation(
            "content must be at least 10 characters".into(),
        ));
    }
    Ok(())
}

pub async fn create_review(
    repo: &dyn ReviewRepo,
    author: &User,
    new: NewReview,
) -> Result<Review> {
    validate(&new.location, new.rating, &new.content)?;

    let now = Utc::now();
    let review = Review {
        id: Uuid::now_v7(),
        user_id: author.id,
        location: new.location,
        rating: new.rating,
        content: new.content,
        images: new.images,
        anonymous: new.anonymous.unwrap_or(author.anonymous),
        dynamic_fields: new.dynamic_fields,
        created_at: now,
        updated_at: now,
    };

    repo.create_review(review.clone())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let parsed = parse_location(&review.location);
    log::info!(
        "review {} created by user {} (region {:?})",
        review.id,
        author.id,
        parsed.state
    );
    Ok(review)
}

/// Author-only full rewrite; last write wins, no audit trail.
pub async fn update_review(
    repo: &dyn ReviewRepo,
    author: &User,
    id: Uuid,
    new: NewReview,
) -> Result<Review> {
    validate(&new.location, new.rating, &new.content)?;

    let (existing, _) = repo
        .get_review(id)
        .await
        .map_err(|e| AppError::Retrieval(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Review".into(), id.to_string()))?;

    if existing.user_id != author.id {
        return Err(AppError::Unauthorized(
            "only the author may edit a review".into(),
        ));
    }

    let review = Review {
        location: new.location,
        rating: new.rating,
        content: new.content,
        images: new.images,
        anonymous: new.anonymous.unwrap_or(existing.anonymous),
        dynamic_fields: new.dynamic_fields,
        updated_at: Utc::now(),
        ..existing
    };

    repo.update_review(review.clone())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(review)
}

/// Hard delete by the author or an admin.
pub async fn delete_review(
    repo: &dyn ReviewRepo,
    viewer: &User,
    is_admin: bool,
    id: Uuid,
) -> Result<()> {
    let (existing, _) = repo
        .get_review(id)
        .await
        .map_err(|e| AppError::Retrieval(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Review".into(), id.to_string()))?;

    if existing.user_id != viewer.id && !is_admin {
        return Err(AppError::Unauthorized(
            "only the author or an admin may delete a review".into(),
        ));
    }

    repo.delete_review(id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    log::info!("review {} deleted by user {}", id, viewer.id);
    Ok(())
}
