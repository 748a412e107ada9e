//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::filter::CompiledQuery;
use crate::models::{Review, SessionIdentity, User};

/// Data persistence contract for reviews and accounts.
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    // Review Operations
    /// Reviews matching the compiled query, each paired with its author,
    /// ordered by creation time descending.
    async fn list_reviews(&self, query: &CompiledQuery) -> anyhow::Result<Vec<(Review, User)>>;
    async fn get_review(&self, id: Uuid) -> anyhow::Result<Option<(Review, User)>>;
    async fn create_review(&self, review: Review) -> anyhow::Result<()>;
    async fn update_review(&self, review: Review) -> anyhow::Result<()>;
    /// Hard delete; there are no tombstones.
    async fn delete_review(&self, id: Uuid) -> anyhow::Result<()>;

    // Account Operations
    /// Create-or-update on sign-in: inserts the account on first touch,
    /// re-syncs name/email on every later one. Keyed by provider id.
    async fn upsert_user(&self, identity: &SessionIdentity) -> anyhow::Result<User>;
    async fn find_user_by_provider_id(&self, provider_id: &str) -> anyhow::Result<Option<User>>;
    async fn set_user_anonymous(&self, user_id: Uuid, anonymous: bool) -> anyhow::Result<Option<User>>;
    async fn recent_reviews_by_user(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Review>>;
}

/// Identity and session contract. Authentication itself happens at a
/// third-party provider; this port only interprets its session material.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a session token into the provider's identity claims.
    /// Invalid or expired tokens resolve to `None`, not an error.
    async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<SessionIdentity>>;

    /// Whether the given account email is on the privileged allow-list.
    fn is_admin(&self, email: &str) -> bool;
}
