//! # ss-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `ss-core` domain models, and translates compiled queries
//! into SQL conditions.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use ss_core::filter::{CompiledQuery, Condition};
use ss_core::models::{Review, SessionIdentity, User};
use ss_core::traits::ReviewRepo;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          BLOB PRIMARY KEY,
    provider_id TEXT NOT NULL UNIQUE,
    name        TEXT,
    email       TEXT,
    image       TEXT,
    dark_mode   INTEGER NOT NULL DEFAULT 0,
    anonymous   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS reviews (
    id             BLOB PRIMARY KEY,
    user_id        BLOB NOT NULL REFERENCES users(id),
    location       TEXT NOT NULL,
    rating         INTEGER NOT NULL,
    content        TEXT NOT NULL,
    images         TEXT,
    anonymous      INTEGER NOT NULL DEFAULT 0,
    dynamic_fields TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews(created_at);
"#;

const REVIEW_USER_SELECT: &str = "SELECT r.id, r.user_id, r.location, r.rating, r.content, \
     r.images, r.anonymous, r.dynamic_fields, r.created_at, r.updated_at, \
     u.id AS u_id, u.provider_id AS u_provider_id, u.name AS u_name, u.email AS u_email, \
     u.image AS u_image, u.dark_mode AS u_dark_mode, u.anonymous AS u_anonymous, \
     u.created_at AS u_created_at, u.updated_at AS u_updated_at \
     FROM reviews r JOIN users u ON u.id = r.user_id";

pub struct SqliteReviewRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn review_from_row(row: &SqliteRow) -> Review {
    Review {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        user_id: blob_to_uuid(row.get::<Vec<u8>, _>("user_id").as_slice()),
        location: row.get("location"),
        rating: row.get("rating"),
        content: row.get("content"),
        images: row.get("images"),
        anonymous: row.get("anonymous"),
        dynamic_fields: row.get("dynamic_fields"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn user_from_joined_row(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("u_id").as_slice()),
        provider_id: row.get("u_provider_id"),
        name: row.get("u_name"),
        email: row.get("u_email"),
        image: row.get("u_image"),
        dark_mode: row.get("u_dark_mode"),
        anonymous: row.get("u_anonymous"),
        created_at: row.get("u_created_at"),
        updated_at: row.get("u_updated_at"),
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        provider_id: row.get("provider_id"),
        name: row.get("name"),
        email: row.get("email"),
        image: row.get("image"),
        dark_mode: row.get("dark_mode"),
        anonymous: row.get("anonymous"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Translates one compiled condition into a SQL fragment. The needles are
/// already lowercased by the compiler; `lower()` on the column keeps the
/// comparison case-insensitive regardless of SQLite's LIKE configuration.
fn condition_sql(condition: &Condition) -> &'static str {
    match condition {
        Condition::LocationContains(_) => "instr(lower(r.location), ?) > 0",
        Condition::LocationOrContentContains(_) => {
            "(instr(lower(r.location), ?) > 0 OR instr(lower(r.content), ?) > 0)"
        }
        Condition::RatingAtLeast(_) => "r.rating >= ?",
    }
}

impl SqliteReviewRepo {
    /// Connects and bootstraps the schema.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory SQLite database exists per connection, so the pool
        // must not hand out more than one.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        log::info!("sqlite schema ready at {}", database_url);
        Ok(Self { pool })
    }
}

#[async_trait]
impl ReviewRepo for SqliteReviewRepo {
    /// Applies the compiled query as a SQL WHERE clause, newest first.
    async fn list_reviews(&self, query: &CompiledQuery) -> anyhow::Result<Vec<(Review, User)>> {
        let mut sql = String::from(REVIEW_USER_SELECT);
        if !query.is_empty() {
            let clauses: Vec<_> = query.conditions().iter().map(condition_sql).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY r.created_at DESC");

        let mut q = sqlx::query(&sql);
        for condition in query.conditions() {
            q = match condition {
                Condition::LocationContains(needle) => q.bind(needle.as_str()),
                Condition::LocationOrContentContains(needle) => {
                    q.bind(needle.as_str()).bind(needle.as_str())
                }
                Condition::RatingAtLeast(min) => q.bind(*min),
            };
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| (review_from_row(row), user_from_joined_row(row)))
            .collect())
    }

    async fn get_review(&self, id: Uuid) -> anyhow::Result<Option<(Review, User)>> {
        let sql = format!("{REVIEW_USER_SELECT} WHERE r.id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| (review_from_row(&row), user_from_joined_row(&row))))
    }

    async fn create_review(&self, review: Review) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO reviews (id, user_id, location, rating, content, images, anonymous, dynamic_fields, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(review.id))
        .bind(uuid_to_blob(review.user_id))
        .bind(review.location)
        .bind(review.rating)
        .bind(review.content)
        .bind(review.images)
        .bind(review.anonymous)
        .bind(review.dynamic_fields)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_review(&self, review: Review) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE reviews SET location = ?, rating = ?, content = ?, images = ?, \
             anonymous = ?, dynamic_fields = ?, updated_at = ? WHERE id = ?",
        )
        .bind(review.location)
        .bind(review.rating)
        .bind(review.content)
        .bind(review.images)
        .bind(review.anonymous)
        .bind(review.dynamic_fields)
        .bind(review.updated_at)
        .bind(uuid_to_blob(review.id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_review(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert on first sign-in, re-sync name/email/image afterwards.
    /// `provider_id` is the conflict key; preferences are never clobbered.
    async fn upsert_user(&self, identity: &SessionIdentity) -> anyhow::Result<User> {
        let now = Utc::now();
        let name = identity.name.clone().unwrap_or_else(|| "Unknown".to_string());
        let email = identity.email_or_placeholder();

        sqlx::query(
            "INSERT INTO users (id, provider_id, name, email, image, dark_mode, anonymous, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?) \
             ON CONFLICT(provider_id) DO UPDATE SET \
               name = excluded.name, email = excluded.email, image = excluded.image, \
               updated_at = excluded.updated_at",
        )
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind(identity.provider_id.as_str())
        .bind(name)
        .bind(email)
        .bind(identity.picture.clone())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM users WHERE provider_id = ?")
            .bind(identity.provider_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(user_from_row(&row))
    }

    async fn find_user_by_provider_id(&self, provider_id: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE provider_id = ?")
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn set_user_anonymous(&self, user_id: Uuid, anonymous: bool) -> anyhow::Result<Option<User>> {
        sqlx::query("UPDATE users SET anonymous = ?, updated_at = ? WHERE id = ?")
            .bind(anonymous)
            .bind(Utc::now())
            .bind(uuid_to_blob(user_id))
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(user_id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn recent_reviews_by_user(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT * FROM reviews WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(uuid_to_blob(user_id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(review_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ss_core::filter::{compile, RawFilters};

    async fn repo() -> SqliteReviewRepo {
        SqliteReviewRepo::new("sqlite::memory:").await.unwrap()
    }

    fn identity(provider_id: &str, name: &str) -> SessionIdentity {
        SessionIdentity {
            provider_id: provider_id.into(),
            name: Some(name.into()),
            email: Some(format!("{provider_id}@example.com")),
            picture: None,
        }
    }

    fn review(author: &User, location: &str, rating: i64, created_at: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::now_v7(),
            user_id: author.id,
            location: location.into(),
            rating,
            content: "Long enough review content.".into(),
            images: None,
            anonymous: false,
            dynamic_fields: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn raw(state: Option<&str>, rating: Option<&str>) -> RawFilters {
        RawFilters {
            state: state.map(String::from),
            rating: rating.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_resyncs() {
        let repo = repo().await;

        let first = repo.upsert_user(&identity("kp_1", "Old Name")).await.unwrap();
        assert_eq!(first.name.as_deref(), Some("Old Name"));

        let second = repo.upsert_user(&identity("kp_1", "New Name")).await.unwrap();
        assert_eq!(second.id, first.id, "same account, not a new row");
        assert_eq!(second.name.as_deref(), Some("New Name"));
    }

    #[tokio::test]
    async fn upsert_without_email_uses_placeholder() {
        let repo = repo().await;
        let user = repo
            .upsert_user(&SessionIdentity {
                provider_id: "kp_2".into(),
                name: None,
                email: None,
                picture: None,
            })
            .await
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("kp_2@placeholder.com"));
        assert_eq!(user.name.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn list_translates_conditions_and_orders_desc() {
        let repo = repo().await;
        let author = repo.upsert_user(&identity("kp_3", "Casey")).await.unwrap();

        let base = Utc::now();
        let ontario = review(&author, "500 Queen St, Ontario, Canada, M5V2T6", 8, base);
        let quebec = review(
            &author,
            "10 Rue Ste-Catherine, Quebec, Canada, H3B1A1",
            5,
            base - chrono::Duration::minutes(5),
        );
        repo.create_review(ontario.clone()).await.unwrap();
        repo.create_review(quebec.clone()).await.unwrap();

        // No filters: everything, newest first.
        let all = repo.list_reviews(&CompiledQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0.id, ontario.id);

        // Region code resolves to the label before hitting SQL.
        let by_region = repo.list_reviews(&compile(&raw(Some("ON"), None))).await.unwrap();
        assert_eq!(by_region.len(), 1);
        assert_eq!(by_region[0].0.id, ontario.id);

        // Rating threshold.
        let by_rating = repo.list_reviews(&compile(&raw(None, Some("6")))).await.unwrap();
        assert_eq!(by_rating.len(), 1);
        assert_eq!(by_rating[0].0.rating, 8);

        // Free text ORs across location and content.
        let by_text = repo
            .list_reviews(&compile(&RawFilters {
                filter: Some("STE-CATHERINE".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].0.id, quebec.id);
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let repo = repo().await;
        let author = repo.upsert_user(&identity("kp_4", "Sam")).await.unwrap();
        let mut stored = review(&author, "1 Main St, Ontario, Canada, A1A1A1", 4, Utc::now());
        repo.create_review(stored.clone()).await.unwrap();

        stored.rating = 9;
        stored.content = "Revised review content.".into();
        repo.update_review(stored.clone()).await.unwrap();

        let (fetched, fetched_author) = repo.get_review(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.rating, 9);
        assert_eq!(fetched_author.id, author.id);

        repo.delete_review(stored.id).await.unwrap();
        assert!(repo.get_review(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn anonymity_preference_survives_resync() {
        let repo = repo().await;
        let user = repo.upsert_user(&identity("kp_5", "Riley")).await.unwrap();
        assert!(!user.anonymous);

        let updated = repo.set_user_anonymous(user.id, true).await.unwrap().unwrap();
        assert!(updated.anonymous);

        // A later sign-in re-sync must not clobber the preference.
        let resynced = repo.upsert_user(&identity("kp_5", "Riley R.")).await.unwrap();
        assert!(resynced.anonymous);
        assert_eq!(resynced.name.as_deref(), Some("Riley R."));
    }

    #[tokio::test]
    async fn recent_reviews_respect_limit() {
        let repo = repo().await;
        let author = repo.upsert_user(&identity("kp_6", "Drew")).await.unwrap();

        let base = Utc::now();
        for i in 0..5 {
            let r = review(
                &author,
                "1 Main St, Ontario, Canada, A1A1A1",
                5,
                base - chrono::Duration::minutes(i),
            );
            repo.create_review(r).await.unwrap();
        }

        let recent = repo.recent_reviews_by_user(author.id, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}
