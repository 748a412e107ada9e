//! # Domain Models
//!
//! These structs represent the core entities of StayScore.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated account. Accounts are lazily created (or name/email
/// re-synced) on every authenticated touch, keyed by `provider_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// External identity-provider id — the sole correlation key between a
    /// login session and a stored account.
    pub provider_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Avatar URL, if the provider supplied one.
    pub image: Option<String>,
    /// Theme preference.
    pub dark_mode: bool,
    /// Global default: hides this user's identity across all their reviews
    /// and pre-sets the anonymous flag on new reviews.
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-authored evaluation of a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Free-text composite, conventionally "address, region, country, postal
    /// code". Never strictly validated as structured.
    pub location: String,
    /// 1..=10 inclusive.
    pub rating: i64,
    pub content: String,
    /// Comma-separated image URLs, stored as one column.
    pub images: Option<String>,
    /// Per-review anonymity flag, set at creation.
    pub anonymous: bool,
    /// Arbitrary key/value metadata serialized as text; parsed lazily,
    /// never validated against a schema.
    pub dynamic_fields: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Splits the `images` column into individual URLs.
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Lazily parses `dynamic_fields` into a JSON value. Malformed blobs
    /// yield `None` rather than an error.
    pub fn dynamic_fields_value(&self) -> Option<serde_json::Value> {
        self.dynamic_fields
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// What the identity provider asserts about the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Identity-provider id (`User::provider_id`).
    pub provider_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl SessionIdentity {
    /// Email used when the provider omits one, so the account always has a
    /// stable (if synthetic) address.
    pub fn email_or_placeholder(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}@placeholder.com", self.provider_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_with(images: Option<&str>, dynamic: Option<&str>) -> Review {
        Review {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            location: "500 Queen St, Ontario, Canada, M5V2T6".into(),
            rating: 8,
            content: "Great spot to stay.".into(),
            images: images.map(String::from),
            anonymous: false,
            dynamic_fields: dynamic.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn image_urls_split_and_trim() {
        let review = review_with(Some("https://a/1.png, https://a/2.png ,"), None);
        assert_eq!(
            review.image_urls(),
            vec!["https://a/1.png".to_string(), "https://a/2.png".to_string()]
        );
        assert!(review_with(None, None).image_urls().is_empty());
    }

    #[test]
    fn dynamic_fields_parse_lazily() {
        let review = review_with(None, Some(r#"{"wifi": true, "floor": 3}"#));
        let value = review.dynamic_fields_value().unwrap();
        assert_eq!(value["floor"], 3);

        let broken = review_with(None, Some("{not json"));
        assert!(broken.dynamic_fields_value().is_none());
    }

    #[test]
    fn placeholder_email_derived_from_provider_id() {
        let identity = SessionIdentity {
            provider_id: "kp_123".into(),
            name: Some("Sam".into()),
            email: None,
            picture: None,
        };
        assert_eq!(identity.email_or_placeholder(), "kp_123@placeholder.com");
    }
}
