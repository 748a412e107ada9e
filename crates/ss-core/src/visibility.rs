//! # Visibility Resolver
//!
//! Decides, per (review, viewer) pair, whether the author's identity is
//! redacted and what name/email are displayed. Pure and stateless: the same
//! four inputs always produce the same decision.

use uuid::Uuid;

use crate::models::{Review, User};

pub const ANONYMOUS_NAME: &str = "Anonymous User";
pub const ANONYMOUS_EMAIL: &str = "****@****.com";

/// Name shown when the identity provider never supplied one.
const FALLBACK_NAME: &str = "Unknown";

/// The redacted view of a review's author identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    /// Whether the placeholder identity is shown instead of the real one.
    pub hide_identity: bool,
    /// True whenever the review or its author is configured anonymous,
    /// regardless of who is looking. Lets an admin see that their bypass is
    /// a bypass, so redaction stays auditable rather than silent.
    pub flagged_anonymous: bool,
    pub display_name: String,
    pub display_email: String,
}

/// Computes the visibility decision.
///
/// Priority order: ownership and admin status both override anonymity for
/// display, but neither changes the stored flags — `flagged_anonymous`
/// still reports the configured state.
pub fn resolve(review: &Review, author: &User, viewer_id: Option<Uuid>, is_admin: bool) -> Visibility {
    let is_own = viewer_id == Some(review.user_id);
    let flagged_anonymous = review.anonymous || author.anonymous;
    let hide_identity = flagged_anonymous && !is_admin && !is_own;

    if hide_identity {
        Visibility {
            hide_identity,
            flagged_anonymous,
            display_name: ANONYMOUS_NAME.to_string(),
            display_email: ANONYMOUS_EMAIL.to_string(),
        }
    } else {
        Visibility {
            hide_identity,
            flagged_anonymous,
            display_name: author
                .name
                .clone()
                .unwrap_or_else(|| FALLBACK_NAME.to_string()),
            display_email: author
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@placeholder.com", author.provider_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn author(anonymous: bool) -> User {
        User {
            id: Uuid::now_v7(),
            provider_id: "kp_author".into(),
            name: Some("Jordan Reed".into()),
            email: Some("jordan@example.com".into()),
            image: None,
            dark_mode: false,
            anonymous,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn review_by(author: &User, anonymous: bool) -> Review {
        Review {
            id: Uuid::now_v7(),
            user_id: author.id,
            location: "500 Queen St, Ontario, Canada, M5V2T6".into(),
            rating: 8,
            content: "Quiet and clean.".into(),
            images: None,
            anonymous,
            dynamic_fields: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn default_redaction_for_third_parties() {
        let author = author(false);
        let review = review_by(&author, true);

        for viewer in [None, Some(Uuid::now_v7())] {
            let vis = resolve(&review, &author, viewer, false);
            assert!(vis.hide_identity);
            assert_eq!(vis.display_name, ANONYMOUS_NAME);
            assert_eq!(vis.display_email, ANONYMOUS_EMAIL);
        }
    }

    #[test]
    fn author_global_flag_propagates() {
        // The review itself is not anonymous, but the author's global
        // setting still hides their identity from third parties.
        let author = author(true);
        let review = review_by(&author, false);

        let vis = resolve(&review, &author, Some(Uuid::now_v7()), false);
        assert!(vis.hide_identity);
        assert!(vis.flagged_anonymous);
    }

    #[test]
    fn ownership_overrides_anonymity() {
        let author = author(false);
        let review = review_by(&author, true);

        let vis = resolve(&review, &author, Some(author.id), false);
        assert!(!vis.hide_identity);
        assert_eq!(vis.display_name, "Jordan Reed");
        assert_eq!(vis.display_email, "jordan@example.com");
        // The stored flag is untouched and still reported.
        assert!(vis.flagged_anonymous);
    }

    #[test]
    fn admin_sees_identity_but_flag_survives() {
        let author = author(false);
        let review = review_by(&author, true);

        let vis = resolve(&review, &author, Some(Uuid::now_v7()), true);
        assert!(!vis.hide_identity);
        assert_eq!(vis.display_name, "Jordan Reed");
        assert!(vis.flagged_anonymous, "admin bypass must stay auditable");
    }

    #[test]
    fn nothing_to_hide_for_public_reviews() {
        let author = author(false);
        let review = review_by(&author, false);

        let vis = resolve(&review, &author, None, false);
        assert!(!vis.hide_identity);
        assert!(!vis.flagged_anonymous);
        assert_eq!(vis.display_name, "Jordan Reed");
    }

    #[test]
    fn missing_profile_fields_fall_back() {
        let mut author = author(false);
        author.name = None;
        author.email = None;
        let review = review_by(&author, false);

        let vis = resolve(&review, &author, None, false);
        assert_eq!(vis.display_name, "Unknown");
        assert_eq!(vis.display_email, "kp_author@placeholder.com");
    }

    #[test]
    fn decision_is_deterministic() {
        let author = author(true);
        let review = review_by(&author, false);
        let viewer = Some(Uuid::now_v7());

        let first = resolve(&review, &author, viewer, false);
        let second = resolve(&review, &author, viewer, false);
        assert_eq!(first, second);
    }
}
