//! # ss-auth-simple
//!
//! Token-based implementation of `IdentityProvider`. Authentication happens
//! at an external identity provider; this plugin only verifies the signed
//! session token it issued (HS256 shared secret) and answers admin checks
//! against a configured allow-list of privileged emails.

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use ss_core::models::SessionIdentity;
use ss_core::traits::IdentityProvider;

/// The claims we expect the identity provider to put in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider-side account id (`User::provider_id`).
    pub sub: String,
    pub given_name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub exp: i64,
}

pub struct SimpleIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    /// Lower-cased privileged emails.
    admin_emails: Vec<String>,
}

impl SimpleIdentityProvider {
    /// Accepts the shared secret (e.g., from an environment variable) and
    /// the comma-separated admin allow-list.
    pub fn new(secret: &str, admin_emails: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            admin_emails: admin_emails
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SimpleIdentityProvider {
    /// Decodes and verifies the session token. Anything wrong with it —
    /// bad signature, expired, malformed — resolves to `None` rather than
    /// an error, since an unauthenticated request is not a failure.
    async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<SessionIdentity>> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(Some(SessionIdentity {
                provider_id: data.claims.sub,
                name: data.claims.given_name,
                email: data.claims.email,
                picture: data.claims.picture,
            })),
            Err(e) => {
                log::debug!("session token rejected: {e}");
                Ok(None)
            }
        }
    }

    fn is_admin(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}
