use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::{config::IdentityConfig, error::AppError};

/// Claims extracted from a verified identity-provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub picture: String,
    pub audience: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    aud: String,
}

/// Verifies HS256 identity tokens issued for the configured audience.
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let decoded = decode::<ProviderClaims>(token, &self.key, &self.validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "identity token rejected");
                AppError::Unauthorized("Invalid identity token".into())
            })?;
        let claims = decoded.claims;

        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("Identity token has no email".into()))?;

        Ok(VerifiedIdentity {
            subject_id: claims.sub,
            display_name: claims.name.unwrap_or_default(),
            picture: claims.picture.unwrap_or_default(),
            email,
            audience: claims.aud,
        })
    }
}
