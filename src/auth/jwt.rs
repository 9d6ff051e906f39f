use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, error::ApiError, state::AppState};

use super::user::{Role, User};

/// Verified claims attached to a request. Trusted as-is for the request's
/// lifetime; a role change only takes effect on the next token issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    /// Role-membership gate. Pure predicate: runs after authentication,
    /// composable per route with different allowed sets.
    pub fn authorize(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            warn!(user_id = %self.sub, role = self.role.as_str(), "role not permitted");
            Err(ApiError::Forbidden("insufficient permissions"))
        }
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_in: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            expires_in: Duration::from_secs(config.expires_in_days as u64 * 24 * 60 * 60),
        }
    }

    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.expires_in.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Bearer-token extractor: rejects missing, malformed, expired and
/// signature-invalid tokens with 401 before the handler runs.
pub struct AuthClaims(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("invalid Authorization header"))?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("invalid or expired token")
        })?;

        Ok(AuthClaims(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "unit-test-secret".into(),
            expires_in_days: 7,
        })
    }

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Jane Doe".into(),
            email: "jane@x.edu".into(),
            password_hash: "hash".into(),
            role,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sign_and_verify_embeds_identity_and_role() {
        let keys = keys();
        let user = sample_user(Role::Staff);
        let token = keys.sign(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "jane@x.edu");
        assert_eq!(claims.role, Role::Staff);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "jane@x.edu".into(),
            role: Role::Staff,
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_token_signed_with_other_secret() {
        let other = JwtKeys::new(&JwtConfig {
            secret: "another-secret".into(),
            expires_in_days: 7,
        });
        let token = other.sign(&sample_user(Role::Admin)).expect("sign");
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn authorize_checks_role_membership() {
        let keys = keys();
        let admin = keys
            .verify(&keys.sign(&sample_user(Role::Admin)).unwrap())
            .unwrap();
        let staff = keys
            .verify(&keys.sign(&sample_user(Role::Staff)).unwrap())
            .unwrap();

        assert!(admin.authorize(&[Role::Admin]).is_ok());
        assert!(staff
            .authorize(&[Role::Admin, Role::InventoryManager, Role::Staff])
            .is_ok());
        assert!(matches!(
            staff.authorize(&[Role::Admin, Role::InventoryManager]),
            Err(ApiError::Forbidden(_))
        ));
    }
}
