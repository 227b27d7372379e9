//! JWT issuance and verification, producing and consuming
//! [`sentinel_core::rbac::Principal`].
//!
//! Claims are intentionally minimal: the token is a bearer credential for a
//! fixed role, not a general-purpose claims bag.

use chrono::{Duration, Utc};
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{Role, User};
use sentinel_core::rbac::Principal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT signing configuration. Exactly one HMAC secret; asymmetric
/// algorithms are out of scope for the fixed three-role model.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, access_token_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            access_token_ttl,
        }
    }

    /// Build from the loaded [`sentinel_core::config::AuthConfig`].
    pub fn from_auth_config(cfg: &sentinel_core::config::AuthConfig, issuer: impl Into<String>) -> SentinelResult<Self> {
        let secret = cfg
            .jwt_secret
            .clone()
            .ok_or_else(|| SentinelError::fatal("auth.jwt_secret is not configured"))?;
        Ok(Self::new(secret, issuer, Duration::seconds(cfg.jwt_ttl_secs as i64)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    supervisor_id: Option<Uuid>,
    iss: String,
    iat: i64,
    exp: i64,
}

/// Sign an access token for `user`, embedding their role and supervisor so
/// RBAC checks never need a database round-trip per request.
pub fn issue_token(config: &JwtConfig, user: &User) -> SentinelResult<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        role: user.role,
        supervisor_id: user.supervisor_id,
        iss: config.issuer.clone(),
        iat: now.timestamp(),
        exp: (now + config.access_token_ttl).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(config.secret.as_bytes()))
        .map_err(|e| SentinelError::fatal(format!("failed to sign access token: {e}")))
}

/// Verify a bearer token and recover the [`Principal`] it authenticates.
pub fn verify_token(config: &JwtConfig, token: &str) -> SentinelResult<Principal> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);

    let decoded = decode::<Claims>(token, &DecodingKey::from_secret(config.secret.as_bytes()), &validation)
        .map_err(|e| SentinelError::authorization(format!("invalid or expired token: {e}")))?;

    Ok(Principal::new(decoded.claims.sub, decoded.claims.role, decoded.claims.supervisor_id))
}

/// Parse a `Bearer <token>` value out of an `Authorization` header.
pub fn extract_bearer_token(authorization_header: Option<&str>) -> Option<&str> {
    let header = authorization_header?;
    let rest = header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer "))?;
    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret-at-least-this-long", "sentinel-ai-test", Duration::hours(1))
    }

    fn user(role: Role, supervisor_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "analyst@example.com".to_string(),
            password_hash: "unused".to_string(),
            role,
            supervisor_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_verify_roundtrips_identity_and_role() {
        let cfg = config();
        let supervisor = Uuid::new_v4();
        let u = user(Role::Analyst, Some(supervisor));

        let token = issue_token(&cfg, &u).unwrap();
        let principal = verify_token(&cfg, &token).unwrap();

        assert_eq!(principal.user_id, u.id);
        assert_eq!(principal.role, Role::Analyst);
        assert_eq!(principal.supervisor_id, Some(supervisor));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cfg = config();
        let u = user(Role::Admin, None);
        let token = issue_token(&cfg, &u).unwrap();

        let wrong_cfg = JwtConfig::new("a-completely-different-secret", "sentinel-ai-test", Duration::hours(1));
        assert!(verify_token(&wrong_cfg, &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = JwtConfig::new("test-secret-at-least-this-long", "sentinel-ai-test", Duration::seconds(-1));
        let u = user(Role::Manager, None);
        let token = issue_token(&cfg, &u).unwrap();

        assert!(verify_token(&cfg, &token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let cfg = config();
        let u = user(Role::Admin, None);
        let token = issue_token(&cfg, &u).unwrap();

        let other_cfg = JwtConfig::new("test-secret-at-least-this-long", "someone-else", Duration::hours(1));
        assert!(verify_token(&other_cfg, &token).is_err());
    }

    #[test]
    fn extract_bearer_token_parses_header() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token(Some("bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token(Some("Basic abc")), None);
        assert_eq!(extract_bearer_token(None), None);
        assert_eq!(extract_bearer_token(Some("Bearer ")), None);
    }
}
