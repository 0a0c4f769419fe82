//! Token Codec
//!
//! HS256 JWTs for the two bearer credentials:
//! - access token: short-lived, carries `sub`, `role` and `email`
//! - refresh token: long-lived, carries only `sub`
//!
//! Each kind has its own secret. Both share issuer and audience, and both
//! carry a random `jti` so that two tokens minted in the same second differ.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub role: UserRole,
    pub email: String,
    pub typ: TokenType,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub typ: TokenType,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A freshly signed token and the instant it stops verifying
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl: std::time::Duration, issuer: &str, audience: &str) -> AuthResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;

        let ttl = Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(format!("Token lifetime out of range: {e}")))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        Ok(Self {
            access: KeyPair::new(
                &config.access_secret,
                config.access_ttl,
                &config.issuer,
                &config.audience,
            )?,
            refresh: KeyPair::new(
                &config.refresh_secret,
                config.refresh_ttl,
                &config.issuer,
                &config.audience,
            )?,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn issue_access(
        &self,
        user_id: UserId,
        role: UserRole,
        email: &Email,
    ) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.access.ttl;

        let claims = AccessClaims {
            sub: user_id,
            role,
            email: email.as_str().to_string(),
            typ: TokenType::Access,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access.encoding)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to encode access token");
                AuthError::Internal("Failed to sign access token".to_string())
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn issue_refresh(&self, user_id: UserId) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.refresh.ttl;

        let claims = RefreshClaims {
            sub: user_id,
            typ: TokenType::Refresh,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh.encoding)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to encode refresh token");
                AuthError::Internal("Failed to sign refresh token".to_string())
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify_access(&self, token: &str) -> AuthResult<AccessClaims> {
        let claims: AccessClaims = verify(token, &self.access)?;
        if claims.typ != TokenType::Access {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        let claims: RefreshClaims = verify(token, &self.refresh)?;
        if claims.typ != TokenType::Refresh {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }
}

fn verify<T>(token: &str, keys: &KeyPair) -> AuthResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    decode::<T>(token, &keys.decoding, &keys.validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> (TokenCodec, AuthConfig) {
        let config = AuthConfig::development();
        (TokenCodec::new(&config).unwrap(), config)
    }

    fn email() -> Email {
        Email::new("a@x.com").unwrap()
    }

    #[test]
    fn test_access_round_trip() {
        let (codec, _) = codec();
        let user_id = UserId::new();

        let issued = codec
            .issue_access(user_id, UserRole::HrManager, &email())
            .unwrap();
        let claims = codec.verify_access(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::HrManager);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, "hrms-api");
        assert_eq!(claims.aud, "hrms-client");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_carries_subject_only() {
        let (codec, _) = codec();
        let user_id = UserId::new();

        let issued = codec.issue_refresh(user_id).unwrap();
        let claims = codec.verify_refresh(&issued.token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let (codec, _) = codec();
        let user_id = UserId::new();
        let a = codec.issue_refresh(user_id).unwrap();
        let b = codec.issue_refresh(user_id).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let (codec, _) = codec();
        let user_id = UserId::new();

        let access = codec.issue_access(user_id, UserRole::Employee, &email()).unwrap();
        let refresh = codec.issue_refresh(user_id).unwrap();

        assert!(matches!(
            codec.verify_refresh(&access.token),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            codec.verify_access(&refresh.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_foreign_secret_is_invalid() {
        let (other, _) = codec();
        let (verifier, _) = codec();
        let issued = other.issue_refresh(UserId::new()).unwrap();
        assert!(matches!(
            verifier.verify_refresh(&issued.token),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            verifier.verify_refresh("not.a.jwt"),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_expired_token() {
        let (codec, config) = codec();
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: UserId::new(),
            typ: TokenType::Refresh,
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now - 120,
            exp: now - 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            codec.verify_refresh(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_audience_is_invalid() {
        let (codec, config) = codec();
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: UserId::new(),
            typ: TokenType::Refresh,
            iss: config.issuer.clone(),
            aud: "someone-else".to_string(),
            iat: now,
            exp: now + 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            codec.verify_refresh(&token),
            Err(AuthError::TokenInvalid)
        ));
    }
}
