//! Session resolution from bearer tokens
//!
//! A token's `sub` is the user id and its `role` one of the three roles. Any
//! failure along the way resolves to [`NoSession`].

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{NoSession, Role, SessionContext, UserId};

/// Tokens never outlive one year
const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 3600;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// The user's role
    pub role: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token could not be signed: {0}")]
    Signing(String),
}

/// Issues a token for `user_id` acting as `role`
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `role` - User's role
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: UserId,
    role: Role,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let lifetime = i64::try_from(expiration_secs).unwrap_or(i64::MAX).min(MAX_TOKEN_LIFETIME_SECS);
    let exp = now + Duration::seconds(lifetime);

    let claims = Claims {
        sub: user_id.as_uuid().to_string(),
        role: role.as_str().to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, NoSession> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => NoSession::Expired,
        _ => NoSession::InvalidCredentials,
    })?;

    Ok(token_data.claims)
}

/// Resolves the value of an `Authorization` header into a session
pub fn resolve_session(header: Option<&str>, secret: &str) -> Result<SessionContext, NoSession> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(NoSession::MissingCredentials)?;

    let claims = validate_token(token, secret)?;
    let user_id = claims
        .sub
        .parse::<UserId>()
        .map_err(|_| NoSession::MalformedSubject(claims.sub.clone()))?;
    let role = claims.role.parse::<Role>()?;

    Ok(SessionContext::new(user_id, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issued_token_resolves_to_session() {
        let user = UserId::new();
        let token = create_token(user, Role::Coordinator, SECRET, 60).unwrap();
        let header = format!("Bearer {}", token);

        let session = resolve_session(Some(&header), SECRET).unwrap();
        assert_eq!(session, SessionContext::coordinator(user));
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert_eq!(resolve_session(None, SECRET), Err(NoSession::MissingCredentials));
        assert_eq!(resolve_session(Some("Basic abc"), SECRET), Err(NoSession::MissingCredentials));
        assert_eq!(resolve_session(Some("Bearer "), SECRET), Err(NoSession::MissingCredentials));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(UserId::new(), Role::Lecturer, SECRET, 60).unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(resolve_session(Some(&header), "other"), Err(NoSession::InvalidCredentials));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().as_uuid().to_string(),
            role: "lecturer".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(resolve_session(Some(&header), SECRET), Err(NoSession::Expired));
    }

    #[test]
    fn test_bad_subject_and_role() {
        let now = Utc::now().timestamp();
        let sign = |sub: &str, role: &str| {
            let claims = Claims { sub: sub.to_string(), role: role.to_string(), exp: now + 60, iat: now };
            let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
            format!("Bearer {}", token)
        };

        assert!(matches!(
            resolve_session(Some(&sign("not-a-uuid", "registry")), SECRET),
            Err(NoSession::MalformedSubject(_))
        ));
        let sub = UserId::new().as_uuid().to_string();
        assert!(matches!(
            resolve_session(Some(&sign(&sub, "admin")), SECRET),
            Err(NoSession::UnknownRole(_))
        ));
    }
}
