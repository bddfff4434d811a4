//! JWT minting and verification (spec §4.6): HS256, `sub=superuser`.
//! Grounded directly on the Go `aaa/auth.go` adapter - same claims shape,
//! same login-failure semantics, same algorithm pinning.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::error::{AppError, AppResult};
use crate::models::{AuthSubject, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    exp: u64,
}

pub struct AuthService {
    hmac_secret: String,
    admin_user: String,
    admin_password: String,
    token_ttl_secs: u64,
}

impl AuthService {
    pub fn new(credentials: &Credentials, token_ttl_secs: u64) -> Self {
        Self {
            hmac_secret: credentials.hmac_secret.clone(),
            admin_user: credentials.admin_user.clone(),
            admin_password: credentials.admin_password.clone(),
            token_ttl_secs,
        }
    }

    /// Validate the supplied credentials and mint a bearer token. Any
    /// mismatch - unknown user or wrong password - is reported uniformly
    /// as `Unauthorized` (spec §4.6), never distinguishing which.
    pub fn login(&self, name: &str, password: &str) -> AppResult<String> {
        if name != self.admin_user || password != self.admin_password {
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }

        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + self.token_ttl_secs;

        let claims = Claims {
            sub: "superuser".to_string(),
            name: name.to_string(),
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.hmac_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verify a bearer token: must parse, be unexpired, use HS256, and
    /// carry `sub=superuser`. Any failure collapses to `Unauthorized`
    /// (spec §4.6) - callers never see which check failed.
    pub fn verify(&self, token: &str) -> AppResult<AuthSubject> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.hmac_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

        if data.claims.sub != "superuser" {
            return Err(AppError::Unauthorized("unrecognized subject".to_string()));
        }

        Ok(AuthSubject {
            name: data.claims.name,
            role: Role::Superuser,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            admin_user: "admin".to_string(),
            admin_password: "hunter2".to_string(),
            hmac_secret: "test-secret-key".to_string(),
        }
    }

    #[test]
    fn login_with_correct_credentials_yields_verifiable_token() {
        let auth = AuthService::new(&credentials(), 3600);
        let token = auth.login("admin", "hunter2").unwrap();
        assert!(!token.is_empty());
        let subject = auth.verify(&token).unwrap();
        assert_eq!(subject.name, "admin");
        assert_eq!(subject.role, Role::Superuser);
    }

    #[test]
    fn login_with_wrong_password_is_unauthorized() {
        let auth = AuthService::new(&credentials(), 3600);
        let err = auth.login("admin", "wrong").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn login_with_unknown_user_is_unauthorized() {
        let auth = AuthService::new(&credentials(), 3600);
        let err = auth.login("nobody", "hunter2").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn verify_rejects_garbage_token() {
        let auth = AuthService::new(&credentials(), 3600);
        let err = auth.verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let auth = AuthService::new(&credentials(), 0);
        let token = auth.login("admin", "hunter2").unwrap();
        std::thread::sleep(std::time::Duration::from_secs(2));
        let err = auth.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
