use crate::error::IdentityError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims carried by callers of the admin API
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WardenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub username: String,
    /// Tenant the token was issued for
    pub domain: String,
    /// Role codes held in `domain`
    pub roles: Vec<String>,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

const AUDIENCE: &str = "warden-api";

impl JwtService {
    pub fn new(secret: &str, issuer: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
        }
    }

    pub fn issue_token(
        &self,
        subject: &str,
        username: &str,
        domain: &str,
        roles: &[String],
        ttl_minutes: i64,
    ) -> Result<String, IdentityError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(ttl_minutes);

        let claims = WardenClaims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: vec![AUDIENCE.to_string()],
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            domain: domain.to_string(),
            roles: roles.to_vec(),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| IdentityError::JwtIssueFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<WardenClaims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<WardenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| IdentityError::JwtValidationFailed(e.to_string()))?;
        if claims.domain.is_empty() {
            return Err(IdentityError::MissingDomain);
        }
        Ok(claims)
    }

    /// Validate the value of an `Authorization: Bearer ...` header
    pub fn validate_bearer(&self, header: Option<&str>) -> Result<WardenClaims, IdentityError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::MissingToken)?;
        self.validate_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-warden", "warden.local")
    }

    #[test]
    fn test_jwt_roundtrip() {
        let svc = service();
        let token = svc
            .issue_token(
                "user-123",
                "alice",
                "tenant-a",
                &["editor".to_string(), "viewer".to_string()],
                60,
            )
            .unwrap();

        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.domain, "tenant-a");
        assert_eq!(claims.roles, vec!["editor", "viewer"]);
    }

    #[test]
    fn test_token_from_other_issuer_is_rejected() {
        let token = JwtService::new("test-secret-key-warden", "someone-else")
            .issue_token("user-123", "alice", "tenant-a", &[], 60)
            .unwrap();
        assert!(matches!(
            service().validate_token(&token),
            Err(IdentityError::JwtValidationFailed(_))
        ));
    }

    #[test]
    fn test_token_without_domain_is_rejected() {
        let svc = service();
        let token = svc.issue_token("user-123", "alice", "", &[], 60).unwrap();
        assert!(matches!(
            svc.validate_token(&token),
            Err(IdentityError::MissingDomain)
        ));
    }

    #[test]
    fn test_bearer_header_parsing() {
        let svc = service();
        assert!(matches!(svc.validate_bearer(None), Err(IdentityError::MissingToken)));
        assert!(matches!(
            svc.validate_bearer(Some("Basic abc")),
            Err(IdentityError::MissingToken)
        ));

        let token = svc.issue_token("u1", "bob", "tenant-a", &[], 5).unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(svc.validate_bearer(Some(&header)).unwrap().sub, "u1");
    }
}
