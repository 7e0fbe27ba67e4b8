use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::config::JwtConfig;

/// Strict verification failures. The lenient path (`validate`) collapses
/// both kinds into `false` so untrusted callers cannot tell them apart.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
}

/// Stateless HS256 signer/verifier for session and refresh tokens.
///
/// Built once from config at startup; holds no per-call state, so it is
/// safe to clone into every request and scales without shared session
/// storage. A token is valid through its `exp` second and rejected once
/// `now > exp` (leeway zero).
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    session_ttl: TimeDuration,
    refresh_ttl: TimeDuration,
}

impl TokenCodec {
    pub fn new(cfg: &JwtConfig) -> Self {
        let session_ttl = TimeDuration::milliseconds(cfg.ttl_ms);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            session_ttl,
            refresh_ttl: session_ttl * (cfg.refresh_multiplier as i32),
        }
    }

    fn issue_with_kind(
        &self,
        account_id: Uuid,
        kind: TokenKind,
    ) -> anyhow::Result<(String, OffsetDateTime)> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Session => self.session_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + ttl;
        let claims = Claims {
            sub: account_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = %account_id, kind = ?kind, "token signed");
        Ok((token, exp))
    }

    pub fn issue_session(&self, account_id: Uuid) -> anyhow::Result<(String, OffsetDateTime)> {
        self.issue_with_kind(account_id, TokenKind::Session)
    }

    pub fn issue_refresh(&self, account_id: Uuid) -> anyhow::Result<(String, OffsetDateTime)> {
        self.issue_with_kind(account_id, TokenKind::Refresh)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    /// Strict verification: signature, issuer/audience and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation()).map_err(classify)?;
        debug!(account_id = %data.claims.sub, kind = ?data.claims.kind, "token verified");
        Ok(data.claims)
    }

    /// Strict verification plus a refresh-kind check. A session token
    /// presented here is rejected as invalid rather than with a distinct
    /// error, to keep the failure surface uniform.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            warn!(account_id = %claims.sub, "session token presented for refresh");
            return Err(TokenError::InvalidSignature);
        }
        Ok(claims)
    }

    /// Lenient check: any failure (malformed, tampered, expired) is `false`.
    pub fn validate(&self, token: &str) -> bool {
        self.verify(token).is_ok()
    }

    /// Reads claims with the signature checked but expiry skipped. Callers
    /// that need trust must go through `verify` first.
    pub fn peek_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = self.validation();
        validation.validate_exp = false;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(classify)
    }

    /// Convenience accessor for the subject of an already-verified token.
    pub fn subject(&self, token: &str) -> Result<Uuid, TokenError> {
        Ok(self.peek_claims(token)?.sub)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::InvalidSignature,
    }
}

/// Extracts and verifies the bearer token, yielding the account ID.
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

        let claims = match codec.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Session {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Session token required".to_string(),
            ));
        }

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_ms: 300_000,
            refresh_multiplier: 7,
        }
    }

    fn make_codec() -> TokenCodec {
        TokenCodec::new(&make_config())
    }

    /// Signs claims directly, bypassing `issue_*`, to pin timestamps.
    fn sign_raw(codec: &TokenCodec, claims: &Claims) -> String {
        encode(&Header::default(), claims, &codec.encoding).expect("encode")
    }

    fn claims_with_exp(offset_secs: i64, kind: TokenKind) -> Claims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Claims {
            sub: Uuid::new_v4(),
            iat: (now - 60) as usize,
            exp: (now + offset_secs) as usize,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind,
        }
    }

    #[test]
    fn issue_and_verify_session_token() {
        let codec = make_codec();
        let account_id = Uuid::new_v4();
        let (token, exp) = codec.issue_session(account_id).expect("issue session");
        let claims = codec.verify(&token).expect("verify");
        assert_eq!(claims.sub, account_id);
        assert_eq!(claims.kind, TokenKind::Session);
        assert_eq!(claims.exp, exp.unix_timestamp() as usize);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_tier_lives_seven_times_longer() {
        let codec = make_codec();
        let account_id = Uuid::new_v4();
        let (session, _) = codec.issue_session(account_id).expect("session");
        let (refresh, _) = codec.issue_refresh(account_id).expect("refresh");
        let s = codec.verify(&session).expect("verify session");
        let r = codec.verify_refresh(&refresh).expect("verify refresh");
        let session_ttl = s.exp - s.iat;
        let refresh_ttl = r.exp - r.iat;
        // both TTLs are whole seconds derived from the same config
        assert_eq!(refresh_ttl, session_ttl * 7);
    }

    #[test]
    fn verify_refresh_rejects_session_token() {
        let codec = make_codec();
        let (token, _) = codec.issue_session(Uuid::new_v4()).expect("issue");
        assert_eq!(
            codec.verify_refresh(&token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn expired_token_fails_with_expired() {
        let codec = make_codec();
        let token = sign_raw(&codec, &claims_with_exp(-10, TokenKind::Session));
        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_valid_until_expiry() {
        let codec = make_codec();
        let token = sign_raw(&codec, &claims_with_exp(30, TokenKind::Session));
        assert!(codec.verify(&token).is_ok());
    }

    #[test]
    fn tampered_token_fails_with_invalid_signature() {
        let codec = make_codec();
        let (token, _) = codec.issue_session(Uuid::new_v4()).expect("issue");
        // flip the last signature byte
        let mut bytes = token.into_bytes();
        let last = bytes.last_mut().expect("non-empty");
        *last = if *last == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).expect("utf8");
        assert_eq!(
            codec.verify(&tampered).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn tampered_payload_fails_with_invalid_signature() {
        let codec = make_codec();
        let (token, _) = codec.issue_session(Uuid::new_v4()).expect("issue");
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        assert_eq!(parts.len(), 3);
        // swap the payload for one signed under a different secret
        let other = TokenCodec::new(&JwtConfig {
            secret: "other-secret".into(),
            ..make_config()
        });
        let forged = sign_raw(&other, &claims_with_exp(300, TokenKind::Session));
        parts[1] = forged.split('.').nth(1).expect("payload").to_string();
        assert_eq!(
            codec.verify(&parts.join(".")).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn wrong_issuer_or_audience_is_invalid() {
        let codec = make_codec();
        let token = sign_raw(
            &codec,
            &Claims {
                iss: "someone-else".into(),
                ..claims_with_exp(300, TokenKind::Session)
            },
        );
        assert_eq!(
            codec.verify(&token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn validate_collapses_all_failures_to_false() {
        let codec = make_codec();
        assert!(!codec.validate("not-a-token"));
        assert!(!codec.validate(""));
        let expired = sign_raw(&codec, &claims_with_exp(-10, TokenKind::Session));
        assert!(!codec.validate(&expired));
        let (good, _) = codec.issue_session(Uuid::new_v4()).expect("issue");
        assert!(codec.validate(&good));
    }

    #[test]
    fn peek_claims_reads_expired_token() {
        let codec = make_codec();
        let claims = claims_with_exp(-10, TokenKind::Session);
        let token = sign_raw(&codec, &claims);
        let peeked = codec.peek_claims(&token).expect("peek");
        assert_eq!(peeked.sub, claims.sub);
        assert_eq!(codec.subject(&token).expect("subject"), claims.sub);
    }

    #[test]
    fn peek_claims_still_checks_signature() {
        let codec = make_codec();
        let other = TokenCodec::new(&JwtConfig {
            secret: "other-secret".into(),
            ..make_config()
        });
        let token = sign_raw(&other, &claims_with_exp(300, TokenKind::Session));
        assert_eq!(
            codec.peek_claims(&token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }
}
