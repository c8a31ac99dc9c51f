use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use super::repo::Role;
use crate::{config::JwtConfig, state::AppState};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub verify_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            access_ttl_minutes,
            verify_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            verify_ttl: Duration::from_secs((verify_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        kind: TokenKind,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Verify => self.verify_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Session token, 2h by default.
    pub fn sign_access(&self, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, role, TokenKind::Access)
    }

    /// Email-verification link token.
    pub fn sign_verify(&self, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, role, TokenKind::Verify)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        // No leeway: a token one second past its expiry is expired.
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_link(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Verify {
            anyhow::bail!("not a verification token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys
            .sign_access(user_id, "alice@x.com", Role::Student)
            .expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn verify_link_rejects_access_token() {
        let keys = make_keys();
        let token = keys
            .sign_access(Uuid::new_v4(), "a@b.c", Role::Tutor)
            .expect("sign access");
        let err = keys.verify_link(&token).unwrap_err();
        assert!(err.to_string().contains("not a verification token"));
    }

    #[tokio::test]
    async fn verify_link_accepts_verify_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys
            .sign_verify(user_id, "a@b.c", Role::Student)
            .expect("sign verify");
        let claims = keys.verify_link(&token).expect("verify link");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Verify);
    }

    fn token_with_exp_offset(keys: &JwtKeys, offset_secs: i64) -> String {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.c".into(),
            role: Role::Student,
            iat: (now - 7200) as usize,
            exp: (now + offset_secs) as usize,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
            kind: TokenKind::Access,
        };
        encode(&Header::default(), &claims, &keys.encoding).expect("encode")
    }

    #[tokio::test]
    async fn token_one_second_past_expiry_is_rejected() {
        let keys = make_keys();
        let token = token_with_exp_offset(&keys, -1);
        let err = keys.verify(&token).unwrap_err();
        let jwt_err = err
            .downcast_ref::<jsonwebtoken::errors::Error>()
            .expect("jwt error");
        assert_eq!(
            jwt_err.kind(),
            &jsonwebtoken::errors::ErrorKind::ExpiredSignature
        );
    }

    #[tokio::test]
    async fn token_one_second_before_expiry_is_accepted() {
        let keys = make_keys();
        let token = token_with_exp_offset(&keys, 5);
        assert!(keys.verify(&token).is_ok());
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let token = keys
            .sign_access(Uuid::new_v4(), "a@b.c", Role::Student)
            .expect("sign access");
        let mut forged = token.clone();
        forged.pop();
        assert!(keys.verify(&forged).is_err());
    }
}
