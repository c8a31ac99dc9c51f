use rand::Rng;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use super::jwt::JwtKeys;
use super::repo::User;
use crate::error::ApiError;

/// Codes are honored for ten minutes from issuance. Staleness is enforced at
/// redemption; the user record is the code's only storage, so no sweep job.
pub const CODE_TTL: Duration = Duration::minutes(10);

/// Fixed-width 8-digit code from OS-seeded randomness.
pub fn generate_code() -> String {
    rand::thread_rng()
        .gen_range(10_000_000..=99_999_999u32)
        .to_string()
}

#[derive(Debug, PartialEq, Eq)]
pub enum CodeStatus {
    AlreadyVerified,
    Mismatch,
    Expired,
    Valid,
}

/// Pure redemption decision. Already-verified wins, so redeeming twice is an
/// idempotent success rather than a mismatch against the cleared code.
pub fn evaluate(
    verified: bool,
    stored_code: Option<&str>,
    sent_at: Option<OffsetDateTime>,
    supplied: &str,
    now: OffsetDateTime,
) -> CodeStatus {
    if verified {
        return CodeStatus::AlreadyVerified;
    }
    let (Some(code), Some(sent_at)) = (stored_code, sent_at) else {
        return CodeStatus::Mismatch;
    };
    if code != supplied {
        return CodeStatus::Mismatch;
    }
    if now - sent_at > CODE_TTL {
        return CodeStatus::Expired;
    }
    CodeStatus::Valid
}

#[derive(Debug, PartialEq, Eq)]
pub enum Redeemed {
    Verified,
    AlreadyVerified,
}

/// Generate and persist a fresh code, replacing any outstanding one.
pub async fn issue(db: &PgPool, user_id: Uuid) -> anyhow::Result<String> {
    let code = generate_code();
    User::set_verification_code(db, user_id, &code, OffsetDateTime::now_utc()).await?;
    Ok(code)
}

pub async fn redeem_by_code(db: &PgPool, email: &str, code: &str) -> Result<Redeemed, ApiError> {
    let Some(user) = User::find_by_email(db, email).await? else {
        return Err(ApiError::not_found("Invalid code."));
    };
    match evaluate(
        user.verified,
        user.verification_code.as_deref(),
        user.code_sent_at,
        code,
        OffsetDateTime::now_utc(),
    ) {
        CodeStatus::AlreadyVerified => Ok(Redeemed::AlreadyVerified),
        CodeStatus::Mismatch => Err(ApiError::not_found("Invalid code.")),
        CodeStatus::Expired => Err(ApiError::Expired(
            "Verification code expired. Please request a new one.".into(),
        )),
        CodeStatus::Valid => {
            User::mark_verified(db, user.id).await?;
            info!(user_id = %user.id, "email verified by code");
            Ok(Redeemed::Verified)
        }
    }
}

/// Link-token path: the token carries the user id, so there is no numeric
/// code or ten-minute check, only the token's own signature and expiry.
pub async fn redeem_by_token(
    db: &PgPool,
    keys: &JwtKeys,
    token: &str,
) -> Result<Redeemed, ApiError> {
    let claims = keys.verify_link(token).map_err(|err| {
        let expired = err
            .downcast_ref::<jsonwebtoken::errors::Error>()
            .is_some_and(|e| {
                matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature)
            });
        if expired {
            ApiError::Expired("Verification link expired. Please request a new code.".into())
        } else {
            ApiError::validation("Invalid verification token.")
        }
    })?;

    let Some(user) = User::find_by_id(db, claims.sub).await? else {
        return Err(ApiError::not_found("User not found"));
    };
    if user.verified {
        return Ok(Redeemed::AlreadyVerified);
    }
    User::mark_verified(db, user.id).await?;
    info!(user_id = %user.id, "email verified by link token");
    Ok(Redeemed::Verified)
}

/// Re-issue a code for an unverified account; the old code is invalidated the
/// moment the new one is stored.
pub async fn resend(db: &PgPool, email: &str) -> Result<(User, String), ApiError> {
    let Some(user) = User::find_by_email(db, email).await? else {
        return Err(ApiError::not_found("User not found."));
    };
    if user.verified {
        return Err(ApiError::validation("Account already verified."));
    }
    let code = issue(db, user.id).await?;
    Ok((user, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn now() -> OffsetDateTime {
        datetime!(2025-06-01 12:00:00 UTC)
    }

    #[test]
    fn generated_codes_are_eight_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn valid_code_within_window() {
        let sent = now() - Duration::seconds(9 * 60 + 59);
        let status = evaluate(false, Some("12345678"), Some(sent), "12345678", now());
        assert_eq!(status, CodeStatus::Valid);
    }

    #[test]
    fn code_at_exactly_ten_minutes_still_valid() {
        let sent = now() - Duration::minutes(10);
        let status = evaluate(false, Some("12345678"), Some(sent), "12345678", now());
        assert_eq!(status, CodeStatus::Valid);
    }

    #[test]
    fn code_past_ten_minutes_expires() {
        let sent = now() - Duration::seconds(10 * 60 + 1);
        let status = evaluate(false, Some("12345678"), Some(sent), "12345678", now());
        assert_eq!(status, CodeStatus::Expired);
    }

    #[test]
    fn wrong_code_is_mismatch_even_when_fresh() {
        let sent = now() - Duration::minutes(1);
        let status = evaluate(false, Some("12345678"), Some(sent), "87654321", now());
        assert_eq!(status, CodeStatus::Mismatch);
    }

    #[test]
    fn verified_user_wins_over_everything() {
        // No stored code (cleared at verification) and a nonsense supplied
        // code still reports already-verified, keeping redemption idempotent.
        let status = evaluate(true, None, None, "00000000", now());
        assert_eq!(status, CodeStatus::AlreadyVerified);
    }

    #[test]
    fn missing_code_is_mismatch() {
        let status = evaluate(false, None, None, "12345678", now());
        assert_eq!(status, CodeStatus::Mismatch);
    }

    #[test]
    fn replaced_code_invalidates_the_old_one() {
        // After a resend the stored code changes; the original no longer
        // matches regardless of freshness.
        let sent = now() - Duration::minutes(1);
        let status = evaluate(false, Some("22222222"), Some(sent), "11111111", now());
        assert_eq!(status, CodeStatus::Mismatch);
    }
}
