use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Punctuation accepted as the "special character" class.
const SYMBOLS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

const MIN_LEN: usize = 12;

/// Validate raw password strength. Reports the first unmet rule; pure, no
/// side effects.
pub fn validate_password(raw: &str) -> Result<(), &'static str> {
    if raw.chars().count() < MIN_LEN {
        return Err("Password must be at least 12 characters.");
    }
    if !raw.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must include at least one lowercase letter.");
    }
    if !raw.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must include at least one uppercase letter.");
    }
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must include at least one number.");
    }
    if !raw.chars().any(|c| SYMBOLS.contains(c)) {
        return Err("Password must include at least one special character.");
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    #[test]
    fn accepts_password_meeting_all_rules() {
        assert!(validate_password("Str0ngP@ssword!").is_ok());
        assert!(validate_password("Aa1!Aa1!Aa1!").is_ok());
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_password("Aa1!short").unwrap_err();
        assert!(err.contains("12 characters"));
    }

    #[test]
    fn rejects_missing_lowercase() {
        let err = validate_password("STRONGP@SSW0RD!").unwrap_err();
        assert!(err.contains("lowercase"));
    }

    #[test]
    fn rejects_missing_uppercase() {
        let err = validate_password("str0ngp@ssword!").unwrap_err();
        assert!(err.contains("uppercase"));
    }

    #[test]
    fn rejects_missing_digit() {
        let err = validate_password("StrongP@ssword!").unwrap_err();
        assert!(err.contains("number"));
    }

    #[test]
    fn rejects_missing_symbol() {
        let err = validate_password("Str0ngPassword1").unwrap_err();
        assert!(err.contains("special character"));
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        // 12 chars exactly, all four classes present.
        assert!(validate_password("Aa1!aaaaaaaa").is_ok());
        assert!(validate_password("Aa1!aaaaaaa").is_err());
    }
}

#[cfg(test)]
mod hash_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
