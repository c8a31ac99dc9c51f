use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record in the database. This repo is the only writer of user state;
/// callers hold transient copies.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub full_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<Date>,
    pub school: Option<String>,
    pub class_level: Option<String>,
    pub subjects: Vec<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub code_sent_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, phone, gender, dob, \
     school, class_level, subjects, address, guardian_name, guardian_phone, bio, \
     profile_picture, verified, verification_code, code_sent_at, created_at, updated_at";

/// Fields supplied at creation; everything else takes its column default.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub role: Role,
    pub phone: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub dob: Option<Date>,
    pub school: Option<&'a str>,
    pub class_level: Option<&'a str>,
    pub verified: bool,
    pub verification_code: Option<&'a str>,
    pub code_sent_at: Option<OffsetDateTime>,
}

/// Partial profile update; `None` fields keep their stored value.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<Date>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub school: Option<String>,
    pub class_level: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

impl User {
    /// Find a user by email, case-insensitive exact match.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Create a new user. The unique index on lower(email) backstops the
    /// duplicate pre-check in the handler.
    pub async fn create(db: &PgPool, new: &NewUser<'_>) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, full_name, role, phone, gender, dob, \
             school, class_level, verified, verification_code, code_sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.full_name)
            .bind(new.role)
            .bind(new.phone)
            .bind(new.gender)
            .bind(new.dob)
            .bind(new.school)
            .bind(new.class_level)
            .bind(new.verified)
            .bind(new.verification_code)
            .bind(new.code_sent_at)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    /// Merge the set fields into the stored record; unset fields keep their
    /// prior value. Always refreshes `updated_at`.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
             full_name = COALESCE($2, full_name), \
             gender = COALESCE($3, gender), \
             dob = COALESCE($4, dob), \
             phone = COALESCE($5, phone), \
             address = COALESCE($6, address), \
             guardian_name = COALESCE($7, guardian_name), \
             guardian_phone = COALESCE($8, guardian_phone), \
             school = COALESCE($9, school), \
             class_level = COALESCE($10, class_level), \
             subjects = COALESCE($11, subjects), \
             bio = COALESCE($12, bio), \
             profile_picture = COALESCE($13, profile_picture), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.full_name.as_deref())
            .bind(update.gender.as_deref())
            .bind(update.dob)
            .bind(update.phone.as_deref())
            .bind(update.address.as_deref())
            .bind(update.guardian_name.as_deref())
            .bind(update.guardian_phone.as_deref())
            .bind(update.school.as_deref())
            .bind(update.class_level.as_deref())
            .bind(update.subjects.as_deref())
            .bind(update.bio.as_deref())
            .bind(update.profile_picture.as_deref())
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Attach a fresh verification code, replacing any outstanding one.
    pub async fn set_verification_code(
        db: &PgPool,
        id: Uuid,
        code: &str,
        sent_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET verification_code = $2, code_sent_at = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(sent_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Flip verified and clear the code pair in one statement, so a verified
    /// row never carries a stale code.
    pub async fn mark_verified(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET verified = TRUE, verification_code = NULL, code_sent_at = NULL, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
        assert_eq!(serde_json::to_string(&Role::Tutor).unwrap(), "\"tutor\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn role_roundtrips_from_json() {
        let role: Role = serde_json::from_str("\"tutor\"").unwrap();
        assert_eq!(role, Role::Tutor);
    }
}
