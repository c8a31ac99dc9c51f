use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub subject: String,
    pub kind: String,
    pub creator: Uuid,
    pub members: Vec<Uuid>,
    pub max_members: i32,
    pub is_private: bool,
    #[serde(skip_serializing)]
    pub join_code: Option<String>, // shared out-of-band with invitees only
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const GROUP_COLUMNS: &str = "id, name, description, subject, kind, creator, members, \
     max_members, is_private, join_code, is_active, created_at, updated_at";

pub struct NewGroup<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub subject: &'a str,
    pub kind: &'a str,
    pub creator: Uuid,
    pub max_members: i32,
    pub is_private: bool,
    pub join_code: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct GroupUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub max_members: Option<i32>,
    pub is_private: Option<bool>,
    pub join_code: Option<&'a str>,
    pub is_active: Option<bool>,
}

pub async fn create(db: &PgPool, new: &NewGroup<'_>) -> anyhow::Result<Group> {
    let sql = format!(
        "INSERT INTO groups (name, description, subject, kind, creator, members, max_members, \
         is_private, join_code) \
         VALUES ($1, $2, $3, $4, $5, ARRAY[$5], $6, $7, $8) \
         RETURNING {GROUP_COLUMNS}"
    );
    let group = sqlx::query_as::<_, Group>(&sql)
        .bind(new.name)
        .bind(new.description)
        .bind(new.subject)
        .bind(new.kind)
        .bind(new.creator)
        .bind(new.max_members)
        .bind(new.is_private)
        .bind(new.join_code)
        .fetch_one(db)
        .await?;
    Ok(group)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1");
    let group = sqlx::query_as::<_, Group>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(group)
}

pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE name = $1");
    let group = sqlx::query_as::<_, Group>(&sql)
        .bind(name)
        .fetch_optional(db)
        .await?;
    Ok(group)
}

pub async fn list(
    db: &PgPool,
    subject: Option<&str>,
    kind: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Group>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {GROUP_COLUMNS} FROM groups WHERE is_active = TRUE"
    ));
    if let Some(subject) = subject {
        qb.push(" AND subject = ").push_bind(subject);
    }
    if let Some(kind) = kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let groups = qb.build_query_as::<Group>().fetch_all(db).await?;
    Ok(groups)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    update: &GroupUpdate<'_>,
) -> anyhow::Result<Option<Group>> {
    let sql = format!(
        "UPDATE groups SET \
         name = COALESCE($2, name), \
         description = COALESCE($3, description), \
         subject = COALESCE($4, subject), \
         kind = COALESCE($5, kind), \
         max_members = COALESCE($6, max_members), \
         is_private = COALESCE($7, is_private), \
         join_code = COALESCE($8, join_code), \
         is_active = COALESCE($9, is_active), \
         updated_at = now() \
         WHERE id = $1 \
         RETURNING {GROUP_COLUMNS}"
    );
    let group = sqlx::query_as::<_, Group>(&sql)
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.subject)
        .bind(update.kind)
        .bind(update.max_members)
        .bind(update.is_private)
        .bind(update.join_code)
        .bind(update.is_active)
        .fetch_optional(db)
        .await?;
    Ok(group)
}

/// Append a member unless already present. Concurrent joins resolve by
/// last write; the guard keeps the array duplicate-free.
pub async fn add_member(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE groups SET members = array_append(members, $2), updated_at = now() \
         WHERE id = $1 AND NOT (members @> ARRAY[$2])",
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM groups WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
