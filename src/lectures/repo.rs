use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub topic: String,
    pub tutor: Uuid,
    pub content_type: String,
    pub content_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub level: String,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub views: i64,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const LECTURE_COLUMNS: &str = "id, title, description, subject, topic, tutor, content_type, \
     content_url, duration_minutes, level, is_published, published_at, views, tags, \
     created_at, updated_at";

pub struct NewLecture<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub subject: &'a str,
    pub topic: &'a str,
    pub tutor: Uuid,
    pub content_type: &'a str,
    pub content_url: Option<&'a str>,
    pub duration_minutes: Option<i32>,
    pub level: &'a str,
    pub tags: &'a [String],
    pub is_published: bool,
}

/// Partial update; `None` keeps the stored value. `published_at` is set once,
/// the first time the lecture flips to published.
#[derive(Debug, Default)]
pub struct LectureUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub level: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

#[derive(Debug)]
pub struct LectureFilter<'a> {
    pub subject: Option<&'a str>,
    pub published: Option<bool>,
}

pub async fn create(db: &PgPool, new: &NewLecture<'_>) -> anyhow::Result<Lecture> {
    let sql = format!(
        "INSERT INTO lectures (title, description, subject, topic, tutor, content_type, \
         content_url, duration_minutes, level, tags, is_published, published_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, \
                 CASE WHEN $11 THEN now() END) \
         RETURNING {LECTURE_COLUMNS}"
    );
    let lecture = sqlx::query_as::<_, Lecture>(&sql)
        .bind(new.title)
        .bind(new.description)
        .bind(new.subject)
        .bind(new.topic)
        .bind(new.tutor)
        .bind(new.content_type)
        .bind(new.content_url)
        .bind(new.duration_minutes)
        .bind(new.level)
        .bind(new.tags)
        .bind(new.is_published)
        .fetch_one(db)
        .await?;
    Ok(lecture)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Lecture>> {
    let sql = format!("SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = $1");
    let lecture = sqlx::query_as::<_, Lecture>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(lecture)
}

pub async fn list(
    db: &PgPool,
    filter: &LectureFilter<'_>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Lecture>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {LECTURE_COLUMNS} FROM lectures WHERE TRUE"
    ));
    if let Some(subject) = filter.subject {
        qb.push(" AND subject = ").push_bind(subject);
    }
    if let Some(published) = filter.published {
        qb.push(" AND is_published = ").push_bind(published);
    }
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let lectures = qb.build_query_as::<Lecture>().fetch_all(db).await?;
    Ok(lectures)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    update: &LectureUpdate,
) -> anyhow::Result<Option<Lecture>> {
    let sql = format!(
        "UPDATE lectures SET \
         title = COALESCE($2, title), \
         description = COALESCE($3, description), \
         subject = COALESCE($4, subject), \
         topic = COALESCE($5, topic), \
         content_type = COALESCE($6, content_type), \
         content_url = COALESCE($7, content_url), \
         duration_minutes = COALESCE($8, duration_minutes), \
         level = COALESCE($9, level), \
         tags = COALESCE($10, tags), \
         is_published = COALESCE($11, is_published), \
         published_at = CASE \
             WHEN COALESCE($11, is_published) AND published_at IS NULL THEN now() \
             ELSE published_at \
         END, \
         updated_at = now() \
         WHERE id = $1 \
         RETURNING {LECTURE_COLUMNS}"
    );
    let lecture = sqlx::query_as::<_, Lecture>(&sql)
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.subject.as_deref())
        .bind(update.topic.as_deref())
        .bind(update.content_type.as_deref())
        .bind(update.content_url.as_deref())
        .bind(update.duration_minutes)
        .bind(update.level.as_deref())
        .bind(update.tags.as_deref())
        .bind(update.is_published)
        .fetch_optional(db)
        .await?;
    Ok(lecture)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM lectures WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
