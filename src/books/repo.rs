use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing)]
    pub object_key: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_by: Uuid,
    pub approved: bool,
    pub approved_by: Option<Uuid>,
    pub reject_reason: Option<String>,
    pub downloads: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const BOOK_COLUMNS: &str = "id, title, author, subject, description, object_key, file_name, \
     file_size, mime_type, uploaded_by, approved, approved_by, reject_reason, downloads, \
     created_at, updated_at";

/// The id is caller-assigned so the storage key can embed it before the row
/// exists.
pub struct NewBook<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub author: &'a str,
    pub subject: &'a str,
    pub description: &'a str,
    pub object_key: &'a str,
    pub file_name: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
    pub uploaded_by: Uuid,
    pub approved: bool,
}

#[derive(Debug)]
pub struct BookFilter<'a> {
    pub approved: bool,
    pub subject: Option<&'a str>,
    pub search: Option<&'a str>,
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a BookFilter<'a>) {
    qb.push(" WHERE approved = ").push_bind(filter.approved);
    if let Some(subject) = filter.subject {
        qb.push(" AND subject = ").push_bind(subject);
    }
    if let Some(search) = filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn create(db: &PgPool, new: &NewBook<'_>) -> anyhow::Result<Book> {
    let sql = format!(
        "INSERT INTO books (id, title, author, subject, description, object_key, file_name, \
         file_size, mime_type, uploaded_by, approved) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {BOOK_COLUMNS}"
    );
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(new.id)
        .bind(new.title)
        .bind(new.author)
        .bind(new.subject)
        .bind(new.description)
        .bind(new.object_key)
        .bind(new.file_name)
        .bind(new.file_size)
        .bind(new.mime_type)
        .bind(new.uploaded_by)
        .bind(new.approved)
        .fetch_one(db)
        .await?;
    Ok(book)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(book)
}

pub async fn list(
    db: &PgPool,
    filter: &BookFilter<'_>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Book>> {
    let mut qb = QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} FROM books"));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let books = qb.build_query_as::<Book>().fetch_all(db).await?;
    Ok(books)
}

pub async fn count(db: &PgPool, filter: &BookFilter<'_>) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM books");
    push_filter(&mut qb, filter);
    let (total,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(total)
}

pub async fn set_approval(
    db: &PgPool,
    id: Uuid,
    approved: bool,
    approved_by: Uuid,
    reject_reason: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE books SET approved = $2, approved_by = $3, reject_reason = $4, \
         updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(approved)
    .bind(approved_by)
    .bind(reject_reason)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn record_download(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE books SET downloads = downloads + 1 WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
