use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{delete, get, patch, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        is_valid_subject, ApproveBookRequest, BookListQuery, BookListResponse, Pagination,
        StatusMessage, UploadBookResponse,
    },
    repo::{self, BookFilter, NewBook},
};
use crate::{
    auth::{
        extractors::{require_role, AuthUser},
        repo::Role,
    },
    error::ApiError,
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DOWNLOAD_URL_TTL_SECS: u64 = 600;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/:id/download", get(download_book))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/books", post(upload_book))
        .route("/books/:id/approve", patch(approve_book))
        .route("/books/:id", delete(delete_book))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

fn bad_field(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::validation(format!("Invalid multipart body: {err}"))
}

/// POST /books (multipart): title/author/subject/description fields plus a
/// single PDF `file`. Tutor uploads await admin approval; admin uploads are
/// approved immediately.
#[instrument(skip(state, multipart))]
pub async fn upload_book(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadBookResponse>), ApiError> {
    require_role(&identity, &[Role::Tutor, Role::Admin])?;

    let mut title: Option<String> = None;
    let mut author: Option<String> = None;
    let mut subject: Option<String> = None;
    let mut description = String::new();
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_field)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("title") => title = Some(field.text().await.map_err(bad_field)?),
            Some("author") => author = Some(field.text().await.map_err(bad_field)?),
            Some("subject") => subject = Some(field.text().await.map_err(bad_field)?),
            Some("description") => description = field.text().await.map_err(bad_field)?,
            Some("file") => {
                let file_name = field.file_name().unwrap_or("book.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_field)?;
                file = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let title = title
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Title is required."))?;
    let author = author
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Author is required."))?;
    let subject = subject.ok_or_else(|| ApiError::validation("Subject is required."))?;
    if !is_valid_subject(&subject) {
        return Err(ApiError::validation(
            "Subject must be one of Mathematics, Physics, Chemistry, Biology, General.",
        ));
    }
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::validation("No file uploaded"))?;
    if content_type != "application/pdf" {
        return Err(ApiError::validation("Only PDF files are allowed."));
    }
    if bytes.is_empty() {
        return Err(ApiError::validation("No file uploaded"));
    }

    let book_id = Uuid::new_v4();
    let object_key = format!("books/{}/{}.pdf", identity.id, book_id);
    let file_size = bytes.len() as i64;
    state
        .storage
        .put_object(&object_key, bytes, "application/pdf")
        .await?;

    let approved = identity.role == Role::Admin;
    let book = repo::create(
        &state.db,
        &NewBook {
            id: book_id,
            title: title.trim(),
            author: author.trim(),
            subject: &subject,
            description: &description,
            object_key: &object_key,
            file_name: &file_name,
            file_size,
            mime_type: "application/pdf",
            uploaded_by: identity.id,
            approved,
        },
    )
    .await?;

    if book.approved {
        info!(book_id = %book.id, uploader = %identity.id, "book uploaded and approved");
    } else {
        info!(book_id = %book.id, uploader = %identity.id, "book uploaded, awaiting approval");
    }

    Ok((
        StatusCode::CREATED,
        Json(UploadBookResponse {
            message: "Book uploaded successfully".into(),
            book: book.id,
            approved: book.approved,
        }),
    ))
}

/// GET /books with subject/search filters and pagination. Only admins may
/// list unapproved books.
#[instrument(skip(state))]
pub async fn list_books(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<BookListQuery>,
) -> Result<Json<BookListResponse>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let page = query.page.max(1);
    let approved = if identity.role == Role::Admin {
        query.approved
    } else {
        true
    };

    let filter = BookFilter {
        approved,
        subject: query.subject.as_deref(),
        search: query.search.as_deref(),
    };
    let total = repo::count(&state.db, &filter).await?;
    let books = repo::list(&state.db, &filter, limit, (page - 1) * limit).await?;

    let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
    Ok(Json(BookListResponse {
        books,
        pagination: Pagination {
            current: page,
            pages,
            total,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn approve_book(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveBookRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let updated = repo::set_approval(
        &state.db,
        id,
        payload.approved,
        identity.id,
        payload.reject_reason.as_deref(),
    )
    .await?;
    if !updated {
        return Err(ApiError::not_found("Book not found"));
    }

    let verdict = if payload.approved { "approved" } else { "rejected" };
    info!(book_id = %id, admin = %identity.id, verdict, "book reviewed");
    Ok(Json(StatusMessage {
        message: format!("Book {verdict} successfully"),
    }))
}

/// GET /books/:id/download → 302 to a presigned URL. Unapproved books are
/// only visible to admins and their uploader.
#[instrument(skip(state))]
pub async fn download_book(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let book = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;
    if !book.approved && identity.role != Role::Admin && book.uploaded_by != identity.id {
        return Err(ApiError::not_found("Book not found"));
    }

    let url = state
        .storage
        .presign_download(&book.object_key, &book.file_name, DOWNLOAD_URL_TTL_SECS)
        .await?;
    repo::record_download(&state.db, id).await?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusMessage>, ApiError> {
    let book = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;
    if identity.role != Role::Admin && book.uploaded_by != identity.id {
        return Err(ApiError::Forbidden("Access denied".into()));
    }

    // Row deletion proceeds even when the object is already gone.
    if let Err(e) = state.storage.delete_object(&book.object_key).await {
        warn!(error = %e, book_id = %book.id, "object delete failed");
    }
    repo::delete(&state.db, book.id).await?;

    info!(book_id = %book.id, by = %identity.id, "book deleted");
    Ok(Json(StatusMessage {
        message: "Book deleted successfully".into(),
    }))
}
