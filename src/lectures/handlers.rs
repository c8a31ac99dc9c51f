use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        is_valid_content_type, is_valid_level, is_valid_subject, CreateLectureRequest,
        LectureListQuery, StatusMessage, UpdateLectureRequest,
    },
    repo::{self, Lecture, LectureFilter, LectureUpdate, NewLecture},
};
use crate::{
    auth::{
        extractors::{require_role, AuthUser},
        repo::Role,
    },
    error::ApiError,
    state::AppState,
};

pub fn lecture_routes() -> Router<AppState> {
    Router::new()
        .route("/lectures", get(list_lectures).post(create_lecture))
        .route(
            "/lectures/:id",
            get(get_lecture).put(update_lecture).delete(delete_lecture),
        )
}

#[instrument(skip(state))]
pub async fn list_lectures(
    State(state): State<AppState>,
    Query(query): Query<LectureListQuery>,
) -> Result<Json<Vec<Lecture>>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let page = query.page.max(1);
    let filter = LectureFilter {
        subject: query.subject.as_deref(),
        published: query.published,
    };
    let lectures = repo::list(&state.db, &filter, limit, (page - 1) * limit).await?;
    Ok(Json(lectures))
}

#[instrument(skip(state))]
pub async fn get_lecture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lecture>, ApiError> {
    let lecture = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture not found"))?;
    Ok(Json(lecture))
}

#[instrument(skip(state, payload))]
pub async fn create_lecture(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateLectureRequest>,
) -> Result<(StatusCode, Json<Lecture>), ApiError> {
    require_role(&identity, &[Role::Tutor, Role::Admin])?;

    if payload.title.trim().is_empty() || payload.topic.trim().is_empty() {
        return Err(ApiError::validation("Title and topic are required."));
    }
    if !is_valid_subject(&payload.subject) {
        return Err(ApiError::validation(
            "Subject must be one of Mathematics, Physics, Chemistry, Biology, General.",
        ));
    }
    if !is_valid_content_type(&payload.content_type) {
        return Err(ApiError::validation(
            "Content type must be one of video, notes, pdf, quiz.",
        ));
    }
    let level = payload.level.as_deref().unwrap_or("intermediate");
    if !is_valid_level(level) {
        return Err(ApiError::validation(
            "Level must be one of beginner, intermediate, advanced.",
        ));
    }

    let tags = payload.tags.unwrap_or_default();
    let lecture = repo::create(
        &state.db,
        &NewLecture {
            title: payload.title.trim(),
            description: payload.description.as_deref().unwrap_or(""),
            subject: &payload.subject,
            topic: payload.topic.trim(),
            tutor: identity.id,
            content_type: &payload.content_type,
            content_url: payload.content_url.as_deref(),
            duration_minutes: payload.duration_minutes,
            level,
            tags: &tags,
            is_published: payload.is_published.unwrap_or(false),
        },
    )
    .await?;

    info!(lecture_id = %lecture.id, tutor = %identity.id, "lecture created");
    Ok((StatusCode::CREATED, Json(lecture)))
}

#[instrument(skip(state, payload))]
pub async fn update_lecture(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLectureRequest>,
) -> Result<Json<Lecture>, ApiError> {
    require_role(&identity, &[Role::Tutor, Role::Admin])?;

    if let Some(subject) = &payload.subject {
        if !is_valid_subject(subject) {
            return Err(ApiError::validation(
                "Subject must be one of Mathematics, Physics, Chemistry, Biology, General.",
            ));
        }
    }
    if let Some(content_type) = &payload.content_type {
        if !is_valid_content_type(content_type) {
            return Err(ApiError::validation(
                "Content type must be one of video, notes, pdf, quiz.",
            ));
        }
    }
    if let Some(level) = &payload.level {
        if !is_valid_level(level) {
            return Err(ApiError::validation(
                "Level must be one of beginner, intermediate, advanced.",
            ));
        }
    }

    let update = LectureUpdate {
        title: payload.title,
        description: payload.description,
        subject: payload.subject,
        topic: payload.topic,
        content_type: payload.content_type,
        content_url: payload.content_url,
        duration_minutes: payload.duration_minutes,
        level: payload.level,
        tags: payload.tags,
        is_published: payload.is_published,
    };
    let lecture = repo::update(&state.db, id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture not found"))?;

    info!(lecture_id = %lecture.id, by = %identity.id, "lecture updated");
    Ok(Json(lecture))
}

#[instrument(skip(state))]
pub async fn delete_lecture(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusMessage>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Lecture not found"));
    }
    info!(lecture_id = %id, by = %identity.id, "lecture deleted");
    Ok(Json(StatusMessage {
        message: "Lecture deleted".into(),
    }))
}
