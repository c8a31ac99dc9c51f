use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        is_valid_kind, is_valid_subject, CreateGroupRequest, CreatedGroupResponse,
        GroupListQuery, JoinGroupRequest, StatusMessage, UpdateGroupRequest,
    },
    repo::{self, Group, GroupUpdate, NewGroup},
};
use crate::{
    auth::{
        extractors::{require_role, AuthUser},
        repo::Role,
    },
    error::ApiError,
    state::AppState,
};

const JOIN_CODE_LEN: usize = 8;

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/:id/join", post(join_group))
}

fn generate_join_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JOIN_CODE_LEN)
        .map(char::from)
        .collect()
}

#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupListQuery>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let page = query.page.max(1);
    let groups = repo::list(
        &state.db,
        query.subject.as_deref(),
        query.kind.as_deref(),
        limit,
        (page - 1) * limit,
    )
    .await?;
    Ok(Json(groups))
}

#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError> {
    let group = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;
    Ok(Json(group))
}

#[instrument(skip(state, payload))]
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<CreatedGroupResponse>), ApiError> {
    require_role(&identity, &[Role::Tutor, Role::Admin])?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Group name is required."));
    }
    if !is_valid_subject(&payload.subject) {
        return Err(ApiError::validation(
            "Subject must be one of Mathematics, Physics, Chemistry, Biology, General, Exam Prep.",
        ));
    }
    let kind = payload.kind.as_deref().unwrap_or("study");
    if !is_valid_kind(kind) {
        return Err(ApiError::validation(
            "Group type must be one of study, discussion, project.",
        ));
    }
    let max_members = payload.max_members.unwrap_or(50);
    if max_members < 1 {
        return Err(ApiError::validation("maxMembers must be at least 1."));
    }

    if repo::find_by_name(&state.db, name).await?.is_some() {
        return Err(ApiError::Conflict("Group name already taken.".into()));
    }

    let is_private = payload.is_private.unwrap_or(false);
    let join_code = is_private.then(generate_join_code);

    let group = repo::create(
        &state.db,
        &NewGroup {
            name,
            description: payload.description.as_deref().unwrap_or(""),
            subject: &payload.subject,
            kind,
            creator: identity.id,
            max_members,
            is_private,
            join_code: join_code.as_deref(),
        },
    )
    .await?;

    info!(group_id = %group.id, creator = %identity.id, "group created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedGroupResponse {
            message: "Group created successfully.".into(),
            join_code,
            group,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    require_role(&identity, &[Role::Tutor, Role::Admin])?;

    if let Some(subject) = &payload.subject {
        if !is_valid_subject(subject) {
            return Err(ApiError::validation(
                "Subject must be one of Mathematics, Physics, Chemistry, Biology, General, Exam Prep.",
            ));
        }
    }
    if let Some(kind) = &payload.kind {
        if !is_valid_kind(kind) {
            return Err(ApiError::validation(
                "Group type must be one of study, discussion, project.",
            ));
        }
    }

    let group = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    // Flipping a group private without a code mints one.
    let minted_code = (payload.is_private == Some(true) && group.join_code.is_none())
        .then(generate_join_code);

    let update = GroupUpdate {
        name: payload.name.as_deref().map(str::trim),
        description: payload.description.as_deref(),
        subject: payload.subject.as_deref(),
        kind: payload.kind.as_deref(),
        max_members: payload.max_members,
        is_private: payload.is_private,
        join_code: minted_code.as_deref(),
        is_active: payload.is_active,
    };
    let group = repo::update(&state.db, id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    info!(group_id = %group.id, by = %identity.id, "group updated");
    Ok(Json(group))
}

#[instrument(skip(state))]
pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusMessage>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Group not found"));
    }
    info!(group_id = %id, by = %identity.id, "group deleted");
    Ok(Json(StatusMessage {
        message: "Group deleted successfully.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn join_group(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<JoinGroupRequest>>,
) -> Result<Json<StatusMessage>, ApiError> {
    let group = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    if !group.is_active {
        return Err(ApiError::validation("Group is not active."));
    }
    if group.members.contains(&identity.id) {
        return Err(ApiError::validation("Already a member of this group."));
    }
    if group.members.len() as i32 >= group.max_members {
        return Err(ApiError::validation("Group is full."));
    }
    if group.is_private {
        let supplied = payload.and_then(|Json(p)| p.join_code);
        if supplied.as_deref() != group.join_code.as_deref() {
            return Err(ApiError::validation("Invalid join code."));
        }
    }

    repo::add_member(&state.db, group.id, identity.id).await?;

    info!(group_id = %group.id, user_id = %identity.id, "joined group");
    Ok(Json(StatusMessage {
        message: "Joined group successfully.".into(),
    }))
}
