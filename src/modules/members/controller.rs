use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use roster_core::AppError;
use roster_models::{ClassId, Member, MemberListResponse, SetRoleDto, UserId};

use crate::middleware::auth::{
    RequireClassesJoin, RequireClassesLeave, RequireClassesListMembers,
    RequireClassesMembersUpdate,
};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/members",
    params(
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Members of the class, highest role first", body = MemberListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Forbidden - requires classes.list_members scope"),
        (status = 404, description = "Class not found or caller is not a member")
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    RequireClassesListMembers(auth_user): RequireClassesListMembers,
    Path(class_id): Path<ClassId>,
) -> Result<Json<MemberListResponse>, AppError> {
    let members = state
        .members
        .list_members(auth_user.user_id(), class_id)
        .await?;
    Ok(Json(MemberListResponse { members }))
}

#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/join",
    params(
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 201, description = "Joined the class as a student", body = Member),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Forbidden - requires classes.join scope"),
        (status = 404, description = "Class not found or inactive"),
        (status = 409, description = "User is already enrolled")
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn join_class(
    State(state): State<AppState>,
    RequireClassesJoin(auth_user): RequireClassesJoin,
    Path(class_id): Path<ClassId>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let member = state
        .members
        .join_class(auth_user.user_id(), class_id)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}/leave",
    params(
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 204, description = "Left the class"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Forbidden - requires classes.leave scope"),
        (status = 404, description = "Class not found or caller is not a member"),
        (status = 409, description = "The owner must hand ownership off first")
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn leave_class(
    State(state): State<AppState>,
    RequireClassesLeave(auth_user): RequireClassesLeave,
    Path(class_id): Path<ClassId>,
) -> Result<StatusCode, AppError> {
    state
        .members
        .leave_class(auth_user.user_id(), class_id, None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}/leave/{user_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class ID"),
        ("user_id" = Uuid, Path, description = "User to remove; the caller's own ID leaves the class")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks classes.leave scope or does not outrank the member"),
        (status = 404, description = "Class or member not found"),
        (status = 409, description = "The owner must hand ownership off first")
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn remove_member(
    State(state): State<AppState>,
    RequireClassesLeave(auth_user): RequireClassesLeave,
    Path((class_id, user_id)): Path<(ClassId, UserId)>,
) -> Result<StatusCode, AppError> {
    state
        .members
        .leave_class(auth_user.user_id(), class_id, Some(user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/classes/{class_id}/members/{user_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    request_body = SetRoleDto,
    responses(
        (status = 200, description = "Role updated; promoting to owner demotes the caller to administrator", body = Member),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks classes.members:update scope or does not outrank the member"),
        (status = 404, description = "Class or member not found"),
        (status = 422, description = "Unknown role")
    ),
    tag = "Members",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireClassesMembersUpdate(auth_user): RequireClassesMembersUpdate,
    Path((class_id, user_id)): Path<(ClassId, UserId)>,
    ValidatedJson(dto): ValidatedJson<SetRoleDto>,
) -> Result<Json<Member>, AppError> {
    let member = state
        .members
        .set_role(auth_user.user_id(), class_id, user_id, dto.role)
        .await?;
    Ok(Json(member))
}
