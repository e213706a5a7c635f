use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use roster_core::AppError;
use roster_models::{Class, ClassId, ClassListResponse, CreateClassDto, UpdateClassDto};

use crate::middleware::auth::{
    RequireClassesDelete, RequireClassesGet, RequireClassesList, RequireClassesNew,
    RequireClassesUpdate,
};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/classes",
    responses(
        (status = 200, description = "Active classes the caller belongs to, by name", body = ClassListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Forbidden - requires classes.list scope")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_classes(
    State(state): State<AppState>,
    RequireClassesList(auth_user): RequireClassesList,
) -> Result<Json<ClassListResponse>, AppError> {
    let classes = state.classes.list_classes(auth_user.user_id()).await?;
    Ok(Json(ClassListResponse { classes }))
}

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created; the caller is its owner", body = Class),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Forbidden - requires classes.new scope"),
        (status = 422, description = "Invalid class name")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireClassesNew(auth_user): RequireClassesNew,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class = state.classes.create_class(auth_user.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes/{class_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Class details", body = Class),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Forbidden - requires classes.get scope"),
        (status = 404, description = "Class not found or caller is not a member")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    RequireClassesGet(auth_user): RequireClassesGet,
    Path(class_id): Path<ClassId>,
) -> Result<Json<Class>, AppError> {
    let class = state.classes.get_class(auth_user.user_id(), class_id).await?;
    Ok(Json(class))
}

#[utoipa::path(
    patch,
    path = "/api/classes/{class_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks classes.update scope or is below administrator"),
        (status = 404, description = "Class not found or caller is not a member"),
        (status = 422, description = "Invalid input")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireClassesUpdate(auth_user): RequireClassesUpdate,
    Path(class_id): Path<ClassId>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class = state
        .classes
        .update_class(auth_user.user_id(), class_id, dto)
        .await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 204, description = "Class deactivated and all members removed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks classes.delete scope or is below administrator"),
        (status = 404, description = "Class not found or caller is not a member"),
        (status = 500, description = "Deactivation rolled back")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireClassesDelete(auth_user): RequireClassesDelete,
    Path(class_id): Path<ClassId>,
) -> Result<StatusCode, AppError> {
    state
        .classes
        .delete_class(auth_user.user_id(), class_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
