use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

use super::controller::{join_class, leave_class, list_members, remove_member, set_role};

/// Member routes, nested under `/classes`.
pub fn init_members_router() -> Router<AppState> {
    Router::new()
        .route("/{class_id}/members", get(list_members))
        .route("/{class_id}/members/{user_id}", patch(set_role))
        .route("/{class_id}/join", post(join_class))
        .route("/{class_id}/leave", delete(leave_class))
        .route("/{class_id}/leave/{user_id}", delete(remove_member))
}
