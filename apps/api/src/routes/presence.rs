//! Presence lookups over HTTP
//!
//! - `GET /presence/online` - sorted ids of users with a registered channel
//! - `GET /presence/:user_id` - whether one user is online

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::websocket::conversation::validate_identifier;
use crate::websocket::{RealtimeHub, UserId};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersResponse {
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresenceResponse {
    pub user_id: UserId,
    pub online: bool,
}

pub fn presence_router(hub: RealtimeHub) -> Router {
    Router::new()
        .route("/online", get(online_users))
        .route("/:user_id", get(user_presence))
        .with_state(hub)
}

async fn online_users(State(hub): State<RealtimeHub>) -> Json<OnlineUsersResponse> {
    Json(OnlineUsersResponse {
        user_ids: hub.registry().online_user_ids(),
    })
}

async fn user_presence(
    State(hub): State<RealtimeHub>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserPresenceResponse>> {
    validate_identifier(&user_id).map_err(|reason| ApiError::invalid_param("user_id", reason))?;

    let online = hub.registry().is_online(&user_id);
    Ok(Json(UserPresenceResponse { user_id, online }))
}
