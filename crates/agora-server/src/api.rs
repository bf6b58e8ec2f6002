use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_shared::error::AppError;
use agora_shared::types::{ChannelId, UserId};
use agora_store::ChannelMember;

use crate::cache::MembershipCache;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::hub::EventHub;
use crate::plugin_api::PluginApi;

#[derive(Clone)]
pub struct AppState {
    pub plugin: PluginApi,
    pub cache: Arc<MembershipCache>,
    pub hub: EventHub,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route(
            "/api/v1/plugin/channel-members/batch-add",
            post(batch_add_channel_member),
        )
        .route(
            "/api/v1/plugin/channel-members/batch-delete",
            post(batch_delete_channel_member),
        )
        .route(
            "/api/v1/users/:user_id/channel-members",
            get(user_channel_members),
        )
        .route("/api/v1/channels/:channel_id/members", get(channel_members))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    event_subscribers: usize,
}

#[derive(Debug, Deserialize)]
struct BatchMembershipRequest {
    user_id: UserId,
    #[serde(default)]
    channel_ids: Vec<ChannelId>,
}

#[derive(Serialize)]
struct BatchDeleteResponse {
    /// Channel ids submitted. Unknown channels and non-memberships are
    /// skipped, so this is not a count of deleted rows.
    requested: usize,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        event_subscribers: state.hub.subscriber_count(),
    })
}

async fn batch_add_channel_member(
    State(state): State<AppState>,
    Json(req): Json<BatchMembershipRequest>,
) -> Result<Json<Vec<ChannelMember>>, ServerError> {
    let user_id = req.user_id;
    let requested = req.channel_ids.len();

    let members = blocking(move || {
        state
            .plugin
            .batch_add_channel_member(&req.channel_ids, req.user_id)
    })
    .await?;

    info!(user_id = %user_id, requested, "batch add via API");
    Ok(Json(members))
}

async fn batch_delete_channel_member(
    State(state): State<AppState>,
    Json(req): Json<BatchMembershipRequest>,
) -> Result<Json<BatchDeleteResponse>, ServerError> {
    let user_id = req.user_id;
    let requested = req.channel_ids.len();

    blocking(move || {
        state
            .plugin
            .batch_delete_channel_member(&req.channel_ids, req.user_id)
    })
    .await?;

    info!(user_id = %user_id, requested, "batch delete via API");
    Ok(Json(BatchDeleteResponse { requested }))
}

async fn user_channel_members(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<ChannelMember>>, ServerError> {
    let members = blocking(move || {
        state
            .cache
            .members_for_user(user_id)
            .map_err(|e| AppError::internal("user_channel_members", "get_members_for_user", e))
    })
    .await?;
    Ok(Json(members.as_ref().clone()))
}

async fn channel_members(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
) -> Result<Json<Vec<ChannelMember>>, ServerError> {
    let members = blocking(move || {
        state
            .cache
            .members_for_channel(channel_id)
            .map_err(|e| AppError::internal("channel_members", "get_members_for_channel", e))
    })
    .await?;
    Ok(Json(members.as_ref().clone()))
}

/// Store calls block on SQLite; keep them off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ServerError::from)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
