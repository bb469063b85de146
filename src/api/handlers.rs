use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::game::{Action, NewLocalSession, NewOnlineSession, PlayerView, SessionCode};

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health & catalog
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    let sessions = state.sessions.session_count().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        sessions,
        connections: state.ws.total_connections().await,
    }))
}

/// GET /api/categories
pub async fn list_categories(State(state): State<SharedState>) -> Json<CategoriesResponse> {
    let categories = state
        .sessions
        .catalog()
        .categories()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(CategoriesResponse { categories })
}

// =========================================================================
// Create
// =========================================================================

/// POST /api/sessions/online
pub async fn create_online(
    State(state): State<SharedState>,
    payload: Result<Json<CreateOnlineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(input) = payload?;
    let session = state
        .sessions
        .create_online(NewOnlineSession {
            categories: input.categories,
            imposter_count: input.imposters,
            player_name: input.player_name,
            display_name: input.game_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            code: session.code(),
        }),
    ))
}

/// POST /api/sessions/local
pub async fn create_local(
    State(state): State<SharedState>,
    payload: Result<Json<CreateLocalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(input) = payload?;
    let session = state
        .sessions
        .create_local(NewLocalSession {
            categories: input.categories,
            imposter_count: input.imposters,
            players: input.players,
            display_name: input.game_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            code: session.code(),
        }),
    ))
}

// =========================================================================
// Join
// =========================================================================

/// POST /api/sessions/{code}/join
pub async fn join_session(
    State(state): State<SharedState>,
    Path(code): Path<SessionCode>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(input) = payload?;
    join(&state, code, &input.player_name).await
}

/// POST /api/sessions/join
pub async fn join_by_code(
    State(state): State<SharedState>,
    payload: Result<Json<JoinByCodeRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(input) = payload?;
    join(&state, input.code, &input.player_name).await
}

async fn join(
    state: &SharedState,
    code: SessionCode,
    player_name: &str,
) -> Result<Json<JoinResponse>, ApiError> {
    let session = state.sessions.join(code, player_name).await?;
    Ok(Json(JoinResponse {
        code,
        status: session.state(),
    }))
}

// =========================================================================
// View
// =========================================================================

/// GET /api/sessions/{code}?player=NAME
pub async fn get_session(
    State(state): State<SharedState>,
    Path(code): Path<SessionCode>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<PlayerView>, ApiError> {
    let view = state.sessions.view(code, query.player.as_deref()).await?;
    Ok(Json(view))
}

// =========================================================================
// Actions
// =========================================================================

/// POST /api/sessions/{code}/action
pub async fn session_action(
    State(state): State<SharedState>,
    Path(code): Path<SessionCode>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(input) = payload?;
    let action = Action::from_str_loose(&input.action).ok_or_else(|| {
        ApiError::InvalidRequest(format!(
            "unknown action '{}': expected start, next_player, eliminate or end",
            input.action
        ))
    })?;
    let player = input.player_name.as_deref().map(str::trim);

    let session = state.sessions.perform(code, action, player).await?;

    Ok(Json(ActionResponse {
        status: session.state(),
    }))
}

// =========================================================================
// Tests
// =========================================================================
