use std::collections::HashMap;

use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use tracing::{info, instrument};

use super::models::SENTINEL_ESTIMATE;
use super::routes::{room_route, ROOM_ROUTE_PREFIX};
use crate::render::{self, LobbyView, ParticipantEstimate, RoomView};
use crate::shared::{AppError, AppState};

const USERNAME: &str = "username";
const ROOM_ID: &str = "roomId";
const ESTIMATION: &str = "estimation";
const DESCRIPTION: &str = "description";

/// HTTP handler for the landing page
///
/// GET /
/// Without a username renders the login view; with one, the lobby listing
/// every current room route in sorted order.
#[instrument(name = "index", skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let params = parse_query(query.as_deref());
    let username = require_username(&params)?;

    let room_routes: Vec<String> = state
        .registry
        .list_identifiers()
        .iter()
        .map(|id| room_route(id))
        .collect();

    info!(username, room_count = room_routes.len(), "Serving lobby");

    Ok(Html(render::lobby_page(&LobbyView {
        username,
        room_routes: &room_routes,
        cache_bust: Utc::now().timestamp_millis(),
    }))
    .into_response())
}

/// HTTP handler for creating a new room
///
/// GET /api-add-room
/// Redirects into the freshly created room.
#[instrument(name = "add_room", skip(state, query))]
pub async fn add_room(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let params = parse_query(query.as_deref());
    let username = require_username(&params)?;

    let room_id = state.registry.create(Utc::now())?;

    info!(room_id = %room_id, username, "Room created");

    Ok(redirect(format!(
        "{}?{USERNAME}={username}",
        room_route(&room_id)
    )))
}

/// HTTP handler for submitting an estimation
///
/// GET /api-add-estimation?username=..&roomId=..&estimation=..
#[instrument(name = "add_estimation", skip(state, query))]
pub async fn add_estimation(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let params = parse_query(query.as_deref());
    let username = require_username(&params)?;
    let room_id = require_param(&params, ROOM_ID)?;
    let estimation = require_param(&params, ESTIMATION)?;

    let room = state
        .registry
        .lookup(room_id)
        .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;
    room.set_estimate(username, estimation, Utc::now());

    info!(room_id, username, estimation, "Estimation recorded");

    Ok(redirect(format!(
        "{}?{USERNAME}={username}&{ESTIMATION}={estimation}",
        room_route(room_id)
    )))
}

/// HTTP handler for changing a room's topic
///
/// GET /api-set-description?username=..&roomId=..&description=..
/// Every description write clears the estimates and starts a new round.
#[instrument(name = "set_description", skip(state, query))]
pub async fn set_description(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let params = parse_query(query.as_deref());
    let username = require_username(&params)?;
    let room_id = require_param(&params, ROOM_ID)?;
    let description = params
        .get(DESCRIPTION)
        .map(String::as_str)
        .ok_or_else(|| AppError::Validation("Missing description parameter".to_string()))?;

    let room = state
        .registry
        .lookup(room_id)
        .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;
    room.set_description(description, Utc::now());

    info!(room_id, username, "Description changed, new round started");

    Ok(redirect(format!(
        "{}?{USERNAME}={username}",
        room_route(room_id)
    )))
}

/// Fallback handler dispatching the dynamically bound room routes
///
/// GET /room-<identifier>?username=..
/// Registers the viewer, then renders the room with everyone's estimates
/// masked while the viewer's own estimate is still the sentinel.
#[instrument(name = "room_page", skip(state, query))]
pub async fn room_page(
    State(state): State<AppState>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let Some(room_id) = uri.path().strip_prefix(ROOM_ROUTE_PREFIX) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let params = parse_query(query.as_deref());
    let username = require_username(&params)?;

    if !state.routes.is_bound(room_id) {
        return Err(AppError::RoomNotFound(room_id.to_string()));
    }
    let room = state
        .registry
        .lookup(room_id)
        .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;

    let viewed = room.view(username);
    let snapshot = room.snapshot();

    let mut estimates: Vec<ParticipantEstimate> = snapshot
        .estimates
        .iter()
        .map(|(name, value)| ParticipantEstimate {
            username: name.clone(),
            estimation: if viewed.hidden {
                SENTINEL_ESTIMATE.to_string()
            } else {
                value.clone()
            },
        })
        .collect();
    estimates.sort_by(|a, b| a.username.cmp(&b.username));

    info!(room_id, username, hidden = viewed.hidden, "Serving room view");

    Ok(Html(render::room_page(&RoomView {
        room_id,
        username,
        description: &snapshot.description,
        own_estimate: &viewed.estimate,
        estimates: &estimates,
    }))
    .into_response())
}

/// Query parsing per the transport contract: the first occurrence of a key
/// wins and values stay verbatim (no percent-decoding; `+` is only turned
/// into a space at render time).
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.unwrap_or_default().split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
    params
}

fn require_username(params: &HashMap<String, String>) -> Result<&str, AppError> {
    match params.get(USERNAME).map(String::as_str) {
        None => Err(AppError::Validation("Please introduce yourself".to_string())),
        Some("") => Err(AppError::Validation(
            "Empty name not allowed. Please introduce yourself".to_string(),
        )),
        Some(username) => Ok(username),
    }
}

fn require_param<'a>(
    params: &'a HashMap<String, String>,
    key: &'static str,
) -> Result<&'a str, AppError> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing {key} parameter")))
}

fn redirect(location: String) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}
