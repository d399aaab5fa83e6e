use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wander_core::{PlainVenue, Venue};
use wander_suggest::{run_query, Position, SessionSnapshot, SuggestionSession};

use crate::middleware::RequestId;

use super::{map_suggest_error, ApiError, ApiResponse, AppState, ResponseMeta, SESSION_HEADER};

#[derive(Debug, Deserialize)]
pub(super) struct CreateSuggestionsRequest {
    pub query: String,
}

/// A venue with every derived detail plus its map-search link.
#[derive(Debug, Serialize)]
pub(super) struct VenueView {
    #[serde(flatten)]
    pub record: PlainVenue,
    pub maps_link: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SuggestionView {
    pub session_id: String,
    pub query: String,
    pub venue: VenueView,
    #[serde(flatten)]
    pub position: Position,
}

type SuggestionReply = Result<Json<ApiResponse<SuggestionView>>, ApiError>;

#[derive(Debug, Clone, Copy)]
enum Step {
    Current,
    Next,
    Previous,
    Restart,
}

impl VenueView {
    fn from_venue(venue: &Venue) -> Self {
        Self {
            record: venue.to_plain_record(),
            maps_link: venue.maps_link(),
        }
    }
}

fn suggestion_view(
    session_id: &str,
    session: &SuggestionSession,
    venue: VenueView,
) -> SuggestionView {
    SuggestionView {
        session_id: session_id.to_string(),
        query: session.query().to_string(),
        venue,
        position: session.navigator().position(),
    }
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn require_session_id<'a>(req_id: &RequestId, headers: &'a HeaderMap) -> Result<&'a str, ApiError> {
    session_id(headers).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("missing {SESSION_HEADER} header"),
        )
    })
}

/// Hydrates the current venue of a fresh session, then stores it.
async fn activate(
    state: &AppState,
    req_id: &RequestId,
    session_id: &str,
    mut session: SuggestionSession,
) -> Result<SuggestionView, ApiError> {
    let venue = session
        .navigator_mut()
        .current(state.details.as_ref())
        .await
        .map(VenueView::from_venue)
        .map_err(|e| map_suggest_error(req_id.0.clone(), &e))?;
    let view = suggestion_view(session_id, &session, venue);
    state.sessions.insert(session_id, session).await;
    Ok(view)
}

/// Runs a new query and replaces the caller's session with its results.
pub(super) async fn create_suggestions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(body): Json<CreateSuggestionsRequest>,
) -> SuggestionReply {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "query must not be empty",
        ));
    }
    let session_id =
        session_id(&headers).map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    let suggestions = run_query(
        state.locator.as_ref(),
        state.search.as_ref(),
        query,
        &state.options,
    )
    .await
    .map_err(|e| map_suggest_error(req_id.0.clone(), &e))?;

    let data = activate(&state, &req_id, &session_id, suggestions.session).await?;
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn current(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> SuggestionReply {
    navigate(&state, req_id, &headers, Step::Current).await
}

pub(super) async fn next(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> SuggestionReply {
    navigate(&state, req_id, &headers, Step::Next).await
}

pub(super) async fn previous(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> SuggestionReply {
    navigate(&state, req_id, &headers, Step::Previous).await
}

pub(super) async fn restart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> SuggestionReply {
    navigate(&state, req_id, &headers, Step::Restart).await
}

async fn navigate(
    state: &AppState,
    req_id: RequestId,
    headers: &HeaderMap,
    step: Step,
) -> SuggestionReply {
    let session_id = require_session_id(&req_id, headers)?;
    let shared = state.sessions.get(session_id).await.ok_or_else(|| {
        ApiError::new(req_id.0.clone(), "not_found", "unknown or expired session")
    })?;

    // Held for the whole transition so concurrent steps on one session
    // serialize.
    let mut session = shared.lock().await;
    let details = state.details.as_ref();
    let navigator = session.navigator_mut();
    let moved = match step {
        Step::Current => navigator.current(details).await,
        Step::Next => navigator.next(details).await,
        Step::Previous => navigator.previous(details).await,
        Step::Restart => navigator.restart(details).await,
    };
    let venue = moved
        .map(VenueView::from_venue)
        .map_err(|e| map_suggest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: suggestion_view(session_id, &session, venue),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn export_snapshot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SessionSnapshot>>, ApiError> {
    let session_id = require_session_id(&req_id, &headers)?;
    let shared = state.sessions.get(session_id).await.ok_or_else(|| {
        ApiError::new(req_id.0.clone(), "not_found", "unknown or expired session")
    })?;
    let data = shared.lock().await.snapshot();
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Restores a previously exported session under the caller's session id.
pub(super) async fn restore_snapshot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(snapshot): Json<SessionSnapshot>,
) -> SuggestionReply {
    let session_id =
        session_id(&headers).map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);
    let session = SuggestionSession::from_snapshot(snapshot)
        .map_err(|e| map_suggest_error(req_id.0.clone(), &e))?;

    let data = activate(&state, &req_id, &session_id, session).await?;
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
