mod suggestions;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wander_core::{DetailProvider, LocationProvider, SuggestError, VenueSearchProvider};
use wander_suggest::QueryOptions;

use crate::middleware::{request_id, RequestId};
use crate::sessions::SessionStore;

/// Header carrying the caller's session id.
pub(crate) const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AppState {
    pub locator: Arc<dyn LocationProvider>,
    pub search: Arc<dyn VenueSearchProvider>,
    pub details: Arc<dyn DetailProvider>,
    pub sessions: SessionStore,
    pub options: Arc<QueryOptions>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    sessions: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" | "no_results" | "provider_unavailable" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            "quota_exceeded" => StatusCode::TOO_MANY_REQUESTS,
            "timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Converts a suggestion failure into one of the two user-facing messages.
pub(super) fn map_suggest_error(request_id: String, error: &SuggestError) -> ApiError {
    let code = match error {
        SuggestError::QuotaExceeded { .. } => "quota_exceeded",
        SuggestError::Timeout { .. } => "timeout",
        SuggestError::NoResults => "no_results",
        SuggestError::ProviderUnavailable { .. } => "provider_unavailable",
    };
    tracing::warn!(error = %error, code, "suggestion request failed");
    ApiError::new(request_id, code, error.user_message())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(SESSION_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/suggestions",
            post(suggestions::create_suggestions),
        )
        .route("/api/v1/suggestions/current", get(suggestions::current))
        .route("/api/v1/suggestions/next", post(suggestions::next))
        .route("/api/v1/suggestions/previous", post(suggestions::previous))
        .route("/api/v1/suggestions/restart", post(suggestions::restart))
        .route(
            "/api/v1/suggestions/snapshot",
            get(suggestions::export_snapshot).put(suggestions::restore_snapshot),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            sessions: state.sessions.active_count().await,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wander_core::{DetailPayload, LocationRecord, RawVenue, SearchParams, VenueLocation};

    use super::*;

    struct FakeLocator;

    #[async_trait]
    impl LocationProvider for FakeLocator {
        async fn lookup_location(&self) -> Result<LocationRecord, SuggestError> {
            Ok(LocationRecord {
                city: "Berkeley".to_string(),
                latitude: 37.8716,
                longitude: -122.2727,
                ..LocationRecord::default()
            })
        }
    }

    struct FakeSearch(Result<Vec<RawVenue>, SuggestError>);

    #[async_trait]
    impl VenueSearchProvider for FakeSearch {
        async fn search_venues(
            &self,
            _location: &LocationRecord,
            _params: &SearchParams,
        ) -> Result<Vec<RawVenue>, SuggestError> {
            self.0.clone()
        }
    }

    /// Answers with a description until `allowed` calls have been made, then
    /// reports an exhausted quota.
    #[derive(Default)]
    struct FakeDetails {
        allowed: Option<usize>,
        calls: AtomicUsize,
    }

    impl FakeDetails {
        fn quota_after(allowed: usize) -> Self {
            Self {
                allowed: Some(allowed),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DetailProvider for FakeDetails {
        async fn fetch_details(&self, venue_id: &str) -> Result<DetailPayload, SuggestError> {
            let made = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.allowed.is_some_and(|allowed| made >= allowed) {
                return Err(SuggestError::quota("foursquare", "429"));
            }
            Ok(DetailPayload {
                description: Some(format!("about {venue_id}")),
                ..DetailPayload::default()
            })
        }
    }

    fn raw(id: &str, lat: f64) -> RawVenue {
        RawVenue {
            id: id.to_string(),
            name: id.to_uppercase(),
            location: VenueLocation {
                lat,
                lng: -122.2727,
                formatted_address: vec!["Berkeley, CA".to_string()],
            },
        }
    }

    fn app_with(search: Result<Vec<RawVenue>, SuggestError>, details: FakeDetails) -> Router {
        build_app(AppState {
            locator: Arc::new(FakeLocator),
            search: Arc::new(FakeSearch(search)),
            details: Arc::new(details),
            sessions: SessionStore::new(Duration::from_secs(60)),
            options: Arc::new(QueryOptions {
                search_attempts: 1,
                ..QueryOptions::default()
            }),
        })
    }

    fn app() -> Router {
        app_with(
            Ok(vec![raw("a", 37.872), raw("b", 37.880)]),
            FakeDetails::default(),
        )
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json parse")
        };
        (status, json)
    }

    async fn create(app: &Router, session: &str) -> Value {
        let (status, json) = send(
            app,
            Method::POST,
            "/api/v1/suggestions",
            Some(session),
            Some(json!({ "query": "coffee" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("quota_exceeded", StatusCode::TOO_MANY_REQUESTS),
            ("timeout", StatusCode::GATEWAY_TIMEOUT),
            ("no_results", StatusCode::NOT_FOUND),
            ("provider_unavailable", StatusCode::NOT_FOUND),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("something_else", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "msg").into_response();
            assert_eq!(response.status(), expected, "{code}");
        }
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (status, json) = send(&app(), Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["sessions"], 0);
        assert!(json["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn create_starts_at_the_first_hydrated_venue() {
        let json = create(&app(), "s1").await;
        let data = &json["data"];
        assert_eq!(data["session_id"], "s1");
        assert_eq!(data["query"], "coffee");
        assert_eq!(data["position"], 0);
        assert_eq!(data["total"], 2);
        assert_eq!(data["has_previous"], false);
        assert_eq!(data["has_next"], true);
        assert_eq!(data["venue"]["hydrated"], true);
        let id = data["venue"]["id"].as_str().expect("id");
        assert_eq!(data["venue"]["description"], format!("about {id}"));
        assert_eq!(data["venue"]["hours"], "Hours not listed");
        assert!(data["venue"]["maps_link"]
            .as_str()
            .expect("maps link")
            .starts_with("https://www.google.com/maps/search/?api=1&query="));
    }

    #[tokio::test]
    async fn create_without_session_header_issues_one() {
        let (status, json) = send(
            &app(),
            Method::POST,
            "/api/v1/suggestions",
            None,
            Some(json!({ "query": "coffee" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = json["data"]["session_id"].as_str().expect("session id");
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn navigation_clamps_at_both_ends() {
        let app = app();
        create(&app, "s1").await;

        let (_, json) =
            send(&app, Method::POST, "/api/v1/suggestions/next", Some("s1"), None).await;
        assert_eq!(json["data"]["position"], 1);
        assert_eq!(json["data"]["has_next"], false);

        let (_, json) =
            send(&app, Method::POST, "/api/v1/suggestions/next", Some("s1"), None).await;
        assert_eq!(json["data"]["position"], 1);

        let (_, json) =
            send(&app, Method::POST, "/api/v1/suggestions/previous", Some("s1"), None).await;
        assert_eq!(json["data"]["position"], 0);

        let (_, json) =
            send(&app, Method::POST, "/api/v1/suggestions/previous", Some("s1"), None).await;
        assert_eq!(json["data"]["position"], 0);
        assert_eq!(json["data"]["has_previous"], false);
    }

    #[tokio::test]
    async fn restart_and_current_report_the_cursor() {
        let app = app();
        create(&app, "s1").await;
        send(&app, Method::POST, "/api/v1/suggestions/next", Some("s1"), None).await;

        let (_, json) =
            send(&app, Method::GET, "/api/v1/suggestions/current", Some("s1"), None).await;
        assert_eq!(json["data"]["position"], 1);

        let (_, json) =
            send(&app, Method::POST, "/api/v1/suggestions/restart", Some("s1"), None).await;
        assert_eq!(json["data"]["position"], 0);
    }

    #[tokio::test]
    async fn sessions_do_not_share_cursors() {
        let app = app();
        create(&app, "s1").await;
        create(&app, "s2").await;
        send(&app, Method::POST, "/api/v1/suggestions/next", Some("s1"), None).await;

        let (_, json) =
            send(&app, Method::GET, "/api/v1/suggestions/current", Some("s2"), None).await;
        assert_eq!(json["data"]["position"], 0);
    }

    #[tokio::test]
    async fn search_quota_is_429_with_retry_later_message() {
        let app = app_with(
            Err(SuggestError::quota("foursquare", "quota_exceeded")),
            FakeDetails::default(),
        );
        let (status, json) = send(
            &app,
            Method::POST,
            "/api/v1/suggestions",
            Some("s1"),
            Some(json!({ "query": "coffee" })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "quota_exceeded");
        assert_eq!(
            json["error"]["message"],
            SuggestError::quota("foursquare", "quota_exceeded").user_message()
        );

        let (status, _) =
            send(&app, Method::GET, "/api/v1/suggestions/current", Some("s1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "no session is stored on failure");
    }

    #[tokio::test]
    async fn empty_search_is_404_no_results() {
        let app = app_with(Ok(Vec::new()), FakeDetails::default());
        let (status, json) = send(
            &app,
            Method::POST,
            "/api/v1/suggestions",
            None,
            Some(json!({ "query": "unicorn stables" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "no_results");
    }

    #[tokio::test]
    async fn blank_query_is_bad_request() {
        let (status, json) = send(
            &app(),
            Method::POST,
            "/api/v1/suggestions",
            None,
            Some(json!({ "query": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn navigation_requires_a_known_session() {
        let app = app();
        let (status, json) =
            send(&app, Method::POST, "/api/v1/suggestions/next", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "bad_request");

        let (status, json) =
            send(&app, Method::POST, "/api/v1/suggestions/next", Some("nope"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn detail_quota_leaves_the_cursor_in_place() {
        let app = app_with(
            Ok(vec![raw("a", 37.872), raw("b", 37.880)]),
            FakeDetails::quota_after(1),
        );
        let json = create(&app, "s1").await;
        let first = json["data"]["venue"]["id"].clone();

        let (status, json) =
            send(&app, Method::POST, "/api/v1/suggestions/next", Some("s1"), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "quota_exceeded");

        let (status, json) =
            send(&app, Method::GET, "/api/v1/suggestions/current", Some("s1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["position"], 0);
        assert_eq!(json["data"]["venue"]["id"], first);
    }

    #[tokio::test]
    async fn snapshot_export_and_restore() {
        let app = app();
        create(&app, "s1").await;
        send(&app, Method::POST, "/api/v1/suggestions/next", Some("s1"), None).await;

        let (status, json) =
            send(&app, Method::GET, "/api/v1/suggestions/snapshot", Some("s1"), None).await;
        assert_eq!(status, StatusCode::OK);
        let snapshot = json["data"].clone();
        assert_eq!(snapshot["query"], "coffee");
        assert_eq!(snapshot["cursor"], 1);
        assert_eq!(snapshot["ordered_sequence"].as_array().map(Vec::len), Some(2));

        let (status, json) = send(
            &app,
            Method::PUT,
            "/api/v1/suggestions/snapshot",
            Some("s9"),
            Some(snapshot.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["session_id"], "s9");
        assert_eq!(json["data"]["position"], 1);
        assert_eq!(
            json["data"]["venue"]["id"],
            snapshot["ordered_sequence"][1]["id"]
        );
    }
}
