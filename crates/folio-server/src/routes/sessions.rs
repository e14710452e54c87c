use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use folio_core::{QuickAction, SessionSnapshot, SubmitOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub session: SessionView,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct QuickActionRequest {
    /// Short name (`skills`) or the full question text.
    pub action: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/open", post(open_session))
        .route("/{id}/close", post(close_session))
        .route("/{id}/messages", post(submit_message))
        .route(
            "/{id}/quick-actions",
            get(list_quick_actions).post(submit_quick_action),
        )
}

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionView>, StatusCode> {
    let (id, widget) = state
        .sessions
        .insert(state.new_widget())
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!(%id, "chat session created");
    Ok(Json(SessionView {
        id,
        snapshot: widget.snapshot(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    let widget = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionView {
        id,
        snapshot: widget.snapshot(),
    }))
}

async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    let widget = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    widget.open();
    Ok(Json(SessionView {
        id,
        snapshot: widget.snapshot(),
    }))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    let widget = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    widget.close();
    Ok(Json(SessionView {
        id,
        snapshot: widget.snapshot(),
    }))
}

async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, StatusCode> {
    let widget = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let outcome = widget.submit(&body.text).await;
    Ok(Json(SubmitResponse {
        outcome,
        session: SessionView {
            id,
            snapshot: widget.snapshot(),
        },
    }))
}

async fn list_quick_actions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<serde_json::Value>>, StatusCode> {
    let widget = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let actions = widget
        .snapshot()
        .quick_actions
        .into_iter()
        .map(|action| serde_json::json!({ "action": action, "question": action.question() }))
        .collect();
    Ok(Json(actions))
}

async fn submit_quick_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<QuickActionRequest>,
) -> Result<Json<SubmitResponse>, StatusCode> {
    let widget = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let action = QuickAction::from_label(&body.action).ok_or(StatusCode::BAD_REQUEST)?;
    let outcome = widget.submit_quick_action(action).await;
    Ok(Json(SubmitResponse {
        outcome,
        session: SessionView {
            id,
            snapshot: widget.snapshot(),
        },
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if !state.sessions.remove(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    tracing::info!(%id, "chat session ended");
    Ok(Json(serde_json::json!({ "status": "deleted", "id": id })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use folio_core::FolioConfig;
    use folio_provider::{GenerationBackend, GenerationError, OfflineBackend, StubBackend};
    use folio_schema::PortfolioProfile;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::state::AppState;

    struct FixedBackend;

    #[async_trait]
    impl GenerationBackend for FixedBackend {
        async fn generate(&self, _context: &str, _msg: &str) -> Result<String, GenerationError> {
            Ok("Generated answer.".to_string())
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn setup_test_app(backend: Arc<dyn GenerationBackend>) -> Router {
        setup_test_app_with_config(backend, &FolioConfig::default())
    }

    fn setup_test_app_with_config(backend: Arc<dyn GenerationBackend>, config: &FolioConfig) -> Router {
        let state = AppState::new(
            Arc::new(PortfolioProfile::shipped().unwrap()),
            backend,
            config,
        );
        Router::new()
            .nest("/api/sessions", super::router())
            .with_state(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("send request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create(app: &Router) -> String {
        let (status, json) = send(app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_session_has_greeting() {
        let app = setup_test_app(Arc::new(StubBackend::new("gemma2")));
        let (status, json) = send(&app, "POST", "/api/sessions", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["from_assistant"], true);
        assert!(json["messages"][0]["text"]
            .as_str()
            .unwrap()
            .contains("powered by gemma2"));
        assert_eq!(json["is_open"], false);
        assert_eq!(json["quick_actions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_session_refused_at_limit() {
        let mut config = FolioConfig::default();
        config.server.max_sessions = 1;
        let app = setup_test_app_with_config(Arc::new(FixedBackend), &config);

        let id = create(&app).await;
        let (status, _) = send(&app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        create(&app).await;
    }

    #[tokio::test]
    async fn test_submit_message_generated() {
        let app = setup_test_app(Arc::new(FixedBackend));
        let id = create(&app).await;

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/messages"),
            Some(serde_json::json!({ "text": "Hi there" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["outcome"]["status"], "answered");
        assert_eq!(json["outcome"]["source"], "generated");
        assert_eq!(json["outcome"]["message"]["text"], "Generated answer.");
        assert_eq!(json["session"]["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["session"]["last_error"], Value::Null);
    }

    #[tokio::test]
    async fn test_submit_message_falls_back_when_offline() {
        let app = setup_test_app(Arc::new(OfflineBackend));
        let id = create(&app).await;

        let (_, json) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/messages"),
            Some(serde_json::json!({ "text": "contact" })),
        )
        .await;

        assert_eq!(json["outcome"]["source"], "fallback");
        assert!(json["outcome"]["message"]["text"]
            .as_str()
            .unwrap()
            .contains("chawthiri177@gmail.com"));
        assert!(json["session"]["last_error"]
            .as_str()
            .unwrap()
            .starts_with("Unable to connect to AI."));
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let app = setup_test_app(Arc::new(FixedBackend));
        let id = create(&app).await;

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/messages"),
            Some(serde_json::json!({ "text": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["outcome"]["status"], "ignored");
        assert_eq!(json["outcome"]["reason"], "empty_submission");
        assert_eq!(json["session"]["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let app = setup_test_app(Arc::new(FixedBackend));
        let id = create(&app).await;

        let (_, json) = send(&app, "POST", &format!("/api/sessions/{id}/open"), None).await;
        assert_eq!(json["is_open"], true);
        let (_, json) = send(&app, "POST", &format!("/api/sessions/{id}/close"), None).await;
        assert_eq!(json["is_open"], false);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quick_actions_flow() {
        let app = setup_test_app(Arc::new(OfflineBackend));
        let id = create(&app).await;
        let uri = format!("/api/sessions/{id}/quick-actions");

        let (_, json) = send(&app, "GET", &uri, None).await;
        assert_eq!(json[0]["action"], "skills");
        assert_eq!(json[0]["question"], "What are your skills?");

        let (status, json) = send(
            &app,
            "POST",
            &uri,
            Some(serde_json::json!({ "action": "research" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["session"]["messages"][1]["text"], "Show research papers");

        let (_, json) = send(&app, "GET", &uri, None).await;
        assert_eq!(json.as_array().unwrap().len(), 0);

        let (_, json) = send(
            &app,
            "POST",
            &uri,
            Some(serde_json::json!({ "action": "contact" })),
        )
        .await;
        assert_eq!(json["outcome"]["reason"], "quick_actions_expired");
    }

    #[tokio::test]
    async fn test_unknown_quick_action_is_bad_request() {
        let app = setup_test_app(Arc::new(FixedBackend));
        let id = create(&app).await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/quick-actions"),
            Some(serde_json::json!({ "action": "weather" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_sessions_are_not_found() {
        let app = setup_test_app(Arc::new(FixedBackend));
        let missing = uuid::Uuid::new_v4();
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = create(&app).await;
        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
