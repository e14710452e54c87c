use axum::{extract::State, routing::get, Json, Router};
use folio_core::compile_context;
use folio_schema::PortfolioProfile;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/context", get(get_context))
}

async fn get_profile(State(state): State<AppState>) -> Json<PortfolioProfile> {
    Json(state.profile.as_ref().clone())
}

async fn get_context(State(state): State<AppState>) -> String {
    compile_context(&state.profile)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use folio_core::FolioConfig;
    use folio_provider::StubBackend;
    use tower::util::ServiceExt;

    use super::*;

    fn setup_test_app() -> Router {
        let state = AppState::new(
            Arc::new(PortfolioProfile::shipped().unwrap()),
            Arc::new(StubBackend::new("stub")),
            &FolioConfig::default(),
        );
        Router::new().nest("/api", super::router()).with_state(state)
    }

    #[tokio::test]
    async fn test_get_profile() {
        let response = setup_test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/profile")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("send request");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["identity"]["email"], "chawthiri177@gmail.com");
        assert_eq!(json["projects"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn test_get_context() {
        let response = setup_test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/context")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("send request");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("You are an AI assistant"));
        assert!(text.contains("PERSONAL INFO:"));
    }
}
