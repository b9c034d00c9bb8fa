//! Routes

use crate::types::StatusResponse;
use axum::routing::get;
use axum::{Json, Router};

/// Router of the status server
pub fn build_router() -> Router {
    Router::new().route("/status", get(status))
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use axum::http::{header, StatusCode};

    #[tokio::test]
    async fn test_status_body_is_ok() {
        let Json(body) = status().await;
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_status_response_is_json() {
        let response = status().await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }
}
