// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::trip::{PhotoService, TripPlanner, TripRequest};

/// Handler dependencies, constructed in main and injected
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
    pub photos: Option<Arc<PhotoService>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/trip/plan", post(plan_trip))
        .route("/api/poi/photos", post(poi_photos))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    port: u16,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn plan_trip(State(state): State<AppState>, Json(request): Json<TripRequest>) -> Json<Value> {
    let request_id = Uuid::new_v4();
    log::info!(
        "[{}] Plan request: {} days in {}",
        request_id,
        request.travel_days,
        request.city
    );

    // plan_trip never fails; internal failures resolve to the fallback plan
    let plan = state.planner.plan_trip(&request).await;

    log::info!("[{}] Plan ready: {} days", request_id, plan.days.len());
    Json(serde_json::to_value(&plan).unwrap_or_else(|e| json!({ "error": e.to_string() })))
}

#[derive(Debug, Deserialize)]
struct PhotoBatchRequest {
    names: Vec<String>,
}

async fn poi_photos(
    State(state): State<AppState>,
    Json(request): Json<PhotoBatchRequest>,
) -> Json<Value> {
    let Some(photos) = &state.photos else {
        return Json(json!({ "error": "Photo lookup is not configured" }));
    };

    let urls = photos.batch_photo_urls(&request.names).await;
    Json(json!({ "photos": urls }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, ToolError};
    use crate::model::{ChatMessage, Model};
    use crate::trip::PhotoSource;
    use async_trait::async_trait;

    struct NoopModel;

    #[async_trait]
    impl Model for NoopModel {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    struct FixedSource;

    #[async_trait]
    impl PhotoSource for FixedSource {
        async fn search_photo(&self, _query: &str) -> Result<Option<String>, ToolError> {
            Ok(Some("https://img.test/fixed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_health_check_shape() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_poi_photos_without_key_reports_error() {
        let state = AppState {
            planner: Arc::new(TripPlanner::new(
                Arc::new(NoopModel),
                crate::tool::ToolAdapter::new(),
            )),
            photos: None,
        };

        let Json(body) = poi_photos(
            State(state),
            Json(PhotoBatchRequest {
                names: vec!["x".to_string()],
            }),
        )
        .await;

        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_poi_photos_returns_batch_map() {
        let state = AppState {
            planner: Arc::new(TripPlanner::new(
                Arc::new(NoopModel),
                crate::tool::ToolAdapter::new(),
            )),
            photos: Some(Arc::new(PhotoService::new(Arc::new(FixedSource)))),
        };

        let Json(body) = poi_photos(
            State(state),
            Json(PhotoBatchRequest {
                names: vec!["Forbidden City".to_string(), "Summer Palace".to_string()],
            }),
        )
        .await;

        let photos = body["photos"].as_object().unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos["Forbidden City"], "https://img.test/fixed");
    }
}
