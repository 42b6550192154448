//! HTTP endpoint serving predictions from artifacts loaded once at startup.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

use crate::{NewsCheckError, Predictor};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Predictor>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
}

#[derive(Debug)]
pub struct ApiError(NewsCheckError);

impl From<NewsCheckError> for ApiError {
    fn from(err: NewsCheckError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            NewsCheckError::EmptyInput => StatusCode::BAD_REQUEST,
            _ => {
                error!("Prediction failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(predictor: Arc<Predictor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { predictor })
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "newscheck",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let threshold = state.predictor.threshold();
    let prediction = state.predictor.predict(&payload.text)?;
    let class = prediction.classification(threshold);
    debug!(%prediction, %class, "Classified text");

    Ok(Json(PredictResponse {
        prediction: class.label().to_string(),
        confidence: prediction.confidence(threshold),
    }))
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, predictor: Predictor) -> anyhow::Result<()> {
    let app = router(Arc::new(predictor));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
