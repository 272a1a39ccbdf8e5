//! HTTP front-end.
//!
//! The model is loaded once before the listener is bound and shared
//! read-only with every handler through [`AppState`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::config::ServeConfig;
use crate::error::{Error, Result};
use crate::schema::{FeatureVector, FEATURE_NAMES};
use crate::store::ModelArtifact;

pub const HOME_MESSAGE: &str = "Diabetes Prediction API";

#[derive(Clone)]
pub struct AppState {
    model: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        AppState { model }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failures, mapped onto status codes.
#[derive(Debug)]
pub enum ApiError {
    InvalidFeatures(Error),
    Prediction(Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, err) = match self {
            ApiError::InvalidFeatures(e) => (StatusCode::UNPROCESSABLE_ENTITY, e),
            ApiError::Prediction(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
        };
        (
            status,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .with_state(state)
}

async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: HOME_MESSAGE.to_string(),
    })
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let features = FeatureVector::try_from(req.features).map_err(|e| {
        warn!(error = %e, "rejected prediction request");
        ApiError::InvalidFeatures(e)
    })?;

    let prediction = state.model.predict_one(&features).map_err(|e| {
        error!(error = %e, "prediction failed");
        ApiError::Prediction(e)
    })?;

    debug!(prediction, "served prediction");
    Ok(Json(PredictResponse { prediction }))
}

/// Loads the model at `config.model_path` and serves until Ctrl-C.
pub async fn serve(config: &ServeConfig) -> Result<()> {
    let model = ModelArtifact::load_for_schema(&config.model_path, &FEATURE_NAMES)?;
    let app = router(AppState::new(Arc::new(model)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "prediction service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Serve)?;

    info!("prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
