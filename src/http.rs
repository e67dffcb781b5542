//! HTTP transport: health check and prediction endpoint

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

use crate::pipeline::{ErrorKind, InferencePipeline, PipelineError, PredictionResult, StudentProfile};

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: InferencePipeline,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_options: Option<Vec<String>>,
}

/// `PipelineError` rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let detail = self.0.to_string();
        let body = match self.0 {
            PipelineError::InvalidCategory {
                field,
                value,
                valid_options,
            } => ErrorBody {
                kind: ErrorKind::InvalidCategory,
                detail,
                field: Some(field),
                value: Some(serde_json::Value::String(value)),
                valid_options: Some(valid_options),
            },
            PipelineError::InvalidNumeric { field, value } => ErrorBody {
                kind: ErrorKind::InvalidNumeric,
                detail,
                field: Some(field),
                // NaN and infinities have no JSON number form
                value: Some(serde_json::Value::String(value.to_string())),
                valid_options: None,
            },
            PipelineError::PredictionFailure { .. } => ErrorBody {
                kind: ErrorKind::PredictionFailure,
                detail,
                field: None,
                value: None,
                valid_options: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub fn router(state: ApiState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/predict", post(predict))
        .with_state(state)
        .layer(cors)
}

/// Serve until ctrl-c
pub async fn serve(
    addr: SocketAddr,
    state: ApiState,
    cors: CorsLayer,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(state, cors);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                error!(%error, "failed to listen for shutdown");
            }
        })
        .await?;

    info!("server stopped");
    Ok(())
}

/// `*` anywhere in the list allows any origin, otherwise a comma-separated list
pub fn cors_layer(allowed: &str) -> CorsLayer {
    let cors = if allowed.split(',').any(|origin| origin.trim() == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = allowed
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect::<Vec<_>>();
        if origins.is_empty() {
            warn!(allowed, "no valid CORS origins, cross-origin requests will be refused");
        }
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    cors.allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

async fn health() -> Json<HealthResponse> {
    // artifacts are loaded before the listener binds
    Json(HealthResponse {
        status: "running",
        model_loaded: true,
    })
}

async fn predict(
    State(state): State<ApiState>,
    Json(profile): Json<StudentProfile>,
) -> Result<Json<PredictionResult>, ApiError> {
    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.predict(&profile))
        .await
        .map_err(|join| PipelineError::prediction_failure(join.to_string()))??;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> ApiState {
        ApiState {
            pipeline: InferencePipeline::new(Arc::new(fixtures::artifacts())),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health().await;
        assert_eq!(health.status, "running");
        assert!(health.model_loaded);
    }

    #[tokio::test]
    async fn test_predict_ok() {
        let Json(result) = predict(State(state()), Json(fixtures::sample_profile()))
            .await
            .unwrap();
        assert!((0.0..=100.0).contains(&result.predicted_exam_score));
    }

    #[tokio::test]
    async fn test_invalid_category_is_bad_request() {
        let mut profile = fixtures::sample_profile();
        profile.gender = "Unknown".to_string();

        let response = predict(State(state()), Json(profile))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_category");
        assert_eq!(body["field"], "gender");
        assert_eq!(body["value"], "unknown");
        assert_eq!(
            body["valid_options"],
            serde_json::json!(["female", "male", "other"])
        );
    }

    #[tokio::test]
    async fn test_prediction_failure_is_server_error() {
        let response = ApiError(PipelineError::prediction_failure("shape mismatch")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["kind"], "prediction_failure");
        assert!(body.get("field").is_none());
        assert!(body["detail"].as_str().unwrap().contains("shape mismatch"));
    }

    #[tokio::test]
    async fn test_non_finite_numeric_is_bad_request() {
        let mut profile = fixtures::sample_profile();
        profile.study_hours = f64::INFINITY;

        let response = predict(State(state()), Json(profile))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["field"], "study_hours");
    }

    async fn preflight(cors: CorsLayer, origin: &str) -> Response {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/predict")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        router(state(), cors).oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_cors_allows_listed_origin() {
        let cors = || cors_layer("http://localhost:5173, http://127.0.0.1:5173");

        let response = preflight(cors(), "http://127.0.0.1:5173").await;
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://127.0.0.1:5173"
        );

        let response = preflight(cors(), "http://evil.example").await;
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        for allowed in ["*", "http://localhost:5173, *"] {
            let response = preflight(cors_layer(allowed), "http://anywhere.example").await;
            assert_eq!(
                response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                "*"
            );
        }
    }

    #[tokio::test]
    async fn test_cors_skips_invalid_origins() {
        let response = preflight(
            cors_layer("bad\norigin, http://localhost:5173"),
            "http://localhost:5173",
        )
        .await;
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
    }
}
