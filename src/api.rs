//! REST API handlers: a thin translation layer over the core. Nothing here
//! checks constraints, sequences orders, or does calendar math — it only
//! moves `ScheduleDto` JSON in and out and calls the library.

use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::demo_data::{self, DemoData};
use crate::dto::{ErrorResponse, HealthResponse, InfoResponse, ReflowResultDto, ScheduleDto, VerifyResponse};
use crate::error::EngineError;
use crate::{checker, reflow};

/// Creates the API router. Stateless: every handler is a pure function of
/// its request body plus the library.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        .route("/verify", axum::routing::post(verify_schedule))
        .route("/reflow", axum::routing::post(reflow_schedule))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "wo-reflow",
        version: env!("CARGO_PKG_VERSION"),
        engine: "constraint-repair",
    })
}

/// GET /demo-data - list the available demo scenario sizes.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - generate one of the demo scenarios.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<ScheduleDto>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => {
            let (orders, centers) = demo_data::generate(demo);
            Ok(Json(ScheduleDto::from_domain(&orders, &centers)))
        }
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /verify - classify a schedule's violations without changing it.
async fn verify_schedule(Json(dto): Json<ScheduleDto>) -> Result<Json<VerifyResponse>, ApiError> {
    let (orders, centers) = dto.to_domain()?;
    let violations = tokio::task::spawn_blocking(move || checker::verify(&orders, &centers, None))
        .await
        .expect("verify task panicked");
    Ok(Json(VerifyResponse::from_violations(&violations)))
}

/// POST /reflow - repair a schedule, returning the updated orders, the
/// change log, and the parallel explanation log.
async fn reflow_schedule(Json(dto): Json<ScheduleDto>) -> Result<Json<ReflowResultDto>, ApiError> {
    let (orders, centers) = dto.to_domain()?;
    let result = tokio::task::spawn_blocking(move || reflow::reflow(&orders, &centers))
        .await
        .expect("reflow task panicked")?;
    Ok(Json(ReflowResultDto::from(&result)))
}

/// Maps the library's error taxonomy (plus DTO resolution failures) onto
/// HTTP status codes.
enum ApiError {
    Dto(crate::dto::DtoError),
    Engine(EngineError),
}

impl From<crate::dto::DtoError> for ApiError {
    fn from(e: crate::dto::DtoError) -> Self {
        ApiError::Dto(e)
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Dto(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Engine(EngineError::NotFixable(msg)) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Engine(e @ EngineError::WatchdogExceeded(_)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
