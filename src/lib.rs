/*!
Eventbook API: booking backend for an event-rental business.

Customers submit checkouts (with a payment slip upload), staff move the
resulting orders through a small status machine and assign employees to
them, and customers leave feedback afterwards. Employee availability is
kept consistent with the assignment lists by a single coordinator.
*/

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

pub mod codes;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

/// Shared state threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All versioned API routes, mounted under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    let checkouts = Router::new()
        .route("/checkouts", post(handlers::checkouts::create_checkout))
        .route("/checkouts", get(handlers::checkouts::list_checkouts))
        .route(
            "/checkouts/:id",
            delete(handlers::checkouts::delete_checkout),
        );

    let orders = Router::new()
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route("/orders/:id/assign", put(handlers::orders::assign_employees))
        .route(
            "/orders/user/:user_id",
            get(handlers::orders::list_orders_by_user),
        );

    let employees = Router::new()
        .route("/employees", post(handlers::employees::create_employee))
        .route("/employees", get(handlers::employees::list_employees))
        .route(
            "/employees/available",
            get(handlers::employees::list_available_employees),
        )
        .route("/employees/:id", put(handlers::employees::update_employee))
        .route(
            "/employees/:id",
            delete(handlers::employees::delete_employee),
        );

    let feedback = Router::new()
        .route("/feedback", post(handlers::feedback::create_feedback))
        .route("/feedback", get(handlers::feedback::list_feedback))
        .route("/feedback/:id", delete(handlers::feedback::delete_feedback));

    Router::new()
        .merge(checkouts)
        .merge(orders)
        .merge(employees)
        .merge(feedback)
}

pub async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "eventbook-api",
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

// Request logging middleware
pub async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
