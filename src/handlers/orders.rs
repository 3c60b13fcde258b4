use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::orders::{OrderResponse, UpdateOrderStatusRequest};
use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignEmployeesRequest {
    /// Employees to assign, in display order. Replaces the current list.
    #[validate(length(min = 1, message = "At least one employee id is required"))]
    pub employee_ids: Vec<Uuid>,
}

/// Get a single order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Update an order's status
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Unrecognized status value", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order modified concurrently", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    request.validate()?;
    let updated = state
        .services
        .orders
        .update_status(id, &request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Assign employees to an order
///
/// Replaces the order's assignment list: requested employees are reserved,
/// dropped ones released.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/assign",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AssignEmployeesRequest,
    responses(
        (status = 200, description = "Employees assigned", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Empty request or unknown employee ids", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order modified concurrently", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn assign_employees(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignEmployeesRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let outcome = state
        .services
        .assignment
        .assign(id, request.employee_ids)
        .await?;

    let employees = state.services.orders.employees_to_responses(outcome.employees);
    let response = state
        .services
        .orders
        .to_response(outcome.order, employees, None);
    Ok(Json(ApiResponse::success(response)))
}

/// List a user's orders
///
/// Order history for the given user, newest first, each entry flagged with
/// whether feedback already exists.
#[utoipa::path(
    get,
    path = "/api/v1/orders/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<OrderResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state.services.orders.list_orders_by_user(user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}
