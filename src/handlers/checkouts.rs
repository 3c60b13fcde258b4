use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::orders::{CreateCheckoutRequest, OrderResponse};
use crate::{ApiResponse, AppState};

use super::FormData;

/// Submit a checkout
///
/// Accepts the booking form as multipart so the payment slip can ride along
/// with the order fields.
#[utoipa::path(
    post,
    path = "/api/v1/checkouts",
    request_body(content = CreateCheckoutRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Checkout created", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid checkout data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "checkouts"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let mut form = FormData::read(multipart).await?;

    let request = CreateCheckoutRequest {
        user_id: form.parse_optional("user_id")?,
        first_name: form.required("first_name")?,
        last_name: form.required("last_name")?,
        email: form.required("email")?,
        address: form.optional("address"),
        telephone: form.optional("telephone"),
        mobile: form.required("mobile")?,
        contact_method: form.optional("contact_method"),
        guest_count: form.optional("guest_count"),
        event_date: form.parse("event_date")?,
        comment: form.optional("comment"),
        cart_total: form.parse("cart_total")?,
        advance_payment: form.parse("advance_payment")?,
    };
    let slip = form.file("slip");

    let created = state.services.orders.create_checkout(request, slip).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List all checkouts
#[utoipa::path(
    get,
    path = "/api/v1/checkouts",
    responses(
        (status = 200, description = "Checkouts retrieved", body = ApiResponse<Vec<OrderResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "checkouts"
)]
pub async fn list_checkouts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let checkouts = state.services.orders.list_checkouts().await?;
    Ok(Json(ApiResponse::success(checkouts)))
}

/// Delete a checkout
///
/// Releases any assigned employees and removes the stored payment slip.
#[utoipa::path(
    delete,
    path = "/api/v1/checkouts/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Checkout deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "checkouts"
)]
pub async fn delete_checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.orders.delete_checkout(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
