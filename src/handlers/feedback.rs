use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::feedback::{CreateFeedbackRequest, FeedbackResponse};
use crate::{ApiResponse, AppState};

use super::FormData;

/// Submit feedback for an order
#[utoipa::path(
    post,
    path = "/api/v1/feedback",
    request_body(content = CreateFeedbackRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Feedback created", body = ApiResponse<FeedbackResponse>),
        (status = 400, description = "Invalid feedback data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "feedback"
)]
pub async fn create_feedback(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FeedbackResponse>>), ServiceError> {
    let mut form = FormData::read(multipart).await?;

    let request = CreateFeedbackRequest {
        order_code: form.required("order_code")?,
        rating: form.parse("rating")?,
        message: form.required("message")?,
    };
    let photo = form.file("photo");

    let created = state
        .services
        .feedback
        .create_feedback(request, photo)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List all feedback
#[utoipa::path(
    get,
    path = "/api/v1/feedback",
    responses(
        (status = 200, description = "Feedback retrieved", body = ApiResponse<Vec<FeedbackResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "feedback"
)]
pub async fn list_feedback(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FeedbackResponse>>>, ServiceError> {
    let feedback = state.services.feedback.list_feedback().await?;
    Ok(Json(ApiResponse::success(feedback)))
}

/// Delete feedback
#[utoipa::path(
    delete,
    path = "/api/v1/feedback/{id}",
    params(("id" = Uuid, Path, description = "Feedback id")),
    responses(
        (status = 200, description = "Feedback deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Feedback not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "feedback"
)]
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.feedback.delete_feedback(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
