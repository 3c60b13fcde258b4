use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::employees::{
    CreateEmployeeRequest, EmployeeResponse, UpdateEmployeeRequest,
};
use crate::{ApiResponse, AppState};

use super::FormData;

/// Register an employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body(content = CreateEmployeeRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Employee created", body = ApiResponse<EmployeeResponse>),
        (status = 400, description = "Invalid employee data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<EmployeeResponse>>), ServiceError> {
    let mut form = FormData::read(multipart).await?;

    let request = CreateEmployeeRequest {
        name: form.required("name")?,
        email: form.required("email")?,
        phone: form.required("phone")?,
    };
    let profile_image = form.file("profile_image");

    let created = state
        .services
        .employees
        .create_employee(request, profile_image)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Update an employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body(content = UpdateEmployeeRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Employee updated", body = ApiResponse<EmployeeResponse>),
        (status = 400, description = "Invalid employee data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<EmployeeResponse>>, ServiceError> {
    let mut form = FormData::read(multipart).await?;

    let request = UpdateEmployeeRequest {
        name: form.optional("name"),
        email: form.optional("email"),
        phone: form.optional("phone"),
    };
    let profile_image = form.file("profile_image");

    let updated = state
        .services
        .employees
        .update_employee(id, request, profile_image)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Remove an employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.employees.delete_employee(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

/// List all employees
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses(
        (status = 200, description = "Employees retrieved", body = ApiResponse<Vec<EmployeeResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<EmployeeResponse>>>, ServiceError> {
    let employees = state.services.employees.list_employees().await?;
    Ok(Json(ApiResponse::success(employees)))
}

/// List available employees
#[utoipa::path(
    get,
    path = "/api/v1/employees/available",
    responses(
        (status = 200, description = "Available employees retrieved", body = ApiResponse<Vec<EmployeeResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn list_available_employees(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<EmployeeResponse>>>, ServiceError> {
    let employees = state.services.employees.list_available_employees().await?;
    Ok(Json(ApiResponse::success(employees)))
}
