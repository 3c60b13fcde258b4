use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Eventbook API",
        version = "1.0.0",
        description = r#"
Booking backend for an event-rental business: checkout submissions with
payment slips, order lifecycle management, employee assignment, and
post-order customer feedback.

Error responses share one shape:

```json
{
  "error": "Bad Request",
  "message": "Invalid status: Unrecognized status 'Shipped'",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "checkouts", description = "Checkout submission and listing"),
        (name = "orders", description = "Order lifecycle and employee assignment"),
        (name = "employees", description = "Employee directory"),
        (name = "feedback", description = "Customer feedback"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::checkouts::create_checkout,
        crate::handlers::checkouts::list_checkouts,
        crate::handlers::checkouts::delete_checkout,

        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::assign_employees,
        crate::handlers::orders::list_orders_by_user,

        crate::handlers::employees::create_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,
        crate::handlers::employees::list_employees,
        crate::handlers::employees::list_available_employees,

        crate::handlers::feedback::create_feedback,
        crate::handlers::feedback::list_feedback,
        crate::handlers::feedback::delete_feedback,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            crate::services::orders::CreateCheckoutRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderResponse,
            crate::handlers::orders::AssignEmployeesRequest,

            crate::services::employees::CreateEmployeeRequest,
            crate::services::employees::UpdateEmployeeRequest,
            crate::services::employees::EmployeeResponse,

            crate::services::feedback::CreateFeedbackRequest,
            crate::services::feedback::FeedbackResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
