use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::codes::CodeGenerator;
use crate::db::DbPool;
use crate::entities::{employee, order_assignment};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::storage::{FileStore, UploadedFile};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Phone must not be empty"))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profile_image_url: Option<String>,
    pub availability: bool,
    pub created_at: chrono::DateTime<Utc>,
}

/// Directory of assignable employees.
///
/// Owns employee CRUD and the bulk availability writes used by the
/// assignment coordinator. The coordinator is the only caller of
/// `set_availability`; nothing else mutates the flag.
#[derive(Clone)]
pub struct EmployeeDirectory {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    file_store: Arc<dyn FileStore>,
    codes: Arc<dyn CodeGenerator>,
}

impl EmployeeDirectory {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        file_store: Arc<dyn FileStore>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            db,
            event_sender,
            file_store,
            codes,
        }
    }

    #[instrument(skip(self, request, profile_image), fields(name = %request.name))]
    pub async fn create_employee(
        &self,
        request: CreateEmployeeRequest,
        profile_image: Option<UploadedFile>,
    ) -> Result<EmployeeResponse, ServiceError> {
        request.validate()?;

        let image_path = match profile_image {
            Some(file) => Some(self.file_store.save(&file.bytes, &file.file_name).await?),
            None => None,
        };

        let id = Uuid::new_v4();
        let model = employee::ActiveModel {
            id: Set(id),
            employee_code: Set(self.codes.generate("EMP")),
            name: Set(request.name),
            email: Set(request.email.to_lowercase()),
            phone: Set(request.phone),
            profile_image: Set(image_path.clone()),
            availability: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let inserted = match model.insert(&*self.db).await {
            Ok(inserted) => inserted,
            Err(e) => {
                // The image is already on disk; clean it up so a failed
                // insert leaves no orphan file behind.
                if let Some(path) = image_path {
                    if let Err(del_err) = self.file_store.delete(&path).await {
                        warn!(error = %del_err, "Failed to remove image after insert failure");
                    }
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };

        info!(employee_id = %id, employee_code = %inserted.employee_code, "Employee created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::EmployeeCreated(id)).await {
                warn!(error = %e, "Failed to send employee created event");
            }
        }

        Ok(self.to_response(inserted))
    }

    #[instrument(skip(self, request, profile_image), fields(employee_id = %id))]
    pub async fn update_employee(
        &self,
        id: Uuid,
        request: UpdateEmployeeRequest,
        profile_image: Option<UploadedFile>,
    ) -> Result<EmployeeResponse, ServiceError> {
        request.validate()?;

        let existing = employee::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;

        let old_image = existing.profile_image.clone();
        let mut active: employee::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email.to_lowercase());
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone);
        }

        let replaced_image = if let Some(file) = profile_image {
            let path = self.file_store.save(&file.bytes, &file.file_name).await?;
            active.profile_image = Set(Some(path));
            old_image
        } else {
            None
        };

        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        // Old image is unreferenced now; deletion is best-effort.
        if let Some(path) = replaced_image {
            if let Err(e) = self.file_store.delete(&path).await {
                warn!(error = %e, "Failed to delete replaced profile image");
            }
        }

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::EmployeeUpdated(id)).await {
                warn!(error = %e, "Failed to send employee updated event");
            }
        }

        Ok(self.to_response(updated))
    }

    #[instrument(skip(self), fields(employee_id = %id))]
    pub async fn delete_employee(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = employee::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;

        order_assignment::Entity::delete_many()
            .filter(order_assignment::Column::EmployeeId.eq(id))
            .exec(&*self.db)
            .await?;

        employee::Entity::delete_by_id(id).exec(&*self.db).await?;

        if let Some(path) = existing.profile_image {
            if let Err(e) = self.file_store.delete(&path).await {
                warn!(error = %e, "Failed to delete profile image for removed employee");
            }
        }

        info!(employee_id = %id, "Employee deleted");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::EmployeeDeleted(id)).await {
                warn!(error = %e, "Failed to send employee deleted event");
            }
        }

        Ok(())
    }

    /// All employees, newest first.
    #[instrument(skip(self))]
    pub async fn list_employees(&self) -> Result<Vec<EmployeeResponse>, ServiceError> {
        let employees = employee::Entity::find()
            .order_by_desc(employee::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(employees.into_iter().map(|m| self.to_response(m)).collect())
    }

    /// Employees currently free to assign.
    #[instrument(skip(self))]
    pub async fn list_available_employees(&self) -> Result<Vec<EmployeeResponse>, ServiceError> {
        let employees = employee::Entity::find()
            .filter(employee::Column::Availability.eq(true))
            .order_by_desc(employee::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(employees.into_iter().map(|m| self.to_response(m)).collect())
    }

    /// Resolves the given ids to employee models. Callers compare the
    /// returned count against the requested count to detect unknown ids.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<employee::Model>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let employees = employee::Entity::find()
            .filter(employee::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await?;

        Ok(employees)
    }

    /// Bulk availability update. Atomic per identifier only; the assignment
    /// coordinator handles rollback across the batch.
    #[instrument(skip(self, ids), fields(count = ids.len(), value))]
    pub async fn set_availability(&self, ids: &[Uuid], value: bool) -> Result<u64, ServiceError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = employee::Entity::update_many()
            .col_expr(employee::Column::Availability, Expr::value(value))
            .col_expr(employee::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(employee::Column::Id.is_in(ids.iter().copied()))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }

    pub(crate) fn to_response(&self, model: employee::Model) -> EmployeeResponse {
        EmployeeResponse {
            id: model.id,
            employee_code: model.employee_code,
            name: model.name,
            email: model.email,
            phone: model.phone,
            profile_image_url: model
                .profile_image
                .as_deref()
                .map(|p| self.file_store.resolve_url(p)),
            availability: model.availability,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::TimestampCodeGenerator;
    use crate::test_support::{null_file_store, seed_employee, test_db};

    fn directory(db: DbPool) -> EmployeeDirectory {
        EmployeeDirectory::new(
            Arc::new(db),
            None,
            null_file_store(),
            Arc::new(TimestampCodeGenerator),
        )
    }

    #[tokio::test]
    async fn create_requires_contact_fields() {
        let dir = directory(test_db().await);

        let result = dir
            .create_employee(
                CreateEmployeeRequest {
                    name: "".into(),
                    email: "kasun@example.com".into(),
                    phone: "0712345678".into(),
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn created_employee_starts_available_with_generated_code() {
        let dir = directory(test_db().await);

        let created = dir
            .create_employee(
                CreateEmployeeRequest {
                    name: "Kasun".into(),
                    email: "Kasun@Example.com".into(),
                    phone: "0712345678".into(),
                },
                None,
            )
            .await
            .unwrap();

        assert!(created.availability);
        assert!(created.employee_code.starts_with("EMP-"));
        assert_eq!(created.email, "kasun@example.com");
    }

    #[tokio::test]
    async fn find_by_ids_returns_only_known_employees() {
        let db = test_db().await;
        let e1 = seed_employee(&db, "Amali", true).await;
        let dir = directory(db);

        let found = dir.find_by_ids(&[e1.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, e1.id);
    }

    #[tokio::test]
    async fn set_availability_updates_each_given_id() {
        let db = test_db().await;
        let e1 = seed_employee(&db, "Amali", true).await;
        let e2 = seed_employee(&db, "Ruwan", true).await;
        let e3 = seed_employee(&db, "Dilan", true).await;
        let dir = directory(db);

        let affected = dir.set_availability(&[e1.id, e2.id], false).await.unwrap();
        assert_eq!(affected, 2);

        let available = dir.list_available_employees().await.unwrap();
        let ids: Vec<Uuid> = available.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![e3.id]);
    }

    #[tokio::test]
    async fn delete_unknown_employee_is_not_found() {
        let dir = directory(test_db().await);
        let result = dir.delete_employee(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
