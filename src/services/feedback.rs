use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::feedback;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::storage::{FileStore, UploadedFile};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, message = "Order code is required"))]
    pub order_code: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub order_code: String,
    pub rating: i32,
    pub message: String,
    pub photo_url: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

/// Feedback attached to orders by order code. The reference is soft: an
/// order may be deleted while its feedback stays, and feedback existence is
/// only ever checked per code, never joined.
#[derive(Clone)]
pub struct FeedbackService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    file_store: Arc<dyn FileStore>,
}

impl FeedbackService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        file_store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            db,
            event_sender,
            file_store,
        }
    }

    #[instrument(skip(self, request, photo), fields(order_code = %request.order_code))]
    pub async fn create_feedback(
        &self,
        request: CreateFeedbackRequest,
        photo: Option<UploadedFile>,
    ) -> Result<FeedbackResponse, ServiceError> {
        request.validate()?;

        let photo_path = match photo {
            Some(file) => Some(self.file_store.save(&file.bytes, &file.file_name).await?),
            None => None,
        };

        let id = Uuid::new_v4();
        let model = feedback::ActiveModel {
            id: Set(id),
            order_code: Set(request.order_code),
            rating: Set(request.rating),
            message: Set(request.message),
            photo_path: Set(photo_path.clone()),
            created_at: Set(Utc::now()),
        };

        let inserted = match model.insert(&*self.db).await {
            Ok(inserted) => inserted,
            Err(e) => {
                if let Some(path) = photo_path {
                    if let Err(del_err) = self.file_store.delete(&path).await {
                        warn!(error = %del_err, "Failed to remove photo after insert failure");
                    }
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };

        info!(feedback_id = %id, order_code = %inserted.order_code, "Feedback created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::FeedbackCreated(id)).await {
                warn!(error = %e, "Failed to send feedback created event");
            }
        }

        Ok(self.to_response(inserted))
    }

    /// All feedback, newest first.
    #[instrument(skip(self))]
    pub async fn list_feedback(&self) -> Result<Vec<FeedbackResponse>, ServiceError> {
        let entries = feedback::Entity::find()
            .order_by_desc(feedback::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(entries.into_iter().map(|m| self.to_response(m)).collect())
    }

    #[instrument(skip(self), fields(feedback_id = %id))]
    pub async fn delete_feedback(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = feedback::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Feedback {} not found", id)))?;

        feedback::Entity::delete_by_id(id).exec(&*self.db).await?;

        if let Some(path) = existing.photo_path {
            if let Err(e) = self.file_store.delete(&path).await {
                warn!(error = %e, "Failed to delete photo for removed feedback");
            }
        }

        info!(feedback_id = %id, "Feedback deleted");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::FeedbackDeleted(id)).await {
                warn!(error = %e, "Failed to send feedback deleted event");
            }
        }

        Ok(())
    }

    /// Whether any feedback exists for the given order code.
    pub async fn has_feedback(&self, order_code: &str) -> Result<bool, ServiceError> {
        let count = feedback::Entity::find()
            .filter(feedback::Column::OrderCode.eq(order_code))
            .count(&*self.db)
            .await?;

        Ok(count > 0)
    }

    fn to_response(&self, model: feedback::Model) -> FeedbackResponse {
        FeedbackResponse {
            id: model.id,
            order_code: model.order_code,
            rating: model.rating,
            message: model.message,
            photo_url: model
                .photo_path
                .as_deref()
                .map(|p| self.file_store.resolve_url(p)),
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{null_file_store, test_db};

    fn service(db: sea_orm::DatabaseConnection) -> FeedbackService {
        FeedbackService::new(Arc::new(db), None, null_file_store())
    }

    fn request(order_code: &str, rating: i32) -> CreateFeedbackRequest {
        CreateFeedbackRequest {
            order_code: order_code.into(),
            rating,
            message: "Great service".into(),
        }
    }

    #[tokio::test]
    async fn rating_outside_range_is_rejected() {
        let svc = service(test_db().await);

        assert!(matches!(
            svc.create_feedback(request("OID-1", 0), None).await,
            Err(ServiceError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_feedback(request("OID-1", 6), None).await,
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn has_feedback_tracks_order_code() {
        let svc = service(test_db().await);

        assert!(!svc.has_feedback("OID-xyz").await.unwrap());
        svc.create_feedback(request("OID-xyz", 5), None).await.unwrap();
        assert!(svc.has_feedback("OID-xyz").await.unwrap());
        assert!(!svc.has_feedback("OID-other").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let svc = service(test_db().await);

        let created = svc.create_feedback(request("OID-xyz", 4), None).await.unwrap();
        svc.delete_feedback(created.id).await.unwrap();

        assert!(!svc.has_feedback("OID-xyz").await.unwrap());
        assert!(matches!(
            svc.delete_feedback(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let svc = service(test_db().await);

        svc.create_feedback(request("OID-a", 3), None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        svc.create_feedback(request("OID-b", 5), None).await.unwrap();

        let all = svc.list_feedback().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].order_code, "OID-b");
        assert_eq!(all[1].order_code, "OID-a");
    }
}
