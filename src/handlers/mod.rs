pub mod checkouts;
pub mod employees;
pub mod feedback;
pub mod orders;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::Multipart;

use crate::codes::CodeGenerator;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::assignment::AssignmentService;
use crate::services::employees::EmployeeDirectory;
use crate::services::feedback::FeedbackService;
use crate::services::orders::OrderService;
use crate::storage::{FileStore, UploadedFile};

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub employees: Arc<EmployeeDirectory>,
    pub assignment: Arc<AssignmentService>,
    pub feedback: Arc<FeedbackService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        file_store: Arc<dyn FileStore>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        let employees = Arc::new(EmployeeDirectory::new(
            db.clone(),
            event_sender.clone(),
            file_store.clone(),
            codes.clone(),
        ));
        let feedback = Arc::new(FeedbackService::new(
            db.clone(),
            event_sender.clone(),
            file_store.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            db.clone(),
            event_sender.clone(),
            file_store,
            codes,
            employees.clone(),
            feedback.clone(),
        ));
        let assignment = Arc::new(AssignmentService::new(db, employees.clone(), event_sender));

        Self {
            orders,
            employees,
            assignment,
            feedback,
        }
    }
}

/// A parsed multipart form: text fields by name, plus uploaded files by
/// field name.
pub(crate) struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Drains the multipart stream. Fields carrying a filename become
    /// uploads; everything else is treated as text.
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, ServiceError> {
        let mut fields = HashMap::new();
        let mut files = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::InvalidInput(format!("Malformed multipart body: {}", e)))?
        {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            if let Some(file_name) = field.file_name().map(|n| n.to_string()) {
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::InvalidInput(format!("Failed to read upload '{}': {}", name, e))
                })?;
                // An empty file input submits a part with no content.
                if !bytes.is_empty() {
                    files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
            } else {
                let text = field.text().await.map_err(|e| {
                    ServiceError::InvalidInput(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.insert(name, text);
            }
        }

        Ok(Self { fields, files })
    }

    pub(crate) fn required(&self, name: &str) -> Result<String, ServiceError> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ServiceError::InvalidInput(format!("Missing field '{}'", name)))
    }

    pub(crate) fn optional(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn parse<T: FromStr>(&self, name: &str) -> Result<T, ServiceError> {
        self.required(name)?
            .parse()
            .map_err(|_| ServiceError::InvalidInput(format!("Invalid value for field '{}'", name)))
    }

    pub(crate) fn parse_optional<T: FromStr>(&self, name: &str) -> Result<Option<T>, ServiceError> {
        match self.optional(name) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ServiceError::InvalidInput(format!("Invalid value for field '{}'", name))),
            None => Ok(None),
        }
    }

    pub(crate) fn file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
