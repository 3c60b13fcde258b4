//! Shared helpers for service tests: an in-memory SQLite database with the
//! full schema, plus small fixture builders.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::entities::{checkout, employee};
use crate::errors::ServiceError;
use crate::migrator::Migrator;
use crate::storage::FileStore;

/// Fresh in-memory database with the schema applied. A single-connection
/// pool keeps every query on the same SQLite memory instance.
pub(crate) async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("test database");
    Migrator::up(&db, None).await.expect("test migrations");
    db
}

/// File store stub that records nothing and always succeeds. Service tests
/// that care about real file behavior use `LocalFileStore` with a tempdir.
pub(crate) struct NullFileStore;

#[async_trait::async_trait]
impl FileStore for NullFileStore {
    async fn save(&self, _bytes: &[u8], suggested_name: &str) -> Result<String, ServiceError> {
        Ok(format!("uploads/{}", suggested_name))
    }

    async fn delete(&self, _reference: &str) -> Result<bool, ServiceError> {
        Ok(true)
    }

    fn resolve_url(&self, reference: &str) -> String {
        format!("http://test.local/{}", reference)
    }
}

pub(crate) fn null_file_store() -> Arc<dyn FileStore> {
    Arc::new(NullFileStore)
}

/// Inserts an order row directly, bypassing the service layer.
pub(crate) async fn seed_order(db: &DatabaseConnection, user_id: Option<Uuid>) -> checkout::Model {
    let id = Uuid::new_v4();
    checkout::ActiveModel {
        id: Set(id),
        order_code: Set(format!("OID-test-{}", &id.to_string()[..8])),
        user_id: Set(user_id),
        first_name: Set("Nadia".into()),
        last_name: Set("Perera".into()),
        email: Set("nadia@example.com".into()),
        address: Set(None),
        telephone: Set(None),
        mobile: Set("0771234567".into()),
        contact_method: Set(Some("email".into())),
        guest_count: Set(Some("50-100".into())),
        event_date: Set(Utc::now().date_naive() + chrono::Duration::days(30)),
        comment: Set(None),
        cart_total: Set(Decimal::new(50_000, 2)),
        advance_payment: Set(Decimal::new(10_000, 2)),
        due_payment: Set(Decimal::new(40_000, 2)),
        status: Set("Pending".into()),
        slip_path: Set(None),
        version: Set(1),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("seed order")
}

/// Inserts an employee row directly with the given availability.
pub(crate) async fn seed_employee(
    db: &DatabaseConnection,
    name: &str,
    available: bool,
) -> employee::Model {
    let id = Uuid::new_v4();
    employee::ActiveModel {
        id: Set(id),
        employee_code: Set(format!("EMP-test-{}", &id.to_string()[..8])),
        name: Set(name.into()),
        email: Set(format!("{}@example.com", name.to_lowercase())),
        phone: Set("0712345678".into()),
        profile_image: Set(None),
        availability: Set(available),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("seed employee")
}
