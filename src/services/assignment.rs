use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{checkout, employee, order_assignment};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

use super::employees::EmployeeDirectory;

/// Result of a successful assignment: the updated order plus the resolved
/// employee details, in assignment order.
#[derive(Debug)]
pub struct AssignmentOutcome {
    pub order: checkout::Model,
    pub employees: Vec<employee::Model>,
}

/// The single writer of employee availability.
///
/// Availability is a denormalized boolean kept in step with the assignment
/// lists: assigning an order reserves the requested employees (availability
/// = false) and releases the ones dropped from the previous assignment.
/// The final persistence step is guarded by the order's version column; a
/// stale version means another writer got there first, in which case the
/// availability changes are rolled back and the caller sees a conflict.
#[derive(Clone)]
pub struct AssignmentService {
    db: Arc<DbPool>,
    directory: Arc<EmployeeDirectory>,
    event_sender: Option<Arc<EventSender>>,
    // Serializes assignment per order id. Guards against two concurrent
    // assigns interleaving their availability writes for the same order.
    order_locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AssignmentService {
    pub fn new(
        db: Arc<DbPool>,
        directory: Arc<EmployeeDirectory>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            directory,
            event_sender,
            order_locks: Arc::new(DashMap::new()),
        }
    }

    /// Assigns the requested employees to the order, reserving them and
    /// releasing whoever was dropped from the previous assignment.
    #[instrument(skip(self, requested), fields(order_id = %order_id, requested = requested.len()))]
    pub async fn assign(
        &self,
        order_id: Uuid,
        requested: Vec<Uuid>,
    ) -> Result<AssignmentOutcome, ServiceError> {
        let requested = dedupe_preserving_order(requested);
        if requested.is_empty() {
            return Err(ServiceError::InvalidInput(
                "At least one employee id is required".to_string(),
            ));
        }

        let lock = self
            .order_locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let order = checkout::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        self.apply_assignment(order, requested).await
    }

    /// Steps 3–8 of the assignment flow, operating on a previously loaded
    /// order snapshot. The snapshot's version guards the persistence step.
    async fn apply_assignment(
        &self,
        order: checkout::Model,
        requested: Vec<Uuid>,
    ) -> Result<AssignmentOutcome, ServiceError> {
        let order_id = order.id;
        let previous = assigned_employee_ids(&self.db, order_id).await?;

        // Resolve the requested set; unknown ids abort before any mutation.
        let resolved = self.directory.find_by_ids(&requested).await?;
        if resolved.len() < requested.len() {
            let known: HashSet<Uuid> = resolved.iter().map(|e| e.id).collect();
            let missing: Vec<Uuid> = requested
                .iter()
                .copied()
                .filter(|id| !known.contains(id))
                .collect();
            return Err(ServiceError::UnknownEmployees { missing });
        }

        let requested_set: HashSet<Uuid> = requested.iter().copied().collect();
        let to_release: Vec<Uuid> = previous
            .iter()
            .copied()
            .filter(|id| !requested_set.contains(id))
            .collect();

        // Snapshot prior availability of everything we are about to touch,
        // so a failed persistence step can put the flags back.
        let mut prior: Vec<(Uuid, bool)> = resolved
            .iter()
            .map(|e| (e.id, e.availability))
            .collect();
        for model in self.directory.find_by_ids(&to_release).await? {
            prior.push((model.id, model.availability));
        }

        self.directory.set_availability(&requested, false).await?;

        if let Err(e) = self.directory.set_availability(&to_release, true).await {
            self.rollback_availability(&prior).await;
            return Err(e);
        }

        match self.persist_assignment(&order, &requested).await {
            Ok(updated_order) => {
                info!(
                    order_id = %order_id,
                    assigned = requested.len(),
                    released = to_release.len(),
                    "Assignment persisted"
                );

                if let Some(sender) = &self.event_sender {
                    if let Err(e) = sender
                        .send(Event::EmployeesAssigned {
                            order_id,
                            employee_ids: requested.clone(),
                        })
                        .await
                    {
                        warn!(error = %e, order_id = %order_id, "Failed to send assignment event");
                    }
                }

                // Re-read for display so the response reflects the flags
                // just written.
                let employees = self.resolve_in_order(&requested).await?;
                Ok(AssignmentOutcome {
                    order: updated_order,
                    employees,
                })
            }
            Err(e) => {
                self.rollback_availability(&prior).await;
                Err(e)
            }
        }
    }

    /// Replaces the assignment rows and bumps the order version, atomically.
    /// A stale snapshot version matches zero rows and surfaces as a conflict.
    async fn persist_assignment(
        &self,
        order: &checkout::Model,
        requested: &[Uuid],
    ) -> Result<checkout::Model, ServiceError> {
        let txn = self.db.begin().await?;

        order_assignment::Entity::delete_many()
            .filter(order_assignment::Column::OrderId.eq(order.id))
            .exec(&txn)
            .await?;

        for (position, employee_id) in requested.iter().enumerate() {
            order_assignment::ActiveModel {
                order_id: Set(order.id),
                employee_id: Set(*employee_id),
                position: Set(position as i32),
            }
            .insert(&txn)
            .await?;
        }

        let now = Utc::now();
        let update = checkout::Entity::update_many()
            .col_expr(checkout::Column::Version, Expr::value(order.version + 1))
            .col_expr(checkout::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(checkout::Column::Id.eq(order.id))
            .filter(checkout::Column::Version.eq(order.version))
            .exec(&txn)
            .await?;

        if update.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Order {} was modified concurrently",
                order.id
            )));
        }

        txn.commit().await?;

        let mut updated = order.clone();
        updated.version = order.version + 1;
        updated.updated_at = Some(now);
        Ok(updated)
    }

    /// Best-effort restoration of the availability flags captured before
    /// mutation. Failures are logged, never escalated, so the caller always
    /// sees the original error.
    async fn rollback_availability(&self, prior: &[(Uuid, bool)]) {
        let to_free: Vec<Uuid> = prior
            .iter()
            .filter(|(_, available)| *available)
            .map(|(id, _)| *id)
            .collect();
        let to_hold: Vec<Uuid> = prior
            .iter()
            .filter(|(_, available)| !*available)
            .map(|(id, _)| *id)
            .collect();

        if let Err(e) = self.directory.set_availability(&to_free, true).await {
            error!(error = %e, "Availability rollback failed for released employees");
        }
        if let Err(e) = self.directory.set_availability(&to_hold, false).await {
            error!(error = %e, "Availability rollback failed for reserved employees");
        }
    }

    /// Loads employee models in the order the ids were requested.
    async fn resolve_in_order(&self, ids: &[Uuid]) -> Result<Vec<employee::Model>, ServiceError> {
        let models = self.directory.find_by_ids(ids).await?;
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(model) = models.iter().find(|m| m.id == *id) {
                ordered.push(model.clone());
            }
        }
        Ok(ordered)
    }
}

/// Current assignment list for an order, in stored position order.
pub(crate) async fn assigned_employee_ids(
    db: &DbPool,
    order_id: Uuid,
) -> Result<Vec<Uuid>, ServiceError> {
    let rows = order_assignment::Entity::find()
        .filter(order_assignment::Column::OrderId.eq(order_id))
        .order_by_asc(order_assignment::Column::Position)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|r| r.employee_id).collect())
}

fn dedupe_preserving_order(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::TimestampCodeGenerator;
    use crate::test_support::{null_file_store, seed_employee, seed_order, test_db};
    use sea_orm::DatabaseConnection;

    struct Harness {
        db: Arc<DatabaseConnection>,
        directory: Arc<EmployeeDirectory>,
        service: AssignmentService,
    }

    async fn harness() -> Harness {
        let db = Arc::new(test_db().await);
        let directory = Arc::new(EmployeeDirectory::new(
            db.clone(),
            None,
            null_file_store(),
            Arc::new(TimestampCodeGenerator),
        ));
        let service = AssignmentService::new(db.clone(), directory.clone(), None);
        Harness {
            db,
            directory,
            service,
        }
    }

    async fn availability_of(h: &Harness, id: Uuid) -> bool {
        h.directory
            .find_by_ids(&[id])
            .await
            .unwrap()
            .first()
            .expect("employee exists")
            .availability
    }

    #[tokio::test]
    async fn empty_request_is_invalid_input() {
        let h = harness().await;
        let order = seed_order(&h.db, None).await;

        let result = h.service.assign(order.id, vec![]).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let h = harness().await;
        let e1 = seed_employee(&h.db, "Amali", true).await;

        let result = h.service.assign(Uuid::new_v4(), vec![e1.id]).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert!(availability_of(&h, e1.id).await);
    }

    #[tokio::test]
    async fn assigning_free_employees_reserves_them() {
        let h = harness().await;
        let order = seed_order(&h.db, None).await;
        let e1 = seed_employee(&h.db, "Amali", true).await;
        let e2 = seed_employee(&h.db, "Ruwan", true).await;

        let outcome = h.service.assign(order.id, vec![e1.id, e2.id]).await.unwrap();

        assert_eq!(
            outcome.employees.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![e1.id, e2.id]
        );
        assert!(!availability_of(&h, e1.id).await);
        assert!(!availability_of(&h, e2.id).await);
        assert_eq!(outcome.order.version, order.version + 1);

        let stored = assigned_employee_ids(&h.db, order.id).await.unwrap();
        assert_eq!(stored, vec![e1.id, e2.id]);
    }

    #[tokio::test]
    async fn reassignment_releases_dropped_and_reserves_new() {
        // Order has [E1, E2], both unavailable. Assign [E2, E3] where E3 is
        // free. E1 becomes available, E2 stays unavailable, E3 is reserved.
        let h = harness().await;
        let order = seed_order(&h.db, None).await;
        let e1 = seed_employee(&h.db, "Amali", true).await;
        let e2 = seed_employee(&h.db, "Ruwan", true).await;
        let e3 = seed_employee(&h.db, "Dilan", true).await;

        h.service.assign(order.id, vec![e1.id, e2.id]).await.unwrap();
        let outcome = h.service.assign(order.id, vec![e2.id, e3.id]).await.unwrap();

        assert!(availability_of(&h, e1.id).await);
        assert!(!availability_of(&h, e2.id).await);
        assert!(!availability_of(&h, e3.id).await);

        let stored = assigned_employee_ids(&h.db, order.id).await.unwrap();
        assert_eq!(stored, vec![e2.id, e3.id]);
        assert_eq!(
            outcome.employees.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![e2.id, e3.id]
        );
    }

    #[tokio::test]
    async fn assignment_is_idempotent() {
        let h = harness().await;
        let order = seed_order(&h.db, None).await;
        let e1 = seed_employee(&h.db, "Amali", true).await;
        let e2 = seed_employee(&h.db, "Ruwan", true).await;

        h.service.assign(order.id, vec![e1.id, e2.id]).await.unwrap();
        h.service.assign(order.id, vec![e1.id, e2.id]).await.unwrap();

        assert!(!availability_of(&h, e1.id).await);
        assert!(!availability_of(&h, e2.id).await);
        let stored = assigned_employee_ids(&h.db, order.id).await.unwrap();
        assert_eq!(stored, vec![e1.id, e2.id]);
    }

    #[tokio::test]
    async fn unknown_employee_fails_without_touching_anything() {
        let h = harness().await;
        let order = seed_order(&h.db, None).await;
        let e1 = seed_employee(&h.db, "Amali", true).await;
        let ghost = Uuid::new_v4();

        let result = h.service.assign(order.id, vec![e1.id, ghost]).await;

        match result {
            Err(ServiceError::UnknownEmployees { missing }) => {
                assert_eq!(missing, vec![ghost]);
            }
            other => panic!("expected UnknownEmployees, got {:?}", other.map(|_| ())),
        }

        assert!(availability_of(&h, e1.id).await);
        assert!(assigned_employee_ids(&h.db, order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_version_rolls_back_availability() {
        let h = harness().await;
        let order = seed_order(&h.db, None).await;
        let e1 = seed_employee(&h.db, "Amali", true).await;
        let e2 = seed_employee(&h.db, "Ruwan", true).await;

        // Another writer bumps the order version after our snapshot.
        checkout::Entity::update_many()
            .col_expr(checkout::Column::Version, Expr::value(order.version + 1))
            .filter(checkout::Column::Id.eq(order.id))
            .exec(&*h.db)
            .await
            .unwrap();

        let result = h
            .service
            .apply_assignment(order.clone(), vec![e1.id, e2.id])
            .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        // No net effect: flags equal their pre-call values.
        assert!(availability_of(&h, e1.id).await);
        assert!(availability_of(&h, e2.id).await);
        assert!(assigned_employee_ids(&h.db, order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_are_collapsed() {
        let h = harness().await;
        let order = seed_order(&h.db, None).await;
        let e1 = seed_employee(&h.db, "Amali", true).await;

        let outcome = h.service.assign(order.id, vec![e1.id, e1.id]).await.unwrap();
        assert_eq!(outcome.employees.len(), 1);
        assert_eq!(
            assigned_employee_ids(&h.db, order.id).await.unwrap(),
            vec![e1.id]
        );
    }
}
