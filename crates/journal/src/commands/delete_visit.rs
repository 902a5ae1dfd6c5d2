use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct DeleteVisitPayload {
    pub history_id: i64,
    pub teacher_guid: Uuid,
    pub is_privileged: bool,
}

/// Reverses a visit grant. Only the granting teacher or a privileged
/// caller may delete, and only within the deletion window.
pub struct DeleteVisitCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> DeleteVisitCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: DeleteVisitPayload) -> Result<()> {
        self.execute_at(payload, calendar::today()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit reference day.
    pub async fn execute_at(&self, payload: DeleteVisitPayload, today: NaiveDate) -> Result<()> {
        let record = self
            .store
            .visit(payload.history_id)
            .await?
            .ok_or(JournalError::HistoryNotFound(payload.history_id))?;

        if payload.teacher_guid != record.teacher_guid && !payload.is_privileged {
            return Err(JournalError::TeacherMismatch);
        }

        if calendar::is_expired(
            record.date,
            today,
            self.config.days_to_delete_points,
            payload.is_privileged,
        ) {
            return Err(JournalError::HistoryDeleteExpired(record.date));
        }

        let mut ledger = self
            .store
            .student(record.student_guid)
            .await?
            .ok_or(JournalError::StudentNotFound(record.student_guid))?;

        // recount from the remaining records rather than decrementing
        ledger.visits = self
            .store
            .list_visits(record.student_guid)
            .await?
            .iter()
            .filter(|v| v.id != record.id)
            .count() as i32;

        self.store.remove_visit(&ledger, record.id).await
    }
}
