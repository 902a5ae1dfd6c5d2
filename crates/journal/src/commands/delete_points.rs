use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct DeletePointsPayload {
    pub history_id: i64,
    pub teacher_guid: Uuid,
    pub is_privileged: bool,
}

/// Reverses an activity-points grant.
pub struct DeletePointsCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> DeletePointsCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: DeletePointsPayload) -> Result<()> {
        self.execute_at(payload, calendar::today()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit reference day.
    pub async fn execute_at(&self, payload: DeletePointsPayload, today: NaiveDate) -> Result<()> {
        let record = self
            .store
            .activity(payload.history_id)
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

        ledger.activity_points = self
            .store
            .list_activities(record.student_guid)
            .await?
            .iter()
            .filter(|a| a.id != record.id)
            .map(|a| a.points)
            .sum();

        self.store.remove_activity(&ledger, record.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{fixture, today};
    use crate::commands::{AddPointsCommand, AddPointsPayload};
    use crate::models::WorkType;

    #[tokio::test]
    async fn accumulator_matches_remaining_records_exactly() {
        let f = fixture().await;
        let add = AddPointsCommand::new(&f.store, &f.config);
        for _ in 0..3 {
            add.execute_at(
                AddPointsPayload {
                    student_guid: f.student_guid,
                    teacher_guid: f.teacher_guid,
                    date: today(),
                    points: 10,
                    work_type: WorkType::Competition,
                    comment: None,
                    is_privileged: false,
                },
                today(),
            )
            .await
            .unwrap();
        }

        let id = f.store.list_activities(f.student_guid).await.unwrap()[1].id;
        let del = DeletePointsCommand::new(&f.store, &f.config);
        del.execute_at(
            DeletePointsPayload {
                history_id: id,
                teacher_guid: f.teacher_guid,
                is_privileged: false,
            },
            today(),
        )
        .await
        .unwrap();

        let ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(ledger.activity_points, 20);
        assert_eq!(f.store.list_activities(f.student_guid).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn foreign_record_needs_privilege() {
        let f = fixture().await;
        let add = AddPointsCommand::new(&f.store, &f.config);
        add.execute_at(
            AddPointsPayload {
                student_guid: f.student_guid,
                teacher_guid: f.teacher_guid,
                date: today(),
                points: 10,
                work_type: WorkType::Science,
                comment: None,
                is_privileged: false,
            },
            today(),
        )
        .await
        .unwrap();
        let id = f.store.list_activities(f.student_guid).await.unwrap()[0].id;

        let del = DeletePointsCommand::new(&f.store, &f.config);
        let err = del
            .execute_at(
                DeletePointsPayload {
                    history_id: id,
                    teacher_guid: Uuid::new_v4(),
                    is_privileged: false,
                },
                today(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::TeacherMismatch));
    }
}
