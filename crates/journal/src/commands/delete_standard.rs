use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct DeleteStandardPayload {
    pub history_id: i64,
    pub teacher_guid: Uuid,
    pub is_privileged: bool,
}

/// Reverses a standards grant. The accumulator is rebuilt from the
/// remaining records and re-clamped, so a previously clamped value
/// stays consistent (naive subtraction would not).
pub struct DeleteStandardCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> DeleteStandardCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: DeleteStandardPayload) -> Result<()> {
        self.execute_at(payload, calendar::today()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit reference day.
    pub async fn execute_at(&self, payload: DeleteStandardPayload, today: NaiveDate) -> Result<()> {
        let record = self
            .store
            .standard(payload.history_id)
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

        let remaining: i32 = self
            .store
            .list_standards(record.student_guid)
            .await?
            .iter()
            .filter(|s| s.id != record.id)
            .map(|s| s.points)
            .sum();
        ledger.standards_points = remaining.min(self.config.max_points_for_standards);

        self.store.remove_standard(&ledger, record.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{Fixture, fixture, today};
    use crate::commands::{AddStandardCommand, AddStandardPayload};
    use crate::models::StandardType;

    async fn grant(f: &Fixture, points: i32) {
        AddStandardCommand::new(&f.store, &f.config)
            .execute_at(
                AddStandardPayload {
                    student_guid: f.student_guid,
                    teacher_guid: f.teacher_guid,
                    date: today(),
                    points,
                    standard_type: StandardType::Other,
                    comment: None,
                    is_privileged: false,
                },
                today(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn clamped_accumulator_stays_consistent_after_delete() {
        let f = fixture().await;
        let mut ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.visits = 15;
        f.store.insert_student(ledger);

        // 4 x 10 points: accumulator clamps at 30
        for _ in 0..4 {
            grant(&f, 10).await;
        }
        let before = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(before.standards_points, 30);

        let id = f.store.list_standards(f.student_guid).await.unwrap()[0].id;
        DeleteStandardCommand::new(&f.store, &f.config)
            .execute_at(
                DeleteStandardPayload {
                    history_id: id,
                    teacher_guid: f.teacher_guid,
                    is_privileged: false,
                },
                today(),
            )
            .await
            .unwrap();

        // 30 points remain on record; the cap still holds, no naive -10
        let after = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(after.standards_points, 30);
    }

    #[tokio::test]
    async fn delete_below_cap_recomputes_the_sum() {
        let f = fixture().await;
        let mut ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        ledger.visits = 15;
        f.store.insert_student(ledger);

        grant(&f, 10).await;
        grant(&f, 5).await;

        let id = f.store.list_standards(f.student_guid).await.unwrap()[0].id;
        DeleteStandardCommand::new(&f.store, &f.config)
            .execute_at(
                DeleteStandardPayload {
                    history_id: id,
                    teacher_guid: f.teacher_guid,
                    is_privileged: false,
                },
                today(),
            )
            .await
            .unwrap();

        let after = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(after.standards_points, 5);
    }
}
