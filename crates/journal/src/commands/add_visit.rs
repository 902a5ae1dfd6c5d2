use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::models::NewVisit;
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct AddVisitPayload {
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub is_privileged: bool,
}

/// Records one class attendance. At most one visit per calendar day.
pub struct AddVisitCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> AddVisitCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: AddVisitPayload) -> Result<()> {
        self.execute_at(payload, calendar::today()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit reference day.
    pub async fn execute_at(&self, payload: AddVisitPayload, today: NaiveDate) -> Result<()> {
        if calendar::is_future(payload.date, today) {
            return Err(JournalError::ActionFromFuture(payload.date));
        }

        let mut ledger = self
            .store
            .student(payload.student_guid)
            .await?
            .ok_or(JournalError::StudentNotFound(payload.student_guid))?;

        if calendar::is_expired(
            payload.date,
            today,
            self.config.visit_and_standards_life_days,
            payload.is_privileged,
        ) {
            return Err(JournalError::DateExpired(payload.date));
        }

        if calendar::is_non_grading_day(payload.date) {
            return Err(JournalError::NonWorkingDay(payload.date));
        }

        if self
            .store
            .visit_exists(payload.student_guid, payload.date)
            .await?
        {
            return Err(JournalError::VisitExists(payload.date));
        }

        ledger.visits += 1;
        self.store
            .commit_visit(
                &ledger,
                NewVisit {
                    student_guid: payload.student_guid,
                    teacher_guid: payload.teacher_guid,
                    date: payload.date,
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::commands::testutil::{fixture, today};

    fn payload(f: &crate::commands::testutil::Fixture, date: NaiveDate) -> AddVisitPayload {
        AddVisitPayload {
            student_guid: f.student_guid,
            teacher_guid: f.teacher_guid,
            date,
            is_privileged: false,
        }
    }

    #[tokio::test]
    async fn records_visit_and_increments_accumulator() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);

        cmd.execute_at(payload(&f, today()), today()).await.unwrap();

        let ledger = f.store.student(f.student_guid).await.unwrap().unwrap();
        assert_eq!(ledger.visits, 1);
        assert_eq!(ledger.version, 1);
        assert_eq!(f.store.list_visits(f.student_guid).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_visit_same_day_fails_for_any_teacher() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);
        cmd.execute_at(payload(&f, today()), today()).await.unwrap();

        let mut other_teacher = payload(&f, today());
        other_teacher.teacher_guid = Uuid::new_v4();
        let err = cmd.execute_at(other_teacher, today()).await.unwrap_err();
        assert!(matches!(err, JournalError::VisitExists(_)));
    }

    #[tokio::test]
    async fn future_date_is_rejected() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);
        let err = cmd
            .execute_at(payload(&f, today() + Duration::days(1)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::ActionFromFuture(_)));
    }

    #[tokio::test]
    async fn unknown_student_is_rejected() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);
        let mut p = payload(&f, today());
        p.student_guid = Uuid::new_v4();
        let err = cmd.execute_at(p, today()).await.unwrap_err();
        assert!(matches!(err, JournalError::StudentNotFound(_)));
    }

    #[tokio::test]
    async fn ten_day_old_visit_needs_privilege() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);
        // ten days before the reference Tuesday: a Saturday
        let date = today() - Duration::days(10);

        let err = cmd.execute_at(payload(&f, date), today()).await.unwrap_err();
        assert!(matches!(err, JournalError::DateExpired(_)));

        let mut privileged = payload(&f, date);
        privileged.is_privileged = true;
        cmd.execute_at(privileged, today()).await.unwrap();
    }

    #[tokio::test]
    async fn sunday_is_rejected_even_for_privileged() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);
        let sunday = today() - Duration::days(2);
        let mut p = payload(&f, sunday);
        p.is_privileged = true;
        let err = cmd.execute_at(p, today()).await.unwrap_err();
        assert!(matches!(err, JournalError::NonWorkingDay(_)));
    }

    #[tokio::test]
    async fn stale_version_write_conflicts() {
        let f = fixture().await;
        let cmd = AddVisitCommand::new(&f.store, &f.config);
        let stale = f.store.student(f.student_guid).await.unwrap().unwrap();

        cmd.execute_at(payload(&f, today()), today()).await.unwrap();

        // a writer holding the pre-grant ledger must not clobber it
        let err = f
            .store
            .commit_visit(
                &stale,
                NewVisit {
                    student_guid: f.student_guid,
                    teacher_guid: f.teacher_guid,
                    date: today() - Duration::days(1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::ConcurrencyConflict(_)));
    }
}
