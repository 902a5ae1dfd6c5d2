use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::models::{NewActivity, WorkType};
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct AddPointsPayload {
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub work_type: WorkType,
    pub comment: Option<String>,
    pub is_privileged: bool,
}

/// Grants activity points (online coursework, external fitness, science,
/// team/activist/competition work).
pub struct AddPointsCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> AddPointsCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: AddPointsPayload) -> Result<()> {
        self.execute_at(payload, calendar::today()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit reference day.
    pub async fn execute_at(&self, payload: AddPointsPayload, today: NaiveDate) -> Result<()> {
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
            self.config.points_life_days,
            payload.is_privileged,
        ) {
            return Err(JournalError::DateExpired(payload.date));
        }

        if calendar::is_non_grading_day(payload.date) {
            return Err(JournalError::NonWorkingDay(payload.date));
        }

        let limit = self.work_type_limit(payload.work_type);
        if !(1..=limit).contains(&payload.points) {
            return Err(JournalError::PointsOutOfLimit {
                points: payload.points,
                limit,
            });
        }

        if payload.work_type.once_per_semester()
            && self
                .store
                .activity_exists(
                    payload.student_guid,
                    payload.work_type,
                    &ledger.current_semester_name,
                )
                .await?
        {
            return Err(JournalError::ActivityDuplicate(payload.work_type));
        }

        ledger.activity_points += payload.points;
        self.store
            .commit_activity(
                &ledger,
                NewActivity {
                    student_guid: payload.student_guid,
                    teacher_guid: payload.teacher_guid,
                    date: payload.date,
                    points: payload.points,
                    work_type: payload.work_type,
                    semester_name: ledger.current_semester_name.clone(),
                    comment: payload.comment,
                },
            )
            .await?;
        Ok(())
    }

    fn work_type_limit(&self, work_type: WorkType) -> i32 {
        match work_type {
            WorkType::ExternalFitness => self.config.max_points_for_external_fitness,
            WorkType::Science => self.config.max_points_for_science,
            _ => self.config.max_activity_points,
        }
    }
}
