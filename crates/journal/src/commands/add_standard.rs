use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::config::PointsConfig;
use crate::error::{JournalError, Result};
use crate::models::{NewStandard, StandardType};
use crate::store::JournalStore;

#[derive(Debug, Clone)]
pub struct AddStandardPayload {
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub standard_type: StandardType,
    pub comment: Option<String>,
    pub is_privileged: bool,
}

/// Grants points for a passed fitness standard. Each standard may be
/// passed once per semester except the `Other` bucket; the accumulator
/// is clamped at the configured cap, the record keeps the full value.
pub struct AddStandardCommand<'a, S> {
    store: &'a S,
    config: &'a PointsConfig,
}

impl<'a, S: JournalStore> AddStandardCommand<'a, S> {
    pub fn new(store: &'a S, config: &'a PointsConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, payload: AddStandardPayload) -> Result<()> {
        self.execute_at(payload, calendar::today()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit reference day.
    pub async fn execute_at(&self, payload: AddStandardPayload, today: NaiveDate) -> Result<()> {
        if calendar::is_future(payload.date, today) {
            return Err(JournalError::ActionFromFuture(payload.date));
        }

        let mut ledger = self
            .store
            .student(payload.student_guid)
            .await?
            .ok_or(JournalError::StudentNotFound(payload.student_guid))?;

        let group = self
            .store
            .group(&ledger.group_number)
            .await?
            .ok_or_else(|| JournalError::GroupNotFound(ledger.group_number.clone()))?;

        let total = ledger.total_points(group.visit_value);
        let required = self.config.min_total_for_standards(ledger.course);
        if total < required.into() {
            return Err(JournalError::NotEnoughPointsForStandards { total, required });
        }

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

        let limit = self.config.max_points_for_one_standard(ledger.course);
        if !(1..=limit).contains(&payload.points) {
            return Err(JournalError::PointsOutOfLimit {
                points: payload.points,
                limit,
            });
        }

        if payload.standard_type != StandardType::Other
            && self
                .store
                .standard_exists(payload.student_guid, payload.standard_type)
                .await?
        {
            return Err(JournalError::StandardExists(payload.standard_type));
        }

        // The record is the source of truth; the accumulator is a
        // clamped cache of it.
        ledger.standards_points =
            (ledger.standards_points + payload.points).min(self.config.max_points_for_standards);

        self.store
            .commit_standard(
                &ledger,
                NewStandard {
                    student_guid: payload.student_guid,
                    teacher_guid: payload.teacher_guid,
                    date: payload.date,
                    points: payload.points,
                    standard_type: payload.standard_type,
                    semester_name: ledger.current_semester_name.clone(),
                    comment: payload.comment,
                },
            )
            .await?;
        Ok(())
    }
}
