use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::capability::{CapabilitySet, TeacherDirectory};
use crate::error::{JournalError, Result};
use crate::models::{
    ActivityRecord, ArchivedStudent, Group, NewActivity, NewStandard, NewVisit, Semester,
    StandardRecord, StandardType, StudentLedger, VisitRecord, WorkType,
};

use super::JournalStore;

const LEDGER_COLUMNS: &str = "student_guid, full_name, group_number, course, \
     current_semester_name, visits, activity_points, standards_points, \
     has_debt, had_debt_in_semester, archived_visit_value, version";

pub struct PgJournalStore {
    pool: PgPool,
}

impl PgJournalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes the ledger's accumulators, guarded by the version stamp
    /// the caller read. Zero affected rows means a concurrent writer
    /// advanced the stamp first.
    async fn update_ledger(
        tx: &mut Transaction<'_, Postgres>,
        ledger: &StudentLedger,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE students \
             SET visits = $1, activity_points = $2, standards_points = $3, \
                 has_debt = $4, had_debt_in_semester = $5, archived_visit_value = $6, \
                 current_semester_name = $7, version = version + 1 \
             WHERE student_guid = $8 AND version = $9",
        )
        .bind(ledger.visits)
        .bind(ledger.activity_points)
        .bind(ledger.standards_points)
        .bind(ledger.has_debt)
        .bind(ledger.had_debt_in_semester)
        .bind(ledger.archived_visit_value)
        .bind(&ledger.current_semester_name)
        .bind(ledger.student_guid)
        .bind(ledger.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(JournalError::ConcurrencyConflict(ledger.student_guid));
        }
        Ok(())
    }
}

#[async_trait]
impl JournalStore for PgJournalStore {
    async fn student(&self, guid: Uuid) -> Result<Option<StudentLedger>> {
        let ledger = sqlx::query_as::<_, StudentLedger>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM students WHERE student_guid = $1"
        ))
        .bind(guid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ledger)
    }

    async fn group(&self, group_number: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT group_number, visit_value, curator_guid FROM groups WHERE group_number = $1",
        )
        .bind(group_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn active_semester_name(&self) -> Result<String> {
        sqlx::query_scalar::<_, String>("SELECT name FROM semesters WHERE is_current")
            .fetch_optional(&self.pool)
            .await?
            .ok_or(JournalError::NoActiveSemester)
    }

    async fn start_new_semester(&self, name: &str) -> Result<()> {
        Semester::order_key(name)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE semesters SET is_current = FALSE WHERE is_current")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO semesters (name, is_current) VALUES ($1, TRUE) \
             ON CONFLICT (name) DO UPDATE SET is_current = TRUE",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn visit_exists(&self, student_guid: Uuid, date: NaiveDate) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM visits_history WHERE student_guid = $1 AND date = $2)",
        )
        .bind(student_guid)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn activity_exists(
        &self,
        student_guid: Uuid,
        work_type: WorkType,
        semester_name: &str,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM points_history \
             WHERE student_guid = $1 AND work_type = $2 AND semester_name = $3)",
        )
        .bind(student_guid)
        .bind(work_type)
        .bind(semester_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn standard_exists(
        &self,
        student_guid: Uuid,
        standard_type: StandardType,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM standards_history \
             WHERE student_guid = $1 AND standard_type = $2)",
        )
        .bind(student_guid)
        .bind(standard_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn visit(&self, id: i64) -> Result<Option<VisitRecord>> {
        let record = sqlx::query_as::<_, VisitRecord>(
            "SELECT id, student_guid, teacher_guid, date FROM visits_history WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn activity(&self, id: i64) -> Result<Option<ActivityRecord>> {
        let record = sqlx::query_as::<_, ActivityRecord>(
            "SELECT id, student_guid, teacher_guid, date, points, work_type, semester_name, comment \
             FROM points_history WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn standard(&self, id: i64) -> Result<Option<StandardRecord>> {
        let record = sqlx::query_as::<_, StandardRecord>(
            "SELECT id, student_guid, teacher_guid, date, points, standard_type, semester_name, comment \
             FROM standards_history WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_visits(&self, student_guid: Uuid) -> Result<Vec<VisitRecord>> {
        let records = sqlx::query_as::<_, VisitRecord>(
            "SELECT id, student_guid, teacher_guid, date FROM visits_history \
             WHERE student_guid = $1 ORDER BY date",
        )
        .bind(student_guid)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_activities(&self, student_guid: Uuid) -> Result<Vec<ActivityRecord>> {
        let records = sqlx::query_as::<_, ActivityRecord>(
            "SELECT id, student_guid, teacher_guid, date, points, work_type, semester_name, comment \
             FROM points_history WHERE student_guid = $1 ORDER BY date",
        )
        .bind(student_guid)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_standards(&self, student_guid: Uuid) -> Result<Vec<StandardRecord>> {
        let records = sqlx::query_as::<_, StandardRecord>(
            "SELECT id, student_guid, teacher_guid, date, points, standard_type, semester_name, comment \
             FROM standards_history WHERE student_guid = $1 ORDER BY date",
        )
        .bind(student_guid)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn commit_visit(&self, ledger: &StudentLedger, record: NewVisit) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO visits_history (student_guid, teacher_guid, date) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(record.student_guid)
        .bind(record.teacher_guid)
        .bind(record.date)
        .fetch_one(&mut *tx)
        .await?;
        Self::update_ledger(&mut tx, ledger).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn commit_activity(&self, ledger: &StudentLedger, record: NewActivity) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO points_history \
             (student_guid, teacher_guid, date, points, work_type, semester_name, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(record.student_guid)
        .bind(record.teacher_guid)
        .bind(record.date)
        .bind(record.points)
        .bind(record.work_type)
        .bind(&record.semester_name)
        .bind(&record.comment)
        .fetch_one(&mut *tx)
        .await?;
        Self::update_ledger(&mut tx, ledger).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn commit_standard(&self, ledger: &StudentLedger, record: NewStandard) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO standards_history \
             (student_guid, teacher_guid, date, points, standard_type, semester_name, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(record.student_guid)
        .bind(record.teacher_guid)
        .bind(record.date)
        .bind(record.points)
        .bind(record.standard_type)
        .bind(&record.semester_name)
        .bind(&record.comment)
        .fetch_one(&mut *tx)
        .await?;
        Self::update_ledger(&mut tx, ledger).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn remove_visit(&self, ledger: &StudentLedger, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM visits_history WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(JournalError::HistoryNotFound(id));
        }
        Self::update_ledger(&mut tx, ledger).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_activity(&self, ledger: &StudentLedger, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM points_history WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(JournalError::HistoryNotFound(id));
        }
        Self::update_ledger(&mut tx, ledger).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_standard(&self, ledger: &StudentLedger, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM standards_history WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(JournalError::HistoryNotFound(id));
        }
        Self::update_ledger(&mut tx, ledger).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn mark_debt(&self, ledger: &StudentLedger, frozen_visit_value: Decimal) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let marked = StudentLedger {
            has_debt: true,
            had_debt_in_semester: true,
            archived_visit_value: frozen_visit_value,
            ..ledger.clone()
        };
        Self::update_ledger(&mut tx, &marked).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_archive(
        &self,
        ledger: &StudentLedger,
        snapshot: &ArchivedStudent,
        active_semester_name: &str,
        keep_had_debt_flag: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO archived_students \
             (student_guid, semester_name, full_name, group_number, visits, total_points) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(snapshot.student_guid)
        .bind(&snapshot.semester_name)
        .bind(&snapshot.full_name)
        .bind(&snapshot.group_number)
        .bind(snapshot.visits)
        .bind(snapshot.total_points)
        .execute(&mut *tx)
        .await?;

        for visit in &snapshot.visit_history {
            sqlx::query(
                "INSERT INTO archived_visits_history \
                 (student_guid, semester_name, teacher_guid, date, points) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(snapshot.student_guid)
            .bind(&snapshot.semester_name)
            .bind(visit.teacher_guid)
            .bind(visit.date)
            .bind(visit.points)
            .execute(&mut *tx)
            .await?;
        }

        for activity in &snapshot.activity_history {
            sqlx::query(
                "INSERT INTO archived_points_history \
                 (student_guid, semester_name, teacher_guid, date, points, work_type, comment) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(snapshot.student_guid)
            .bind(&snapshot.semester_name)
            .bind(activity.teacher_guid)
            .bind(activity.date)
            .bind(activity.points)
            .bind(activity.work_type)
            .bind(&activity.comment)
            .execute(&mut *tx)
            .await?;
        }

        for standard in &snapshot.standards_history {
            sqlx::query(
                "INSERT INTO archived_standards_history \
                 (student_guid, semester_name, teacher_guid, date, points, standard_type, comment) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(snapshot.student_guid)
            .bind(&snapshot.semester_name)
            .bind(standard.teacher_guid)
            .bind(standard.date)
            .bind(standard.points)
            .bind(standard.standard_type)
            .bind(&standard.comment)
            .execute(&mut *tx)
            .await?;
        }

        for table in ["visits_history", "points_history", "standards_history"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE student_guid = $1"))
                .bind(ledger.student_guid)
                .execute(&mut *tx)
                .await?;
        }

        let reset = StudentLedger {
            current_semester_name: active_semester_name.to_string(),
            visits: 0,
            activity_points: 0,
            standards_points: 0,
            has_debt: false,
            had_debt_in_semester: keep_had_debt_flag,
            archived_visit_value: Decimal::ZERO,
            ..ledger.clone()
        };
        Self::update_ledger(&mut tx, &reset).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn debtors(&self) -> Result<Vec<StudentLedger>> {
        let ledgers = sqlx::query_as::<_, StudentLedger>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM students WHERE has_debt ORDER BY group_number, full_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(ledgers)
    }
}

#[async_trait]
impl TeacherDirectory for PgJournalStore {
    async fn capabilities_of(&self, teacher_guid: Uuid) -> Result<Option<CapabilitySet>> {
        let bits = sqlx::query_scalar::<_, i16>(
            "SELECT capabilities FROM teachers WHERE teacher_guid = $1",
        )
        .bind(teacher_guid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bits.map(|b| CapabilitySet::from_bits(b as u16)))
    }
}
