//! Persistence port for the engine. Every mutating operation is atomic
//! and guarded by the ledger's version stamp: the caller passes the
//! ledger with its accumulators already set to the desired values and
//! the version it read, and the store commits the write only if the
//! stored version still matches, failing with `ConcurrencyConflict`
//! otherwise. Callers retry the whole operation from fresh state.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ActivityRecord, ArchivedStudent, Group, NewActivity, NewStandard, NewVisit, StandardRecord,
    StandardType, StudentLedger, VisitRecord, WorkType,
};

pub use memory::MemoryJournalStore;
pub use postgres::PgJournalStore;

#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn student(&self, guid: Uuid) -> Result<Option<StudentLedger>>;
    async fn group(&self, group_number: &str) -> Result<Option<Group>>;

    /// Semester registry: name of the single current semester.
    async fn active_semester_name(&self) -> Result<String>;
    /// Makes `name` the current semester, validating its format.
    async fn start_new_semester(&self, name: &str) -> Result<()>;

    async fn visit_exists(&self, student_guid: Uuid, date: NaiveDate) -> Result<bool>;
    async fn activity_exists(
        &self,
        student_guid: Uuid,
        work_type: WorkType,
        semester_name: &str,
    ) -> Result<bool>;
    async fn standard_exists(&self, student_guid: Uuid, standard_type: StandardType)
    -> Result<bool>;

    async fn visit(&self, id: i64) -> Result<Option<VisitRecord>>;
    async fn activity(&self, id: i64) -> Result<Option<ActivityRecord>>;
    async fn standard(&self, id: i64) -> Result<Option<StandardRecord>>;

    async fn list_visits(&self, student_guid: Uuid) -> Result<Vec<VisitRecord>>;
    async fn list_activities(&self, student_guid: Uuid) -> Result<Vec<ActivityRecord>>;
    async fn list_standards(&self, student_guid: Uuid) -> Result<Vec<StandardRecord>>;

    /// Appends the record and writes the ledger's accumulators in one
    /// version-checked transaction.
    async fn commit_visit(&self, ledger: &StudentLedger, record: NewVisit) -> Result<i64>;
    async fn commit_activity(&self, ledger: &StudentLedger, record: NewActivity) -> Result<i64>;
    async fn commit_standard(&self, ledger: &StudentLedger, record: NewStandard) -> Result<i64>;

    /// Deletes the record and writes the recomputed accumulators in one
    /// version-checked transaction.
    async fn remove_visit(&self, ledger: &StudentLedger, id: i64) -> Result<()>;
    async fn remove_activity(&self, ledger: &StudentLedger, id: i64) -> Result<()>;
    async fn remove_standard(&self, ledger: &StudentLedger, id: i64) -> Result<()>;

    /// Declares debt: freezes the visit value and sets both debt flags.
    async fn mark_debt(&self, ledger: &StudentLedger, frozen_visit_value: Decimal) -> Result<()>;

    /// Persists the snapshot, clears the live history, and resets the
    /// ledger for `active_semester_name`, all in one version-checked
    /// transaction. `keep_had_debt_flag` preserves the soft warning
    /// marker for students who archived while paying off a debt.
    async fn commit_archive(
        &self,
        ledger: &StudentLedger,
        snapshot: &ArchivedStudent,
        active_semester_name: &str,
        keep_had_debt_flag: bool,
    ) -> Result<()>;

    /// Ledgers currently flagged with debt, for the nightly batch.
    async fn debtors(&self) -> Result<Vec<StudentLedger>>;
}
