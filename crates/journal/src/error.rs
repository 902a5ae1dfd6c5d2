use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{StandardType, WorkType};

/// Every failure the engine can produce. Validation rejections are
/// dedicated variants so callers can match on them; infrastructure
/// failures wrap the underlying `sqlx` error unchanged.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("graded date {0} is in the future")]
    ActionFromFuture(NaiveDate),

    #[error("student {0} not found")]
    StudentNotFound(Uuid),

    #[error("group {0} not found")]
    GroupNotFound(String),

    #[error("no active semester is configured")]
    NoActiveSemester,

    #[error("invalid semester name: {0}")]
    InvalidSemesterName(String),

    #[error("date {0} is outside the grading window")]
    DateExpired(NaiveDate),

    #[error("{0} falls on a non-grading day")]
    NonWorkingDay(NaiveDate),

    #[error("points value {points} is outside the allowed 1..={limit} range")]
    PointsOutOfLimit { points: i32, limit: i32 },

    #[error("a visit on {0} is already recorded")]
    VisitExists(NaiveDate),

    #[error("standard {0} was already passed this semester")]
    StandardExists(StandardType),

    #[error("{0} points were already granted this semester")]
    ActivityDuplicate(WorkType),

    #[error("total of {total} points is below the {required} required to attempt standards")]
    NotEnoughPointsForStandards {
        total: rust_decimal::Decimal,
        required: i32,
    },

    #[error("history record {0} not found")]
    HistoryNotFound(i64),

    #[error("record was granted by another teacher")]
    TeacherMismatch,

    #[error("record dated {0} can no longer be deleted")]
    HistoryDeleteExpired(NaiveDate),

    #[error("student is already in semester {0}")]
    SameSemester(String),

    #[error("caller is not the curator of group {0}")]
    NotCurator(String),

    #[error("student {student_guid} has {total} of {required} required points")]
    NotEnoughPoints {
        student_guid: Uuid,
        total: rust_decimal::Decimal,
        required: i32,
    },

    #[error("ledger of student {0} was modified concurrently")]
    ConcurrencyConflict(Uuid),
}

pub type Result<T> = std::result::Result<T, JournalError>;

impl JournalError {
    /// True for expected rejections the caller can correct and retry.
    /// Infrastructure failures propagate as-is for the transport layer.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Migration(_))
    }
}
