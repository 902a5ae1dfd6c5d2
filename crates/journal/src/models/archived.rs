use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StandardType, WorkType};

/// Immutable snapshot of a ledger at archive time, unique per
/// `(student_guid, semester_name)`. History entries are frozen copies;
/// they are never recomputed after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedStudent {
    pub student_guid: Uuid,
    pub semester_name: String,
    pub full_name: String,
    pub group_number: String,
    pub visits: i32,
    pub total_points: Decimal,
    pub visit_history: Vec<ArchivedVisit>,
    pub activity_history: Vec<ArchivedActivity>,
    pub standards_history: Vec<ArchivedStandard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedVisit {
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    /// Value the visit was worth when archived, debt-aware.
    pub points: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedActivity {
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub work_type: WorkType,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedStandard {
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub standard_type: StandardType,
    pub comment: Option<String>,
}
