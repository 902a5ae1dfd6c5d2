use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What non-attendance activity the points were granted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_type", rename_all = "snake_case")]
pub enum WorkType {
    ExternalFitness,
    Gto,
    Science,
    OnlineWork,
    InternalTeam,
    Activist,
    Competition,
}

impl WorkType {
    /// Work types a student may be credited for at most once per semester.
    pub fn once_per_semester(self) -> bool {
        matches!(self, WorkType::ExternalFitness | WorkType::Gto)
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkType::ExternalFitness => "external fitness",
            WorkType::Gto => "GTO",
            WorkType::Science => "science",
            WorkType::OnlineWork => "online work",
            WorkType::InternalTeam => "internal team",
            WorkType::Activist => "activist",
            WorkType::Competition => "competition",
        };
        f.write_str(name)
    }
}

/// Which fitness standard was passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "standard_type", rename_all = "snake_case")]
pub enum StandardType {
    Tilts,
    Jumps,
    PullUps,
    Squats,
    JumpingRopeJumps,
    TorsoLifts,
    FlexionAndExtensionOfArms,
    ShuttleRun,
    /// Miscellaneous bucket, exempt from the once-per-semester rule.
    Other,
}

impl fmt::Display for StandardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StandardType::Tilts => "tilts",
            StandardType::Jumps => "jumps",
            StandardType::PullUps => "pull-ups",
            StandardType::Squats => "squats",
            StandardType::JumpingRopeJumps => "jumping-rope jumps",
            StandardType::TorsoLifts => "torso lifts",
            StandardType::FlexionAndExtensionOfArms => "arm flexion and extension",
            StandardType::ShuttleRun => "shuttle run",
            StandardType::Other => "other",
        };
        f.write_str(name)
    }
}

/// One recorded class attendance; worth one visit in the accumulator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VisitRecord {
    pub id: i64,
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewVisit {
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
}

/// One activity-points grant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRecord {
    pub id: i64,
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub work_type: WorkType,
    pub semester_name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub work_type: WorkType,
    pub semester_name: String,
    pub comment: Option<String>,
}

/// One standards result.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StandardRecord {
    pub id: i64,
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub standard_type: StandardType,
    pub semester_name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStandard {
    pub student_guid: Uuid,
    pub teacher_guid: Uuid,
    pub date: NaiveDate,
    pub points: i32,
    pub standard_type: StandardType,
    pub semester_name: String,
    pub comment: Option<String>,
}
