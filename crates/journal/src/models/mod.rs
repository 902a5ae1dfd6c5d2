pub mod archived;
pub mod group;
pub mod history;
pub mod semester;
pub mod student;

pub use archived::{ArchivedActivity, ArchivedStandard, ArchivedStudent, ArchivedVisit};
pub use group::Group;
pub use history::{
    ActivityRecord, NewActivity, NewStandard, NewVisit, StandardRecord, StandardType, VisitRecord,
    WorkType,
};
pub use semester::Semester;
pub use student::{StudentLedger, calculate_total_points};
