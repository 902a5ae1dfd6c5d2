//! Grant, revocation, and archiving commands. Each command validates its
//! payload against the calendar policy and current ledger state, mutates
//! a local copy of the ledger, and hands the store one atomic
//! version-checked write.

mod add_points;
mod add_standard;
mod add_visit;
mod archive_student;
mod delete_points;
mod delete_standard;
mod delete_visit;

pub use add_points::{AddPointsCommand, AddPointsPayload};
pub use add_standard::{AddStandardCommand, AddStandardPayload};
pub use add_visit::{AddVisitCommand, AddVisitPayload};
pub use archive_student::{ArchiveStudentCommand, ArchiveStudentPayload};
pub use delete_points::{DeletePointsCommand, DeletePointsPayload};
pub use delete_standard::{DeleteStandardCommand, DeleteStandardPayload};
pub use delete_visit::{DeleteVisitCommand, DeleteVisitPayload};
