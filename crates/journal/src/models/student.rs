use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A student's live accumulators for the current semester. The total is
/// never stored; it is always derived via [`calculate_total_points`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentLedger {
    pub student_guid: Uuid,
    pub full_name: String,
    pub group_number: String,
    pub course: i32,
    pub current_semester_name: String,
    pub visits: i32,
    pub activity_points: i32,
    pub standards_points: i32,
    pub has_debt: bool,
    pub had_debt_in_semester: bool,
    /// Per-visit value frozen at the moment debt was declared; used
    /// instead of the group's live value while the debt stands.
    pub archived_visit_value: Decimal,
    /// Version stamp for optimistic concurrency; bumped on every write.
    pub version: i64,
}

impl StudentLedger {
    /// The per-visit value this ledger is graded at right now.
    pub fn visit_value(&self, group_visit_value: Decimal) -> Decimal {
        if self.has_debt {
            self.archived_visit_value
        } else {
            group_visit_value
        }
    }

    pub fn total_points(&self, group_visit_value: Decimal) -> Decimal {
        calculate_total_points(
            self.visits,
            self.visit_value(group_visit_value),
            self.activity_points,
            self.standards_points,
        )
    }
}

/// `ceil(visits * visit_value + activity + standards)`. The single place
/// the semester total is computed.
pub fn calculate_total_points(
    visits: i32,
    visit_value: Decimal,
    activity_points: i32,
    standards_points: i32,
) -> Decimal {
    (Decimal::from(visits) * visit_value + Decimal::from(activity_points + standards_points))
        .ceil()
}
