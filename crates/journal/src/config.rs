/// Grading thresholds and date windows. One immutable value is built at
/// startup and shared by every command and job, so tests can tighten or
/// loosen individual limits without touching globals.
#[derive(Debug, Clone)]
pub struct PointsConfig {
    /// Hard cap on the standards accumulator.
    pub max_points_for_standards: i32,
    /// Cap on a single standard result for first-year students.
    pub max_points_for_one_standard: i32,
    /// Cap on a single standard result for courses above the first.
    pub max_points_for_one_standard_upper_courses: i32,
    /// Total points a first-year student needs before attempting standards.
    pub min_total_for_standards: i32,
    /// Same threshold for courses above the first.
    pub min_total_for_standards_upper_courses: i32,
    /// Cap on a single activity-points grant.
    pub max_activity_points: i32,
    pub max_points_for_external_fitness: i32,
    pub max_points_for_science: i32,
    /// Semester total required to archive without debt.
    pub required_points_amount: i32,
    /// Grant window for visits and standards, in days.
    pub visit_and_standards_life_days: i64,
    /// Grant window for activity points, in days.
    pub points_life_days: i64,
    /// Window for deleting existing history, in days. Independent from
    /// the grant windows and must not be conflated with them.
    pub days_to_delete_points: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            max_points_for_standards: 30,
            max_points_for_one_standard: 10,
            max_points_for_one_standard_upper_courses: 5,
            min_total_for_standards: 20,
            min_total_for_standards_upper_courses: 40,
            max_activity_points: 50,
            max_points_for_external_fitness: 10,
            max_points_for_science: 30,
            required_points_amount: 50,
            visit_and_standards_life_days: 7,
            points_life_days: 30,
            days_to_delete_points: 30,
        }
    }
}

impl PointsConfig {
    pub fn max_points_for_one_standard(&self, course: i32) -> i32 {
        if course > 1 {
            self.max_points_for_one_standard_upper_courses
        } else {
            self.max_points_for_one_standard
        }
    }

    pub fn min_total_for_standards(&self, course: i32) -> i32 {
        if course > 1 {
            self.min_total_for_standards_upper_courses
        } else {
            self.min_total_for_standards
        }
    }
}
