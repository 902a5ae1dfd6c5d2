//! Pure date rules shared by grant and revocation validators. Every
//! function takes `today` explicitly so callers and tests control time.

use chrono::{Datelike, Local, NaiveDate, Weekday};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn is_future(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// A date is expired once it is more than `window_days` behind `today`.
/// Privileged callers are exempt from this rule.
pub fn is_expired(date: NaiveDate, today: NaiveDate, window_days: i64, privileged: bool) -> bool {
    !privileged && (today - date).num_days() > window_days
}

/// Sundays and Mondays carry no classes; nothing can be graded on them.
/// Unlike the expiry rule, privileged callers are not exempt.
pub fn is_non_grading_day(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sun | Weekday::Mon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn tomorrow_is_future() {
        let today = d(2024, 3, 12);
        assert!(is_future(d(2024, 3, 13), today));
        assert!(!is_future(today, today));
        assert!(!is_future(d(2024, 3, 11), today));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let today = d(2024, 3, 12);
        assert!(!is_expired(d(2024, 3, 5), today, 7, false));
        assert!(is_expired(d(2024, 3, 4), today, 7, false));
    }

    #[test]
    fn privileged_caller_skips_expiry() {
        let today = d(2024, 3, 12);
        assert!(!is_expired(d(2024, 1, 1), today, 7, true));
    }

    #[test]
    fn sunday_and_monday_are_non_grading() {
        assert!(is_non_grading_day(d(2024, 3, 10))); // Sunday
        assert!(is_non_grading_day(d(2024, 3, 11))); // Monday
        assert!(!is_non_grading_day(d(2024, 3, 12))); // Tuesday
        assert!(!is_non_grading_day(d(2024, 3, 16))); // Saturday
    }
}
