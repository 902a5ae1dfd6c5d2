use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{JournalError, Result};

/// A grading semester, named `YYYY-YYYY/season` (e.g. `2023-2024/autumn`).
/// Exactly one semester is current at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Semester {
    pub name: String,
    pub is_current: bool,
}

impl Semester {
    /// Validates the name format and returns a key that orders semesters
    /// chronologically: autumn opens an academic year, spring closes it.
    pub fn order_key(name: &str) -> Result<i32> {
        let invalid = || JournalError::InvalidSemesterName(name.to_string());

        let (years, season) = name.split_once('/').ok_or_else(invalid)?;
        let (first, second) = years.split_once('-').ok_or_else(invalid)?;
        let first: i32 = first.parse().map_err(|_| invalid())?;
        let second: i32 = second.parse().map_err(|_| invalid())?;

        if second != first + 1 {
            return Err(invalid());
        }

        let season = match season {
            "autumn" => 0,
            "spring" => 1,
            _ => return Err(invalid()),
        };

        Ok(first * 2 + season)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_order_chronologically() {
        let autumn = Semester::order_key("2023-2024/autumn").unwrap();
        let spring = Semester::order_key("2023-2024/spring").unwrap();
        let next_autumn = Semester::order_key("2024-2025/autumn").unwrap();
        assert!(autumn < spring);
        assert!(spring < next_autumn);
    }

    #[test]
    fn malformed_names_are_rejected() {
        for name in ["2023/autumn", "2023-2025/autumn", "2023-2024/winter", "garbage"] {
            assert!(matches!(
                Semester::order_key(name),
                Err(JournalError::InvalidSemesterName(_))
            ));
        }
    }
}
