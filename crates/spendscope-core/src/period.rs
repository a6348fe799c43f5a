//! Calendar window math
//!
//! Every period is calendar aligned: a week runs Monday through Sunday (ISO),
//! a quarter is Jan-Mar / Apr-Jun / Jul-Sep / Oct-Dec. Windows are inclusive
//! on both ends and always contain at least one day.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::TimePeriod;

/// An inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days in the window
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl TimePeriod {
    /// The calendar window of this period that contains `reference`
    pub fn window(&self, reference: NaiveDate) -> DateWindow {
        match self {
            TimePeriod::Week => {
                let start = week_start(reference);
                DateWindow {
                    start,
                    end: start + Duration::days(6),
                }
            }
            TimePeriod::Month => {
                let start = month_start(reference);
                DateWindow {
                    start,
                    end: next_month_start(start) - Duration::days(1),
                }
            }
            TimePeriod::Quarter => {
                let mut start = month_start(reference);
                for _ in 0..(reference.month0() % 3) {
                    start = previous_month_start(start);
                }
                let mut after = start;
                for _ in 0..3 {
                    after = next_month_start(after);
                }
                DateWindow {
                    start,
                    end: after - Duration::days(1),
                }
            }
            TimePeriod::Year => {
                let start = reference - Duration::days(i64::from(reference.ordinal0()));
                let length = if is_leap_year(reference.year()) { 366 } else { 365 };
                DateWindow {
                    start,
                    end: start + Duration::days(length - 1),
                }
            }
        }
    }
}

/// Monday of the ISO week containing `date`
///
/// Clamped to the earliest representable date at the calendar's lower limit.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(NaiveDate::MIN)
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// First day of the month after the one containing `date`
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start + Duration::days(i64::from(days_in_month(start.year(), start.month())))
}

/// First day of the month before the one containing `date`
pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    month_start(month_start(date) - Duration::days(1))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_window() {
        let window = TimePeriod::Month.window(date(2025, 2, 15));
        assert_eq!(window.start, date(2025, 2, 1));
        assert_eq!(window.end, date(2025, 2, 28));
        assert_eq!(window.days(), 28);

        let leap = TimePeriod::Month.window(date(2024, 2, 29));
        assert_eq!(leap.days(), 29);

        let december = TimePeriod::Month.window(date(2024, 12, 31));
        assert_eq!(december.start, date(2024, 12, 1));
        assert_eq!(december.end, date(2024, 12, 31));
    }

    #[test]
    fn test_week_window_is_monday_to_sunday() {
        // 2025-02-15 is a Saturday
        let window = TimePeriod::Week.window(date(2025, 2, 15));
        assert_eq!(window.start, date(2025, 2, 10));
        assert_eq!(window.end, date(2025, 2, 16));
        assert_eq!(window.days(), 7);

        // Windows may straddle a year boundary
        let window = TimePeriod::Week.window(date(2025, 1, 1));
        assert_eq!(window.start, date(2024, 12, 30));
    }

    #[test]
    fn test_quarter_window() {
        let q1 = TimePeriod::Quarter.window(date(2025, 2, 15));
        assert_eq!(q1.start, date(2025, 1, 1));
        assert_eq!(q1.end, date(2025, 3, 31));
        assert_eq!(q1.days(), 90);

        let q4 = TimePeriod::Quarter.window(date(2025, 12, 31));
        assert_eq!(q4.start, date(2025, 10, 1));
        assert_eq!(q4.end, date(2025, 12, 31));
        assert_eq!(q4.days(), 92);
    }

    #[test]
    fn test_year_window() {
        let y = TimePeriod::Year.window(date(2024, 7, 4));
        assert_eq!(y.start, date(2024, 1, 1));
        assert_eq!(y.end, date(2024, 12, 31));
        assert_eq!(y.days(), 366);
        assert_eq!(TimePeriod::Year.window(date(2025, 1, 1)).days(), 365);
    }

    #[test]
    fn test_month_navigation() {
        assert_eq!(previous_month_start(date(2025, 1, 20)), date(2024, 12, 1));
        assert_eq!(next_month_start(date(2024, 12, 20)), date(2025, 1, 1));
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
    }
}
