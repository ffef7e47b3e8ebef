//! Date helpers.

use chrono::{Duration, Local, NaiveDate};

use crate::errors::{AppError, AppResult};

/// Dates from `until` back to `since`, both inclusive, newest first.
///
/// Empty when `since` is after `until`.
pub fn date_range(since: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = Some(until);
    while let Some(day) = current.filter(|d| *d >= since) {
        dates.push(day);
        current = day.pred_opt();
    }
    dates
}

/// The date `days` days and `weeks` weeks before `today`.
///
/// Negative arguments move forward in time.
///
/// # Errors
/// Returns `AppError::InvalidValue` if the result is out of the supported range.
pub fn past_date(today: NaiveDate, days: i64, weeks: i64) -> AppResult<NaiveDate> {
    let offset = Duration::try_days(days)
        .zip(Duration::try_weeks(weeks))
        .and_then(|(d, w)| d.checked_add(&w))
        .ok_or_else(|| AppError::InvalidValue("date offset is out of range".into()))?;
    today
        .checked_sub_signed(offset)
        .ok_or_else(|| AppError::InvalidValue("resulting date is out of range".into()))
}

/// [`past_date`] relative to the local calendar date. Reads the clock.
///
/// # Errors
/// Same as [`past_date`].
pub fn past_date_from_today(days: i64, weeks: i64) -> AppResult<NaiveDate> {
    past_date(Local::now().date_naive(), days, weeks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_range() {
        let today = ymd(2024, 3, 1);
        assert_eq!(date_range(today, today), vec![today]);
    }

    #[test]
    fn test_range_is_newest_first_across_month_end() {
        assert_eq!(
            date_range(ymd(2024, 2, 28), ymd(2024, 3, 1)),
            vec![ymd(2024, 3, 1), ymd(2024, 2, 29), ymd(2024, 2, 28)]
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(date_range(ymd(2024, 3, 2), ymd(2024, 3, 1)).is_empty());
    }

    #[test]
    fn test_past_date_days_and_weeks() {
        let today = ymd(2024, 3, 20);
        assert_eq!(past_date(today, 0, 0).unwrap(), today);
        assert_eq!(past_date(today, 3, 0).unwrap(), ymd(2024, 3, 17));
        assert_eq!(past_date(today, 0, 5).unwrap(), ymd(2024, 2, 14));
        assert_eq!(past_date(today, 3, 2).unwrap(), ymd(2024, 3, 3));
    }

    #[test]
    fn test_negative_offsets_move_forward() {
        assert_eq!(past_date(ymd(2024, 3, 20), -3, -2).unwrap(), ymd(2024, 4, 6));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(past_date(ymd(2024, 1, 1), i64::MAX, 0).is_err());
    }
}
