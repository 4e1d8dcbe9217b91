use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Days covered by one overtime accrual period.
pub const BIWEEKLY_PERIOD_DAYS: i64 = 14;

/// Monday..=Sunday week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_monday() as i64;
    let week_start = date - Duration::days(offset);
    (week_start, week_start + Duration::days(6))
}

/// Inclusive interval intersection. Every conflict direction goes through here.
pub fn overlaps(start_a: NaiveDate, end_a: NaiveDate, start_b: NaiveDate, end_b: NaiveDate) -> bool {
    start_a <= end_b && end_a >= start_b
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn most_recent_monday(today: NaiveDate) -> NaiveDate {
    week_bounds(today).0
}

/// Last completed two-week window: the 14 days ending the Sunday before the most recent Monday.
pub fn previous_biweekly_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let period_start = most_recent_monday(today) - Duration::days(BIWEEKLY_PERIOD_DAYS);
    (period_start, period_start + Duration::days(BIWEEKLY_PERIOD_DAYS - 1))
}
