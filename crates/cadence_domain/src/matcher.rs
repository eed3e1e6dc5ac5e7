use chrono::{Datelike, Duration, NaiveDate};

use crate::pattern::Pattern;

/// Whether `date` is an occurrence of `pattern`.
///
/// Custom patterns are display-only and never match.
pub fn is_occurrence(pattern: &Pattern, date: NaiveDate) -> bool {
    match pattern {
        Pattern::Weekly { days_of_week } => days_of_week.contains(&weekday_index(date)),
        Pattern::Biweekly {
            days_of_week,
            weeks_of_month,
        } => {
            days_of_week.contains(&weekday_index(date))
                && weeks_of_month.contains(&week_of_month(date))
        }
        Pattern::Monthly { days_of_month } => {
            u8::try_from(date.day()).is_ok_and(|day| days_of_month.contains(&day))
        }
        Pattern::Custom { .. } => false,
    }
}

/// Weekday index with Sunday = 0.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// 7-day bucket of the month counted from the 1st: days 1-7 are week 1,
/// 8-14 week 2 and so on. Days 29-31 land in bucket 5.
pub fn week_of_month(date: NaiveDate) -> u8 {
    date.day().div_ceil(7) as u8
}

/// All dates in `[start, end_inclusive]` on which `pattern` fires, ascending.
pub fn occurrences_between(
    pattern: &Pattern,
    start: NaiveDate,
    end_inclusive: NaiveDate,
) -> Vec<NaiveDate> {
    if end_inclusive < start {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|day| *day <= end_inclusive)
        .filter(|day| is_occurrence(pattern, *day))
        .collect()
}

/// The seven dates Sunday..Saturday of the week containing `today`, shifted
/// by `week_offset` whole weeks. Empty when the shifted week falls outside
/// the representable calendar.
pub fn week_dates(today: NaiveDate, week_offset: i64) -> Vec<NaiveDate> {
    let start = Duration::try_weeks(week_offset).and_then(|shift| {
        today
            .checked_sub_signed(Duration::days(i64::from(weekday_index(today))))?
            .checked_add_signed(shift)
    });
    match start {
        Some(start) => start.iter_days().take(7).collect(),
        None => Vec::new(),
    }
}

/// Every date of the given month, or an empty list for an invalid month.
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|day| day.month() == month)
        .collect()
}
