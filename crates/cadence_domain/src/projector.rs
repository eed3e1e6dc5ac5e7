use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{describe::ordinal, matcher::weekday_index, pattern::Pattern};

/// Label shown when a pattern kind has no projection.
pub const FALLBACK_LABEL: &str = "Soon";
/// Label shown when a pattern can never fire.
pub const NEVER_LABEL: &str = "Never";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextOccurrence {
    pub date: NaiveDate,
    pub phrase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Projection {
    Next(NextOccurrence),
    /// Biweekly and custom patterns are not projected.
    Unsupported,
    /// The pattern has no index that can ever match.
    Never,
}

impl Projection {
    pub fn label(&self) -> &str {
        match self {
            Projection::Next(next) => &next.phrase,
            Projection::Unsupported => FALLBACK_LABEL,
            Projection::Never => NEVER_LABEL,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Projection::Next(next) => Some(next.date),
            _ => None,
        }
    }
}

/// Next occurrence of `pattern` on or after `today`.
pub fn next_occurrence(pattern: &Pattern, today: NaiveDate) -> Projection {
    match pattern {
        Pattern::Weekly { days_of_week } => {
            let current = weekday_index(today);
            let mut valid = days_of_week.iter().copied().filter(|d| *d <= 6);
            let Some(first) = valid.clone().next() else {
                return Projection::Never;
            };
            let days_until = match valid.find(|d| *d >= current) {
                Some(day) => i64::from(day - current),
                None => i64::from(7 - current + first),
            };
            Projection::Next(NextOccurrence {
                date: today + Duration::days(days_until),
                phrase: relative_phrase(days_until),
            })
        }
        Pattern::Monthly { days_of_month } => project_monthly(days_of_month, today),
        Pattern::Biweekly { .. } | Pattern::Custom { .. } => Projection::Unsupported,
    }
}

fn project_monthly(days_of_month: &BTreeSet<u8>, today: NaiveDate) -> Projection {
    let mut valid = days_of_month
        .iter()
        .map(|d| u32::from(*d))
        .filter(|d| (1..=31).contains(d));
    let Some(first) = valid.clone().next() else {
        return Projection::Never;
    };

    let current = today.day();
    let month_len = days_in_month(today.year(), today.month());
    if let Some(day) = valid.find(|d| *d >= current && *d <= month_len) {
        let phrase = match day - current {
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            _ => format!("on the {}", ordinal(day)),
        };
        let date = today.with_day(day).unwrap_or(today);
        return Projection::Next(NextOccurrence { date, phrase });
    }

    // Nothing left this month: the smallest day rolls into the next month that has it.
    let rolled = (1..=12).find_map(|ahead| {
        let month_start = add_months(first_of_month(today), ahead)?;
        Some((ahead, month_start.with_day(first)?))
    });
    match rolled {
        Some((1, date)) => Projection::Next(NextOccurrence {
            date,
            phrase: format!("on the {} next month", ordinal(first)),
        }),
        Some((_, date)) => Projection::Next(NextOccurrence {
            date,
            phrase: format!("on the {} of {}", ordinal(first), date.format("%B")),
        }),
        None => Projection::Never,
    }
}

fn relative_phrase(days_until: i64) -> String {
    match days_until {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        n => format!("in {n} days"),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total_months = date.year() * 12 + (date.month() as i32 - 1) + months as i32;
    let target_year = total_months.div_euclid(12);
    let target_month = (total_months.rem_euclid(12) + 1) as u32;
    NaiveDate::from_ymd_opt(target_year, target_month, 1)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| add_months(first, 1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn next(pattern: &Pattern, today: NaiveDate) -> NextOccurrence {
        match next_occurrence(pattern, today) {
            Projection::Next(next) => next,
            other => panic!("expected a next occurrence, got {other:?}"),
        }
    }

    #[test]
    fn weekly_today_tomorrow_and_later() {
        // 2024-01-10 is a Wednesday.
        let today = date(2024, 1, 10);
        let on_wednesday = next(&Pattern::weekly([3]), today);
        assert_eq!(on_wednesday.phrase, "Today");
        assert_eq!(on_wednesday.date, today);

        let on_thursday = next(&Pattern::weekly([4]), today);
        assert_eq!(on_thursday.phrase, "Tomorrow");
        assert_eq!(on_thursday.date, date(2024, 1, 11));

        let on_saturday = next(&Pattern::weekly([6, 1]), today);
        assert_eq!(on_saturday.phrase, "in 3 days");
        assert_eq!(on_saturday.date, date(2024, 1, 13));
    }

    #[test]
    fn weekly_wraps_into_next_week() {
        // Saturday, pattern Monday/Tuesday.
        let today = date(2024, 1, 13);
        let occurrence = next(&Pattern::weekly([1, 2]), today);
        assert_eq!(occurrence.date, date(2024, 1, 15));
        assert_eq!(occurrence.phrase, "in 2 days");

        // Saturday, pattern Sunday.
        let sunday = next(&Pattern::weekly([0]), today);
        assert_eq!(sunday.phrase, "Tomorrow");
    }

    #[test]
    fn monthly_within_current_month() {
        let pattern = Pattern::monthly([1, 15, 22]);
        assert_eq!(next(&pattern, date(2024, 1, 15)).phrase, "Today");
        assert_eq!(next(&pattern, date(2024, 1, 14)).phrase, "Tomorrow");
        let later = next(&pattern, date(2024, 1, 16));
        assert_eq!(later.phrase, "on the 22nd");
        assert_eq!(later.date, date(2024, 1, 22));
    }

    #[test]
    fn monthly_rolls_into_next_month() {
        let occurrence = next(&Pattern::monthly([1, 15]), date(2024, 1, 20));
        assert_eq!(occurrence.phrase, "on the 1st next month");
        assert_eq!(occurrence.date, date(2024, 2, 1));

        let december = next(&Pattern::monthly([3]), date(2024, 12, 5));
        assert_eq!(december.phrase, "on the 3rd next month");
        assert_eq!(december.date, date(2025, 1, 3));
    }

    #[test]
    fn monthly_skips_days_missing_from_current_month() {
        // April has no 31st, so the next real one is in May.
        let occurrence = next(&Pattern::monthly([31]), date(2024, 4, 20));
        assert_eq!(occurrence.phrase, "on the 31st next month");
        assert_eq!(occurrence.date, date(2024, 5, 31));

        // January 31st rolls past February into March.
        let skipped = next(&Pattern::monthly([30]), date(2023, 1, 31));
        assert_eq!(skipped.date, date(2023, 3, 30));
        assert_eq!(skipped.phrase, "on the 30th of March");
    }

    #[test]
    fn unsupported_kinds_fall_back_to_soon() {
        let today = date(2024, 1, 10);
        let biweekly = next_occurrence(&Pattern::biweekly([1], [1]), today);
        assert_eq!(biweekly, Projection::Unsupported);
        assert_eq!(biweekly.label(), "Soon");
        assert_eq!(next_occurrence(&Pattern::custom("x"), today).label(), "Soon");
        assert!(biweekly.date().is_none());
    }

    #[test]
    fn degenerate_patterns_never_occur() {
        let today = date(2024, 1, 10);
        assert_eq!(next_occurrence(&Pattern::weekly([]), today), Projection::Never);
        assert_eq!(next_occurrence(&Pattern::weekly([7]), today), Projection::Never);
        assert_eq!(next_occurrence(&Pattern::monthly([0, 40]), today), Projection::Never);
        assert_eq!(Projection::Never.label(), "Never");
    }

    #[test]
    fn repeated_calls_agree() {
        let pattern = Pattern::monthly([5, 25]);
        let today = date(2024, 2, 26);
        assert_eq!(next_occurrence(&pattern, today), next_occurrence(&pattern, today));
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
    }
}
