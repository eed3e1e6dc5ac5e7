use crate::pattern::Pattern;

const WEEKDAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const WEEKDAYS_FULL: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const WEEK_ORDINALS: [&str; 5] = ["1st", "2nd", "3rd", "4th", "5th"];

const UNKNOWN: &str = "?";

/// Human-readable summary of a pattern, e.g. `Every Mon & Wed`,
/// `1st & 3rd Monday` or `1st, 15th of each month`.
///
/// Display only; nothing turns this text back into a [`Pattern`].
pub fn describe(pattern: &Pattern) -> String {
    match pattern {
        Pattern::Weekly { days_of_week } => {
            let days = join(days_of_week.iter().map(|d| weekday_short(*d)), " & ");
            format!("Every {days}")
        }
        Pattern::Biweekly {
            days_of_week,
            weeks_of_month,
        } => {
            let weeks = join(weeks_of_month.iter().map(|w| week_ordinal(*w)), " & ");
            let days = join(days_of_week.iter().map(|d| weekday_full(*d)), " & ");
            format!("{weeks} {days}")
        }
        Pattern::Monthly { days_of_month } => {
            let days = join(days_of_month.iter().map(|d| ordinal(u32::from(*d))), ", ");
            format!("{days} of each month")
        }
        Pattern::Custom { text } => {
            if text.trim().is_empty() {
                "Custom".to_string()
            } else {
                text.clone()
            }
        }
    }
}

pub fn weekday_short(index: u8) -> &'static str {
    WEEKDAYS_SHORT
        .get(usize::from(index))
        .copied()
        .unwrap_or(UNKNOWN)
}

pub fn weekday_full(index: u8) -> &'static str {
    WEEKDAYS_FULL
        .get(usize::from(index))
        .copied()
        .unwrap_or(UNKNOWN)
}

/// `1st`..`5th` for a week-of-month bucket; days 29-31 are the 5th.
pub fn week_ordinal(week: u8) -> &'static str {
    usize::from(week)
        .checked_sub(1)
        .and_then(|idx| WEEK_ORDINALS.get(idx))
        .copied()
        .unwrap_or(UNKNOWN)
}

pub fn ordinal_suffix(n: u32) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

pub fn ordinal(n: u32) -> String {
    format!("{n}{}", ordinal_suffix(n))
}

fn join<S: AsRef<str>>(parts: impl Iterator<Item = S>, sep: &str) -> String {
    parts
        .map(|part| part.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_lists_short_names_in_weekday_order() {
        assert_eq!(describe(&Pattern::weekly([3, 1])), "Every Mon & Wed");
        assert_eq!(describe(&Pattern::weekly([0, 6])), "Every Sun & Sat");
    }

    #[test]
    fn biweekly_puts_weeks_before_days() {
        assert_eq!(describe(&Pattern::biweekly([1], [3, 1])), "1st & 3rd Monday");
        assert_eq!(
            describe(&Pattern::biweekly([2, 4], [2])),
            "2nd Tuesday & Thursday"
        );
    }

    #[test]
    fn monthly_uses_ordinals() {
        assert_eq!(describe(&Pattern::monthly([15, 1])), "1st, 15th of each month");
        assert_eq!(
            describe(&Pattern::monthly([2, 3, 11, 22, 31])),
            "2nd, 3rd, 11th, 22nd, 31st of each month"
        );
    }

    #[test]
    fn custom_returns_raw_text() {
        assert_eq!(describe(&Pattern::custom("Every full moon")), "Every full moon");
        assert_eq!(describe(&Pattern::custom("  ")), "Custom");
    }

    #[test]
    fn out_of_range_indices_render_placeholder() {
        assert_eq!(describe(&Pattern::weekly([1, 9])), "Every Mon & ?");
        assert_eq!(week_ordinal(0), "?");
        assert_eq!(week_ordinal(6), "?");
    }

    #[test]
    fn fifth_week_bucket_has_an_ordinal() {
        assert_eq!(week_ordinal(5), "5th");
        assert_eq!(describe(&Pattern::biweekly([1], [5])), "5th Monday");
    }

    #[test]
    fn repeated_descriptions_agree() {
        let patterns = [
            Pattern::weekly([3, 1]),
            Pattern::biweekly([1], [1, 3]),
            Pattern::monthly([1, 15]),
            Pattern::custom("Every 3 months"),
        ];
        for pattern in &patterns {
            assert_eq!(describe(pattern), describe(pattern));
        }
    }

    #[test]
    fn ordinal_suffix_rules() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (20, "th"),
            (21, "st"),
            (22, "nd"),
            (23, "rd"),
            (30, "th"),
            (31, "st"),
        ];
        for (n, suffix) in cases {
            assert_eq!(ordinal_suffix(n), suffix, "{n}");
        }
    }

    #[test]
    fn degenerate_patterns_still_describe() {
        assert_eq!(describe(&Pattern::weekly([])), "Every ");
        assert_eq!(describe(&Pattern::monthly([])), " of each month");
    }
}
