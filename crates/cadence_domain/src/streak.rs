use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{completion::CompletionLog, matcher::weekday_index};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
}

/// Seven days ending on `today`, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekProgress {
    pub completed: u32,
    pub days: Vec<bool>,
}

/// Consecutive completed days ending today or yesterday.
///
/// A log whose latest entry is yesterday still counts: today has not been
/// missed yet. Anything older breaks the streak.
pub fn current_streak(log: &CompletionLog, today: NaiveDate) -> u32 {
    let mut dates = log.iter().rev();
    let Some(latest) = dates.next() else {
        return 0;
    };
    let days_since = today.signed_duration_since(latest).num_days();
    if days_since != 0 && days_since != 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for date in dates {
        if previous.signed_duration_since(date).num_days() > 1 {
            break;
        }
        streak += 1;
        previous = date;
    }
    streak
}

pub fn best_streak(previous_best: u32, new_current: u32) -> u32 {
    previous_best.max(new_current)
}

pub fn streak_state(log: &CompletionLog, previous_best: u32, today: NaiveDate) -> StreakState {
    let current = current_streak(log, today);
    StreakState {
        current,
        best: best_streak(previous_best, current),
    }
}

pub fn completions_in_window(
    log: &CompletionLog,
    window_start: NaiveDate,
    window_end_inclusive: NaiveDate,
) -> u32 {
    log.iter()
        .filter(|date| *date >= window_start && *date <= window_end_inclusive)
        .count() as u32
}

/// Completions from the most recent Sunday through `today`.
pub fn completions_this_week(log: &CompletionLog, today: NaiveDate) -> u32 {
    let week_start = today - Duration::days(i64::from(weekday_index(today)));
    completions_in_window(log, week_start, today)
}

pub fn week_progress(log: &CompletionLog, today: NaiveDate) -> WeekProgress {
    let days: Vec<bool> = (0..7)
        .rev()
        .map(|offset| log.contains(today - Duration::days(offset)))
        .collect();
    WeekProgress {
        completed: days.iter().filter(|done| **done).count() as u32,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log(dates: &[(i32, u32, u32)]) -> CompletionLog {
        dates.iter().map(|(y, m, d)| date(*y, *m, *d)).collect()
    }

    #[test]
    fn empty_log_has_no_streak() {
        assert_eq!(current_streak(&CompletionLog::new(), date(2024, 1, 10)), 0);
        assert_eq!(current_streak(&CompletionLog::new(), date(1999, 12, 31)), 0);
    }

    #[test]
    fn single_entry_today_or_yesterday_counts() {
        let today = date(2024, 1, 10);
        assert_eq!(current_streak(&log(&[(2024, 1, 10)]), today), 1);
        assert_eq!(current_streak(&log(&[(2024, 1, 9)]), today), 1);
        assert_eq!(current_streak(&log(&[(2024, 1, 8)]), today), 0);
    }

    #[test]
    fn consecutive_days_accumulate() {
        let entries = log(&[(2024, 1, 8), (2024, 1, 9), (2024, 1, 10)]);
        assert_eq!(current_streak(&entries, date(2024, 1, 10)), 3);
        assert_eq!(current_streak(&entries, date(2024, 1, 11)), 3);
        assert_eq!(current_streak(&entries, date(2024, 1, 12)), 0);
    }

    #[test]
    fn gap_stops_the_walk() {
        let entries = log(&[(2024, 1, 1), (2024, 1, 2), (2024, 1, 5), (2024, 1, 6)]);
        assert_eq!(current_streak(&entries, date(2024, 1, 6)), 2);
    }

    #[test]
    fn streak_crosses_month_and_year_boundaries() {
        let entries = log(&[(2023, 12, 30), (2023, 12, 31), (2024, 1, 1)]);
        assert_eq!(current_streak(&entries, date(2024, 1, 1)), 3);
        let leap = log(&[(2024, 2, 28), (2024, 2, 29), (2024, 3, 1)]);
        assert_eq!(current_streak(&leap, date(2024, 3, 2)), 3);
    }

    #[test]
    fn latest_entry_after_today_breaks_the_streak() {
        let entries = log(&[(2024, 1, 9), (2024, 1, 10), (2024, 1, 11)]);
        assert_eq!(current_streak(&entries, date(2024, 1, 10)), 0);
        assert_eq!(current_streak(&entries, date(2024, 1, 11)), 3);
    }

    #[test]
    fn repeated_streak_queries_agree() {
        let entries = log(&[(2024, 1, 8), (2024, 1, 9), (2024, 1, 10)]);
        let today = date(2024, 1, 10);
        let first = current_streak(&entries, today);
        assert_eq!(first, 3);
        assert_eq!(current_streak(&entries, today), first);
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn best_streak_is_a_high_water_mark() {
        assert_eq!(best_streak(5, 3), 5);
        assert_eq!(best_streak(2, 3), 3);
        let state = streak_state(&log(&[(2024, 1, 10)]), 4, date(2024, 1, 10));
        assert_eq!(state, StreakState { current: 1, best: 4 });
    }

    #[test]
    fn window_counts_are_inclusive() {
        let entries = log(&[(2024, 1, 1), (2024, 1, 5), (2024, 1, 7), (2024, 1, 8)]);
        assert_eq!(completions_in_window(&entries, date(2024, 1, 5), date(2024, 1, 7)), 2);
        assert_eq!(completions_in_window(&entries, date(2024, 1, 9), date(2024, 1, 30)), 0);
    }

    #[test]
    fn this_week_starts_on_sunday() {
        // 2024-01-10 is a Wednesday; the week began on Sunday 2024-01-07.
        let entries = log(&[(2024, 1, 6), (2024, 1, 7), (2024, 1, 9), (2024, 1, 11)]);
        assert_eq!(completions_this_week(&entries, date(2024, 1, 10)), 2);
    }

    #[test]
    fn week_progress_runs_oldest_first() {
        let entries = log(&[(2024, 1, 4), (2024, 1, 9), (2024, 1, 10)]);
        let progress = week_progress(&entries, date(2024, 1, 10));
        assert_eq!(progress.completed, 3);
        assert_eq!(
            progress.days,
            vec![true, false, false, false, false, true, true]
        );
    }
}
