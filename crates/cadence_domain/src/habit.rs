use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    completion::CompletionLog,
    describe::describe,
    pattern::Pattern,
    streak::{
        best_streak, completions_this_week, current_streak, week_progress, StreakState,
        WeekProgress,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub frequency: HabitFrequency,
    #[serde(default = "default_target")]
    pub target_per_period: u32,
    /// Weekday indices (Sunday = 0) for [`HabitFrequency::Custom`].
    #[serde(default)]
    pub custom_days: BTreeSet<u8>,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    #[serde(default, rename = "completedDates")]
    pub completed: CompletionLog,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_on: Option<NaiveDate>,
    #[serde(default)]
    pub best_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Anytime,
}

fn default_target() -> u32 {
    7
}

impl Habit {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            color: String::new(),
            icon: String::new(),
            frequency: HabitFrequency::Daily,
            target_per_period: default_target(),
            custom_days: BTreeSet::new(),
            time_of_day: TimeOfDay::Anytime,
            completed: CompletionLog::new(),
            archived: false,
            created_on: None,
            best_streak: 0,
        }
    }

    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.completed.contains(date)
    }

    /// Flip `date` in the completion log, then ratchet the best streak against
    /// the streak of the new log.
    pub fn toggle(&mut self, date: NaiveDate, today: NaiveDate) -> StreakState {
        self.completed = self.completed.toggled(date);
        self.best_streak = best_streak(self.best_streak, current_streak(&self.completed, today));
        self.streak(today)
    }

    /// Clears the completion log. The best streak is kept.
    pub fn reset(&mut self) {
        self.completed.clear();
    }

    pub fn set_archived(&mut self, archived: bool) {
        self.archived = archived;
    }

    pub fn streak(&self, today: NaiveDate) -> StreakState {
        let current = current_streak(&self.completed, today);
        StreakState {
            current,
            best: best_streak(self.best_streak, current),
        }
    }

    pub fn week_progress(&self, today: NaiveDate) -> WeekProgress {
        week_progress(&self.completed, today)
    }

    pub fn schedule_label(&self) -> String {
        match self.frequency {
            HabitFrequency::Daily => "Daily".to_string(),
            HabitFrequency::Weekly => format!("{}x per week", self.target_per_period.min(7)),
            HabitFrequency::Custom => describe(&Pattern::weekly(self.custom_days.iter().copied())),
        }
    }
}

/// Dashboard summary across all habits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitStats {
    pub completed_today: u32,
    pub total_active: u32,
    pub longest_current_streak: u32,
    pub all_time_best_streak: u32,
    /// Rounded percentage of active habits completed today.
    pub completion_rate: u32,
    pub weekly_completions: u32,
    pub weekly_target: u32,
}

impl HabitStats {
    pub fn compute(habits: &[Habit], today: NaiveDate) -> Self {
        let active: Vec<&Habit> = habits.iter().filter(|habit| !habit.archived).collect();
        let total_active = active.len() as u32;
        let completed_today = active
            .iter()
            .filter(|habit| habit.completed_on(today))
            .count() as u32;
        let completion_rate = if total_active > 0 {
            (f64::from(completed_today) * 100.0 / f64::from(total_active)).round() as u32
        } else {
            0
        };
        Self {
            completed_today,
            total_active,
            longest_current_streak: active
                .iter()
                .map(|habit| current_streak(&habit.completed, today))
                .max()
                .unwrap_or(0),
            all_time_best_streak: habits
                .iter()
                .map(|habit| habit.best_streak)
                .max()
                .unwrap_or(0),
            completion_rate,
            weekly_completions: active
                .iter()
                .map(|habit| completions_this_week(&habit.completed, today))
                .sum(),
            weekly_target: active
                .iter()
                .map(|habit| habit.target_per_period.min(7))
                .sum(),
        }
    }
}
