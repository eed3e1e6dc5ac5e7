use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_domain::{
    describe::weekday_short,
    matcher::{is_occurrence, week_dates, weekday_index},
    service::DashboardSnapshot,
    TrackerService, TrackerServiceBuilder,
};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) roots: Vec<PathBuf>,
    pub(crate) today: Option<NaiveDate>,
    pub(crate) week_offset: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            roots: Vec::new(),
            today: None,
            week_offset: 0,
        };
        if let Ok(root) = std::env::var("CADENCE_ROOT") {
            config.push_root(PathBuf::from(root));
        }
        if let Ok(list) = std::env::var("CADENCE_ROOTS") {
            for path in std::env::split_paths(&list) {
                config.push_root(path);
            }
        }
        if let Ok(today) = std::env::var("CADENCE_TODAY") {
            match NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d") {
                Ok(date) => config.today = Some(date),
                Err(err) => warn!(value = %today, %err, "ignoring CADENCE_TODAY"),
            }
        }
        if let Ok(offset) = std::env::var("CADENCE_WEEK_OFFSET") {
            match offset.trim().parse::<i64>() {
                Ok(value) => config.week_offset = value,
                Err(err) => warn!(value = %offset, %err, "ignoring CADENCE_WEEK_OFFSET"),
            }
        }
        if config.roots.is_empty() {
            config.push_root(std::env::current_dir().context("resolving working directory")?);
        }
        Ok(config)
    }

    pub(crate) fn push_root(&mut self, path: PathBuf) {
        if !self.roots.contains(&path) {
            info!(path = %path.display(), "registering root");
            self.roots.push(path);
        }
    }

    /// Reference date for every calculation; the system clock is only read
    /// when no override is configured.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            today: None,
            week_offset: 0,
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let today = config.today();
    let service = build_service(&config)?;
    debug!(%today, documents = service.list_documents().len(), "rendering dashboard");
    let snapshot = service.snapshot(today);
    print!("{}", render_dashboard(&service, &snapshot, config.week_offset));
    Ok(())
}

fn build_service(config: &AppConfig) -> Result<TrackerService> {
    let mut builder = TrackerServiceBuilder::new();
    for root in &config.roots {
        builder = builder.add_root(root);
    }
    builder.build()
}

pub(crate) fn render_dashboard(
    service: &TrackerService,
    snapshot: &DashboardSnapshot,
    week_offset: i64,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", snapshot.today.format("%A, %B %d, %Y")));

    out.push_str("Today's routines\n");
    let due: Vec<_> = snapshot.routines.iter().filter(|view| view.due_today).collect();
    if due.is_empty() {
        out.push_str("  nothing due\n");
    }
    for view in due {
        out.push_str(&format!("  * {} ({})\n", view.title, view.summary));
    }

    let week = week_dates(snapshot.today, week_offset);
    out.push_str("\nRoutines\n");
    out.push_str(&format!("  {:<24}", ""));
    for day in &week {
        out.push_str(&format!(" {:>3}", weekday_short(weekday_index(*day))));
    }
    out.push('\n');
    for routine in service.routines() {
        out.push_str(&format!("  {:<24}", truncate(&routine.title, 24)));
        for day in &week {
            let cell = if is_occurrence(&routine.pattern, *day) { "#" } else { "." };
            out.push_str(&format!(" {cell:>3}"));
        }
        let label = snapshot
            .routines
            .iter()
            .find(|view| view.id == routine.id)
            .map(|view| view.next_label.as_str())
            .unwrap_or_default();
        out.push_str(&format!("  Next: {label}\n"));
    }

    out.push_str("\nHabits\n");
    for habit in snapshot.habits.iter().filter(|habit| !habit.archived) {
        let dots: String = habit
            .week
            .days
            .iter()
            .map(|done| if *done { 'X' } else { '_' })
            .collect();
        out.push_str(&format!(
            "  {} {:<22} {} streak {} day{} (best {})\n",
            if habit.completed_today { "[x]" } else { "[ ]" },
            truncate(&habit.name, 22),
            dots,
            habit.streak.current,
            if habit.streak.current == 1 { "" } else { "s" },
            habit.streak.best,
        ));
    }

    let stats = &snapshot.stats;
    out.push_str(&format!(
        "\n{}/{} habits done today ({}%), {}/{} this week, best streak {}\n",
        stats.completed_today,
        stats.total_active,
        stats.completion_rate,
        stats.weekly_completions,
        stats.weekly_target,
        stats.all_time_best_streak,
    ));
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
