use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::{
    document::{TrackerContents, TrackerDocument},
    habit::{Habit, HabitStats},
    notifications::{NotificationSink, ReminderRequest},
    pattern::Pattern,
    routine::Routine,
    streak::{StreakState, WeekProgress},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("routine `{0}` not found")]
    RoutineNotFound(String),
    #[error("habit `{0}` not found")]
    HabitNotFound(String),
    #[error("id `{0}` is already in use")]
    DuplicateId(String),
    #[error("`{}` is not a tracker document under a configured root", .0.display())]
    InvalidTarget(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutineView {
    pub id: String,
    pub title: String,
    pub category: String,
    pub summary: String,
    pub due_today: bool,
    pub next_label: String,
    pub next_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitView {
    pub id: String,
    pub name: String,
    pub schedule: String,
    pub archived: bool,
    pub completed_today: bool,
    pub streak: StreakState,
    pub week: WeekProgress,
}

/// Everything the dashboard needs for one reference day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub today: NaiveDate,
    pub routines: Vec<RoutineView>,
    pub habits: Vec<HabitView>,
    pub stats: HabitStats,
}

pub struct TrackerService {
    roots: Vec<PathBuf>,
    documents: RwLock<HashMap<PathBuf, TrackerDocument>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

pub struct TrackerServiceBuilder {
    roots: Vec<PathBuf>,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

impl TrackerServiceBuilder {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            notification_sink: None,
        }
    }

    pub fn add_root(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if !self.roots.contains(&path) {
            self.roots.push(path);
        }
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<TrackerService> {
        let service = TrackerService {
            roots: self.roots,
            documents: RwLock::new(HashMap::new()),
            notification_sink: self.notification_sink,
        };
        service.reload_all()?;
        Ok(service)
    }
}

impl Default for TrackerServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerService {
    pub fn builder() -> TrackerServiceBuilder {
        TrackerServiceBuilder::new()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots = self.roots.clone();
        roots.sort();
        roots
    }

    pub fn reload_all(&self) -> Result<()> {
        let mut docs = self.documents.write();
        docs.clear();
        for root in &self.roots {
            Self::ingest_root(&mut docs, root)?;
        }
        info!(documents = docs.len(), "tracker documents loaded");
        Ok(())
    }

    pub fn list_documents(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = self.documents.read().keys().cloned().collect();
        entries.sort();
        entries
    }

    pub fn routines(&self) -> Vec<Routine> {
        let docs = self.documents.read();
        let mut routines: Vec<Routine> = docs
            .values()
            .flat_map(|doc| doc.routines().iter().cloned())
            .collect();
        routines.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        routines
    }

    pub fn habits(&self) -> Vec<Habit> {
        let docs = self.documents.read();
        let mut habits: Vec<Habit> = docs
            .values()
            .flat_map(|doc| doc.habits().iter().cloned())
            .collect();
        habits.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        habits
    }

    pub fn routine(&self, id: &str) -> Result<Routine> {
        self.routines()
            .into_iter()
            .find(|routine| routine.id == id)
            .ok_or_else(|| TrackerError::RoutineNotFound(id.to_string()).into())
    }

    pub fn habit(&self, id: &str) -> Result<Habit> {
        self.habits()
            .into_iter()
            .find(|habit| habit.id == id)
            .ok_or_else(|| TrackerError::HabitNotFound(id.to_string()).into())
    }

    pub fn routines_due(&self, today: NaiveDate) -> Vec<Routine> {
        self.routines()
            .into_iter()
            .filter(|routine| routine.is_due(today))
            .collect()
    }

    pub fn snapshot(&self, today: NaiveDate) -> DashboardSnapshot {
        let routines = self
            .routines()
            .iter()
            .map(|routine| {
                let next = routine.next(today);
                RoutineView {
                    id: routine.id.clone(),
                    title: routine.title.clone(),
                    category: routine.category.clone(),
                    summary: routine.summary(),
                    due_today: routine.is_due(today),
                    next_label: next.label().to_string(),
                    next_date: next.date(),
                }
            })
            .collect();
        let habits = self.habits();
        let stats = HabitStats::compute(&habits, today);
        let habits = habits
            .iter()
            .map(|habit| HabitView {
                id: habit.id.clone(),
                name: habit.name.clone(),
                schedule: habit.schedule_label(),
                archived: habit.archived,
                completed_today: habit.completed_on(today),
                streak: habit.streak(today),
                week: habit.week_progress(today),
            })
            .collect();
        DashboardSnapshot {
            today,
            routines,
            habits,
            stats,
        }
    }

    #[instrument(skip(self))]
    pub fn toggle_habit(&self, id: &str, date: NaiveDate, today: NaiveDate) -> Result<StreakState> {
        let state = self.update_habit(id, |habit| habit.toggle(date, today))?;
        debug!(current = state.current, best = state.best, "habit toggled");
        Ok(state)
    }

    #[instrument(skip(self))]
    pub fn reset_habit(&self, id: &str) -> Result<()> {
        self.update_habit(id, Habit::reset)
    }

    #[instrument(skip(self))]
    pub fn set_habit_archived(&self, id: &str, archived: bool) -> Result<()> {
        self.update_habit(id, |habit| habit.set_archived(archived))
    }

    #[instrument(skip(self))]
    pub fn replace_routine_pattern(&self, id: &str, pattern: Pattern) -> Result<Routine> {
        let updated = self.update_routine(id, |routine| {
            *routine = routine.with_pattern(pattern);
            routine.clone()
        })?;
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_routine(&updated);
        }
        Ok(updated)
    }

    /// Add `routine` to the document at `target`, creating the document when
    /// it does not exist yet. `target` must be a `.json` file beneath one of
    /// the service roots.
    #[instrument(skip_all, fields(id = %routine.id))]
    pub fn add_routine(&self, target: impl AsRef<Path>, routine: Routine) -> Result<()> {
        let id = routine.id.clone();
        self.insert_into_document(target.as_ref(), &id, |contents| contents.routines.push(routine))
    }

    #[instrument(skip_all, fields(id = %habit.id))]
    pub fn add_habit(&self, target: impl AsRef<Path>, habit: Habit) -> Result<()> {
        let id = habit.id.clone();
        self.insert_into_document(target.as_ref(), &id, |contents| contents.habits.push(habit))
    }

    #[instrument(skip(self))]
    pub fn remove_routine(&self, id: &str) -> Result<Routine> {
        let mut docs = self.documents.write();
        let (doc, index) = Self::locate_routine(&mut docs, id)?;
        let mut contents = doc.contents().clone();
        let removed = contents.routines.remove(index);
        doc.replace_contents(contents)?;
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_routine(&removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn remove_habit(&self, id: &str) -> Result<Habit> {
        let mut docs = self.documents.write();
        let (doc, index) = Self::locate_habit(&mut docs, id)?;
        let mut contents = doc.contents().clone();
        let removed = contents.habits.remove(index);
        doc.replace_contents(contents)?;
        Ok(removed)
    }

    /// Hand one reminder per routine due on `today` to the notification sink.
    /// Returns how many were scheduled.
    pub fn schedule_reminders(&self, today: NaiveDate) -> usize {
        let Some(sink) = &self.notification_sink else {
            return 0;
        };
        let mut scheduled = 0;
        for routine in self.routines_due(today) {
            if let Some(reminder) = ReminderRequest::for_routine(&routine, today) {
                sink.schedule(reminder);
                scheduled += 1;
            }
        }
        debug!(scheduled, %today, "routine reminders scheduled");
        scheduled
    }
}

impl TrackerService {
    /// Read-modify-write of the whole document holding habit `id`, under the
    /// write lock.
    fn update_habit<T>(&self, id: &str, f: impl FnOnce(&mut Habit) -> T) -> Result<T> {
        let mut docs = self.documents.write();
        let (doc, index) = Self::locate_habit(&mut docs, id)?;
        let mut contents = doc.contents().clone();
        let out = f(&mut contents.habits[index]);
        doc.replace_contents(contents)?;
        Ok(out)
    }

    fn update_routine<T>(&self, id: &str, f: impl FnOnce(&mut Routine) -> T) -> Result<T> {
        let mut docs = self.documents.write();
        let (doc, index) = Self::locate_routine(&mut docs, id)?;
        let mut contents = doc.contents().clone();
        let out = f(&mut contents.routines[index]);
        doc.replace_contents(contents)?;
        Ok(out)
    }

    fn locate_routine<'a>(
        docs: &'a mut HashMap<PathBuf, TrackerDocument>,
        id: &str,
    ) -> Result<(&'a mut TrackerDocument, usize), TrackerError> {
        docs.values_mut()
            .find_map(|doc| {
                let index = doc.routines().iter().position(|r| r.id == id)?;
                Some((doc, index))
            })
            .ok_or_else(|| TrackerError::RoutineNotFound(id.to_string()))
    }

    fn locate_habit<'a>(
        docs: &'a mut HashMap<PathBuf, TrackerDocument>,
        id: &str,
    ) -> Result<(&'a mut TrackerDocument, usize), TrackerError> {
        docs.values_mut()
            .find_map(|doc| {
                let index = doc.habits().iter().position(|h| h.id == id)?;
                Some((doc, index))
            })
            .ok_or_else(|| TrackerError::HabitNotFound(id.to_string()))
    }

    fn insert_into_document(
        &self,
        target: &Path,
        id: &str,
        f: impl FnOnce(&mut TrackerContents),
    ) -> Result<()> {
        let resolved = self.resolve_target(target)?;
        let mut docs = self.documents.write();
        if docs.values().any(|doc| Self::uses_id(doc, id)) {
            return Err(TrackerError::DuplicateId(id.to_string()).into());
        }

        // The same file may already be loaded under another spelling of its path.
        let loaded = docs
            .iter()
            .find(|(key, _)| resolve_path(key).as_deref() == Some(resolved.as_path()))
            .map(|(key, doc)| (key.clone(), doc.clone()));
        let (key, mut doc) = match loaded {
            Some(entry) => entry,
            None if resolved.exists() => {
                let doc = TrackerDocument::load(&resolved)?;
                Self::check_unique_ids(&docs, doc.contents())?;
                if Self::uses_id(&doc, id) {
                    return Err(TrackerError::DuplicateId(id.to_string()).into());
                }
                (resolved, doc)
            }
            None => {
                let doc = TrackerDocument::from_contents(&resolved, TrackerContents::default());
                (resolved, doc)
            }
        };
        let mut contents = doc.contents().clone();
        f(&mut contents);
        doc.replace_contents(contents)?;
        docs.insert(key, doc);
        Ok(())
    }

    /// Absolute location of `target`, provided it is a tracker file that a
    /// later reload would pick up again.
    fn resolve_target(&self, target: &Path) -> Result<PathBuf, TrackerError> {
        let invalid = || TrackerError::InvalidTarget(target.to_path_buf());
        if !Self::is_tracker_file(target) {
            return Err(invalid());
        }
        let resolved = resolve_path(target).ok_or_else(invalid)?;
        let under_root = self
            .roots
            .iter()
            .filter_map(|root| fs::canonicalize(root).ok())
            .any(|root| resolved.starts_with(root));
        if under_root {
            Ok(resolved)
        } else {
            Err(invalid())
        }
    }

    fn uses_id(doc: &TrackerDocument, id: &str) -> bool {
        doc.routines().iter().any(|r| r.id == id) || doc.habits().iter().any(|h| h.id == id)
    }

    /// Fails on the first id in `contents` that a loaded document already
    /// uses or that appears twice within `contents`.
    fn check_unique_ids(
        docs: &HashMap<PathBuf, TrackerDocument>,
        contents: &TrackerContents,
    ) -> Result<(), TrackerError> {
        let mut seen: HashSet<&str> = docs
            .values()
            .flat_map(|doc| {
                let routines = doc.routines().iter().map(|r| r.id.as_str());
                routines.chain(doc.habits().iter().map(|h| h.id.as_str()))
            })
            .collect();
        let ids = contents
            .routines
            .iter()
            .map(|r| r.id.as_str())
            .chain(contents.habits.iter().map(|h| h.id.as_str()));
        for id in ids {
            if !seen.insert(id) {
                return Err(TrackerError::DuplicateId(id.to_string()));
            }
        }
        Ok(())
    }

    fn ingest_root(docs: &mut HashMap<PathBuf, TrackerDocument>, path: &Path) -> Result<()> {
        if path.is_file() {
            if Self::is_tracker_file(path) {
                Self::ingest_file(docs, path);
            }
            return Ok(());
        }

        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                let entry_path = entry.path();
                if entry.file_type().is_file() && Self::is_tracker_file(entry_path) {
                    Self::ingest_file(docs, entry_path);
                }
            }
        }
        Ok(())
    }

    fn ingest_file(docs: &mut HashMap<PathBuf, TrackerDocument>, path: &Path) {
        match TrackerDocument::load(path) {
            Ok(doc) => {
                if let Err(err) = Self::check_unique_ids(docs, doc.contents()) {
                    warn!(path = %path.display(), %err, "skipping tracker document");
                    return;
                }
                debug!(
                    path = %path.display(),
                    routines = doc.routines().len(),
                    habits = doc.habits().len(),
                    "tracker document ingested"
                );
                docs.insert(path.to_path_buf(), doc);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(path = %path.display(), %reason, "skipping tracker document");
            }
        }
    }

    fn is_tracker_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

/// Canonical form of `path`, which need not exist yet: the longest existing
/// ancestor is canonicalized and the missing components are appended.
fn resolve_path(path: &Path) -> Option<PathBuf> {
    let mut missing = Vec::new();
    let mut cursor = path;
    loop {
        if let Ok(mut resolved) = fs::canonicalize(cursor) {
            resolved.extend(missing.iter().rev());
            return Some(resolved);
        }
        missing.push(cursor.file_name()?.to_os_string());
        cursor = match cursor.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            Some(_) => Path::new("."),
            None => return None,
        };
    }
}
