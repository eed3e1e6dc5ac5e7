pub mod completion;
pub mod describe;
pub mod document;
pub mod habit;
pub mod matcher;
pub mod notifications;
pub mod pattern;
pub mod projector;
pub mod routine;
pub mod service;
pub mod streak;

pub use crate::completion::CompletionLog;
pub use crate::describe::describe;
pub use crate::matcher::is_occurrence;
pub use crate::pattern::{Pattern, PatternError, PatternKind};
pub use crate::projector::{next_occurrence, NextOccurrence, Projection};
pub use crate::service::{TrackerError, TrackerService, TrackerServiceBuilder};
pub use crate::streak::{best_streak, completions_in_window, current_streak, StreakState};
