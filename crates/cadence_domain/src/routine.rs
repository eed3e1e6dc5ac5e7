use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    describe::describe,
    matcher::is_occurrence,
    pattern::{Pattern, PatternError, PatternKind},
    projector::{next_occurrence, Projection},
};

/// A recurring reminder such as "take out the trash".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RoutineRecord", into = "RoutineRecord")]
pub struct Routine {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub category: String,
    pub pattern: Pattern,
}

impl Routine {
    pub fn new(id: impl Into<String>, title: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            icon: default_icon(),
            color: default_color(),
            category: default_category(),
            pattern,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        is_occurrence(&self.pattern, today)
    }

    pub fn next(&self, today: NaiveDate) -> Projection {
        next_occurrence(&self.pattern, today)
    }

    pub fn summary(&self) -> String {
        describe(&self.pattern)
    }

    /// Same routine with its pattern replaced wholesale.
    pub fn with_pattern(&self, pattern: Pattern) -> Self {
        Self {
            pattern,
            ..self.clone()
        }
    }
}

/// Shape exchanged with the routine form and the backend: the recurrence kind
/// is a string and every index list is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoutineRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub recurrence_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeks_of_month: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_month: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pattern: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

impl TryFrom<RoutineRecord> for Routine {
    type Error = PatternError;

    fn try_from(record: RoutineRecord) -> Result<Self, Self::Error> {
        let kind: PatternKind = record.recurrence_type.parse()?;
        let pattern = Pattern::from_parts(
            kind,
            record.days_of_week.as_deref(),
            record.weeks_of_month.as_deref(),
            record.days_of_month.as_deref(),
            record.custom_pattern.as_deref(),
        );
        Ok(Routine {
            id: record.id,
            title: record.title,
            description: record.description,
            icon: record.icon,
            color: record.color,
            category: record.category,
            pattern,
        })
    }
}

impl From<Routine> for RoutineRecord {
    fn from(routine: Routine) -> Self {
        let indices = |set: Option<&BTreeSet<u8>>| {
            set.map(|values| values.iter().map(|v| i32::from(*v)).collect::<Vec<_>>())
        };
        RoutineRecord {
            recurrence_type: routine.pattern.kind().as_str().to_string(),
            days_of_week: indices(routine.pattern.days_of_week()),
            weeks_of_month: indices(routine.pattern.weeks_of_month()),
            days_of_month: indices(routine.pattern.days_of_month()),
            custom_pattern: routine.pattern.custom_text().map(str::to_string),
            id: routine.id,
            title: routine.title,
            description: routine.description,
            icon: routine.icon,
            color: routine.color,
            category: routine.category,
        }
    }
}

fn default_icon() -> String {
    "Recycle".to_string()
}

fn default_color() -> String {
    "bg-green-500".to_string()
}

fn default_category() -> String {
    "Other".to_string()
}
