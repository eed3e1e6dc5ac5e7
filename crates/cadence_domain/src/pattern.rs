use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recurrence description for a routine. Each variant carries only the index
/// sets that are meaningful for it.
///
/// Index conventions: weekdays are `0..=6` with Sunday = 0, weeks of month are
/// `1..=4` (days 29-31 fall in bucket 5), days of month are `1..=31`. Values outside those ranges are kept
/// as-is and never match; an empty set is a valid pattern that never fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    Weekly {
        days_of_week: BTreeSet<u8>,
    },
    /// "Specific weeks": a weekday restricted to some 7-day buckets of the month.
    Biweekly {
        days_of_week: BTreeSet<u8>,
        weeks_of_month: BTreeSet<u8>,
    },
    Monthly {
        days_of_month: BTreeSet<u8>,
    },
    /// Free text shown to the user, never evaluated against dates.
    Custom {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Weekly,
    Biweekly,
    Monthly,
    Custom,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unknown recurrence type `{0}`")]
    UnknownKind(String),
}

impl Pattern {
    pub fn weekly(days_of_week: impl IntoIterator<Item = u8>) -> Self {
        Pattern::Weekly {
            days_of_week: days_of_week.into_iter().collect(),
        }
    }

    pub fn biweekly(
        days_of_week: impl IntoIterator<Item = u8>,
        weeks_of_month: impl IntoIterator<Item = u8>,
    ) -> Self {
        Pattern::Biweekly {
            days_of_week: days_of_week.into_iter().collect(),
            weeks_of_month: weeks_of_month.into_iter().collect(),
        }
    }

    pub fn monthly(days_of_month: impl IntoIterator<Item = u8>) -> Self {
        Pattern::Monthly {
            days_of_month: days_of_month.into_iter().collect(),
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        Pattern::Custom { text: text.into() }
    }

    pub fn kind(&self) -> PatternKind {
        match self {
            Pattern::Weekly { .. } => PatternKind::Weekly,
            Pattern::Biweekly { .. } => PatternKind::Biweekly,
            Pattern::Monthly { .. } => PatternKind::Monthly,
            Pattern::Custom { .. } => PatternKind::Custom,
        }
    }

    /// Build a pattern from loosely-typed form fields, keeping only the ones
    /// that belong to `kind`. Values that cannot be an index at all (negative,
    /// above 255) are dropped since they could never match anyway.
    pub fn from_parts(
        kind: PatternKind,
        days_of_week: Option<&[i32]>,
        weeks_of_month: Option<&[i32]>,
        days_of_month: Option<&[i32]>,
        custom_text: Option<&str>,
    ) -> Self {
        match kind {
            PatternKind::Weekly => Pattern::Weekly {
                days_of_week: to_index_set(days_of_week),
            },
            PatternKind::Biweekly => Pattern::Biweekly {
                days_of_week: to_index_set(days_of_week),
                weeks_of_month: to_index_set(weeks_of_month),
            },
            PatternKind::Monthly => Pattern::Monthly {
                days_of_month: to_index_set(days_of_month),
            },
            PatternKind::Custom => Pattern::Custom {
                text: custom_text.unwrap_or_default().to_string(),
            },
        }
    }

    pub fn days_of_week(&self) -> Option<&BTreeSet<u8>> {
        match self {
            Pattern::Weekly { days_of_week } | Pattern::Biweekly { days_of_week, .. } => {
                Some(days_of_week)
            }
            _ => None,
        }
    }

    pub fn weeks_of_month(&self) -> Option<&BTreeSet<u8>> {
        match self {
            Pattern::Biweekly { weeks_of_month, .. } => Some(weeks_of_month),
            _ => None,
        }
    }

    pub fn days_of_month(&self) -> Option<&BTreeSet<u8>> {
        match self {
            Pattern::Monthly { days_of_month } => Some(days_of_month),
            _ => None,
        }
    }

    pub fn custom_text(&self) -> Option<&str> {
        match self {
            Pattern::Custom { text } => Some(text),
            _ => None,
        }
    }

    /// True when no date can ever match: an empty or entirely out-of-range
    /// index set, or a custom pattern.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Pattern::Weekly { days_of_week } => !days_of_week.iter().any(|d| *d <= 6),
            Pattern::Biweekly {
                days_of_week,
                weeks_of_month,
            } => {
                !days_of_week.iter().any(|d| *d <= 6)
                    || !weeks_of_month.iter().any(|w| (1..=5).contains(w))
            }
            Pattern::Monthly { days_of_month } => {
                !days_of_month.iter().any(|d| (1..=31).contains(d))
            }
            Pattern::Custom { .. } => true,
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::Weekly {
            days_of_week: BTreeSet::new(),
        }
    }
}

fn to_index_set(values: Option<&[i32]>) -> BTreeSet<u8> {
    values
        .unwrap_or_default()
        .iter()
        .filter_map(|value| u8::try_from(*value).ok())
        .collect()
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Weekly => "weekly",
            PatternKind::Biweekly => "biweekly",
            PatternKind::Monthly => "monthly",
            PatternKind::Custom => "custom",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        if normalized.eq_ignore_ascii_case("weekly") {
            Ok(PatternKind::Weekly)
        } else if normalized.eq_ignore_ascii_case("biweekly") {
            Ok(PatternKind::Biweekly)
        } else if normalized.eq_ignore_ascii_case("monthly") {
            Ok(PatternKind::Monthly)
        } else if normalized.eq_ignore_ascii_case("custom") {
            Ok(PatternKind::Custom)
        } else {
            Err(PatternError::UnknownKind(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_keeps_only_fields_for_kind() {
        let pattern = Pattern::from_parts(
            PatternKind::Monthly,
            Some(&[1, 3][..]),
            Some(&[2][..]),
            Some(&[15, 1, 15][..]),
            Some("ignored"),
        );
        assert_eq!(pattern, Pattern::monthly([1, 15]));
        assert!(pattern.days_of_week().is_none());
        assert!(pattern.custom_text().is_none());
    }

    #[test]
    fn from_parts_drops_values_that_cannot_be_indices() {
        let pattern =
            Pattern::from_parts(PatternKind::Weekly, Some(&[-1, 2, 300, 9][..]), None, None, None);
        assert_eq!(pattern, Pattern::weekly([2, 9]));
    }

    #[test]
    fn parses_kind_case_insensitively() {
        assert_eq!("Weekly".parse::<PatternKind>(), Ok(PatternKind::Weekly));
        assert_eq!(" biweekly ".parse::<PatternKind>(), Ok(PatternKind::Biweekly));
        assert_eq!(
            "fortnightly".parse::<PatternKind>(),
            Err(PatternError::UnknownKind("fortnightly".into()))
        );
    }

    #[test]
    fn degenerate_patterns_are_detected() {
        assert!(Pattern::weekly([]).is_degenerate());
        assert!(Pattern::weekly([7, 8]).is_degenerate());
        assert!(!Pattern::weekly([0]).is_degenerate());
        assert!(Pattern::biweekly([1], []).is_degenerate());
        assert!(Pattern::monthly([0, 32]).is_degenerate());
        assert!(Pattern::custom("whenever").is_degenerate());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(Pattern::weekly([3, 1])).unwrap();
        assert_eq!(json["kind"], "weekly");
        assert_eq!(json["days_of_week"], serde_json::json!([1, 3]));
    }
}
