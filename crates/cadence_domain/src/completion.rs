use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Set of dates on which a habit or routine was marked done.
///
/// Serialised as a plain array of `YYYY-MM-DD` strings; duplicates in the
/// input collapse on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CompletionLog {
    dates: BTreeSet<NaiveDate>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Returns a copy of the log with `date` flipped between done and not done.
    pub fn toggled(&self, date: NaiveDate) -> Self {
        let mut next = self.clone();
        if !next.dates.remove(&date) {
            next.dates.insert(date);
        }
        next
    }

    /// Returns `false` when the date was already present.
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.dates.insert(date)
    }

    pub fn remove(&mut self, date: NaiveDate) -> bool {
        self.dates.remove(&date)
    }

    pub fn clear(&mut self) {
        self.dates.clear();
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Ascending.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    pub fn latest(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

impl FromIterator<NaiveDate> for CompletionLog {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

impl Extend<NaiveDate> for CompletionLog {
    fn extend<T: IntoIterator<Item = NaiveDate>>(&mut self, iter: T) {
        self.dates.extend(iter);
    }
}
