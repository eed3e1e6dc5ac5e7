use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{habit::Habit, routine::Routine};

/// On-disk body of a tracker document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerContents {
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

/// A JSON tracker file together with where it came from.
#[derive(Debug, Clone)]
pub struct TrackerDocument {
    path: PathBuf,
    contents: TrackerContents,
    loaded_at: DateTime<Utc>,
}

impl TrackerDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading tracker document {}", path.display()))?;
        let contents: TrackerContents = serde_json::from_str(&raw)
            .with_context(|| format!("parsing tracker document {}", path.display()))?;
        Ok(Self {
            path,
            contents,
            loaded_at: Utc::now(),
        })
    }

    pub fn from_contents(path: impl AsRef<Path>, contents: TrackerContents) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            contents,
            loaded_at: Utc::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &TrackerContents {
        &self.contents
    }

    pub fn routines(&self) -> &[Routine] {
        &self.contents.routines
    }

    pub fn habits(&self) -> &[Habit] {
        &self.contents.habits
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Write `contents` to disk and adopt it as the in-memory state.
    pub fn replace_contents(&mut self, contents: TrackerContents) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
        }
        let serialized = serde_json::to_string_pretty(&contents)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("writing tracker document {}", self.path.display()))?;
        self.contents = contents;
        self.loaded_at = Utc::now();
        Ok(())
    }
}
