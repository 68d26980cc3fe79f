//! Archive domain model.
//!
//! This module contains the date-keyed transcript store that every other
//! component reads from or appends to: a calendar date maps to the ordered
//! list of exchanges recorded on that day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A calendar-date key in ISO `YYYY-MM-DD` form.
///
/// Keys are plain strings on disk and sort lexicographically, which for this
/// format is chronological order. No validation is applied on construction;
/// an unknown key simply resolves to an empty day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    /// Wraps an existing date string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key for the local wall-clock date right now.
    pub fn today() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    /// The key for a specific calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DateKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// One user-input/bot-reply exchange.
///
/// A turn is immutable once appended and is never edited in place. The
/// optional `voiceover` field holds the filesystem path of a synthesized
/// audio artifact; a stale path degrades to "no playback available" at
/// display time rather than erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// What the user typed (or what speech recognition produced)
    pub inputs: String,
    /// The AI backend's reply text
    pub bot_response: String,
    /// Path to the synthesized audio artifact, if one was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voiceover: Option<String>,
}

impl Turn {
    pub fn new(
        inputs: impl Into<String>,
        bot_response: impl Into<String>,
        voiceover: Option<String>,
    ) -> Self {
        Self {
            inputs: inputs.into(),
            bot_response: bot_response.into(),
            voiceover,
        }
    }
}

/// The full date-keyed transcript store.
///
/// Serializes as a single JSON object mapping date keys to turn arrays, the
/// exact on-disk shape the history file holds. Turn order within a day is
/// chronological and preserved; day order is re-derived at display time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatArchive {
    days: BTreeMap<DateKey, Vec<Turn>>,
}

impl ChatArchive {
    /// Creates an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no day has been recorded (empty bootstrap buckets count as nothing).
    pub fn is_empty(&self) -> bool {
        self.days.values().all(|turns| turns.is_empty())
    }

    /// The turns recorded for a day, oldest first. An absent key is an empty day.
    pub fn turns(&self, date: &DateKey) -> &[Turn] {
        self.days.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if the day exists in the archive, even with zero turns.
    pub fn contains(&self, date: &DateKey) -> bool {
        self.days.contains_key(date)
    }

    /// Makes sure a day bucket exists, creating an empty one if needed.
    ///
    /// Called at session start so `turns(current_date)` is well defined from
    /// the first interaction. An empty bucket is not a listed date (see
    /// [`ChatArchive::dates_desc`]) and is not persisted until a turn lands in it.
    pub fn ensure_day(&mut self, date: DateKey) {
        self.days.entry(date).or_default();
    }

    /// Appends a turn to a day, creating the day if absent.
    pub fn append(&mut self, date: DateKey, turn: Turn) {
        self.days.entry(date).or_default().push(turn);
    }

    /// Removes a whole day and its turns.
    ///
    /// Returns `true` if the day existed. Removing an absent day changes
    /// nothing and returns `false`.
    pub fn remove_day(&mut self, date: &DateKey) -> bool {
        self.days.remove(date).is_some()
    }

    /// All days with at least one recorded turn, most recent first.
    pub fn dates_desc(&self) -> Vec<DateKey> {
        self.days
            .iter()
            .filter(|(_, turns)| !turns.is_empty())
            .map(|(date, _)| date.clone())
            .rev()
            .collect()
    }
}
