//! Memory record model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder marker carried by every record. Not a hash.
pub const DEFAULT_MARKER: &str = "∞";

/// Unique identifier for a memory record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub uuid::Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed tag vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Ancestral,
    Emotional,
    Symbolic,
}

impl Tag {
    /// The full vocabulary, applied to bootstrap and promise-chain records.
    pub const VOCABULARY: [Tag; 3] = [Tag::Ancestral, Tag::Emotional, Tag::Symbolic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Ancestral => "ancestral",
            Tag::Emotional => "emotional",
            Tag::Symbolic => "symbolic",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed event or state snapshot in the ledger.
///
/// Records are only mutable while the creating operation still owns them.
/// Once appended to the [`Ledger`](crate::Ledger) they are handed out as
/// clones only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub stage: String,
    pub state: String,
    pub identity: String,
    pub memory: Vec<String>,
    pub tags: BTreeSet<Tag>,
    pub marker: String,
    pub cycle_index: u64,
}

impl MemoryRecord {
    /// Start building a record for `stage`.
    pub fn builder(stage: impl Into<String>) -> MemoryRecordBuilder {
        MemoryRecordBuilder {
            stage: stage.into(),
            state: String::new(),
            identity: String::new(),
            memory: Vec::new(),
            tags: BTreeSet::new(),
            cycle_index: 0,
        }
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// The single amendment allowed before the record is appended:
    /// move to `state` and extend the narrative log with `note`.
    pub fn amend(mut self, state: impl Into<String>, note: impl Into<String>) -> Self {
        self.state = state.into();
        self.memory.push(note.into());
        self
    }
}

/// Builder for [`MemoryRecord`].
#[derive(Debug)]
pub struct MemoryRecordBuilder {
    stage: String,
    state: String,
    identity: String,
    memory: Vec<String>,
    tags: BTreeSet<Tag>,
    cycle_index: u64,
}

impl MemoryRecordBuilder {
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn memory<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.memory.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn cycle_index(mut self, cycle: u64) -> Self {
        self.cycle_index = cycle;
        self
    }

    pub fn build(self) -> MemoryRecord {
        MemoryRecord {
            id: RecordId::new(),
            created_at: Utc::now(),
            stage: self.stage,
            state: self.state,
            identity: self.identity,
            memory: self.memory,
            tags: self.tags,
            marker: DEFAULT_MARKER.to_string(),
            cycle_index: self.cycle_index,
        }
    }
}
