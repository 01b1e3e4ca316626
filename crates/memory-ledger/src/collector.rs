//! Tolerant JSON ingestion buffer.
//!
//! The collector appends parsed JSON values in arrival order and never
//! compacts. Text input that fails to parse is either kept as a degraded
//! `{partial_state, error}` entry or rejected, depending on `strict_mode`.
//! Access is LIFO at the tail ([`Collector::peek`], [`Collector::pop`]),
//! windowed ([`Collector::fetch`], [`Collector::rewind`]) or a full traversal
//! in the configured direction ([`Collector::iterate`]).

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

/// Buffer flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// Reject instead of degrade on parse failure.
    #[serde(default)]
    pub strict_mode: bool,

    /// Strip `//` line comments from text before parsing.
    #[serde(default = "default_true")]
    pub comment_strip: bool,

    /// Iterate and slice from the tail.
    #[serde(default = "default_true")]
    pub reverse_order: bool,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            strict_mode: false,
            comment_strip: true,
            reverse_order: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One buffer element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BufferEntry {
    /// Text that could not be parsed, kept with the parser's message.
    Degraded { partial_state: String, error: String },
    /// A well-formed JSON value.
    Structured(Value),
}

impl BufferEntry {
    pub fn is_degraded(&self) -> bool {
        matches!(self, BufferEntry::Degraded { .. })
    }

    pub fn to_value(&self) -> Value {
        match self {
            BufferEntry::Structured(value) => value.clone(),
            BufferEntry::Degraded {
                partial_state,
                error,
            } => serde_json::json!({
                "partial_state": partial_state,
                "error": error,
            }),
        }
    }
}

/// Input accepted by [`Collector::collect`].
#[derive(Debug, Clone)]
pub enum Ingest {
    Text(String),
    Value(Value),
}

impl From<&str> for Ingest {
    fn from(text: &str) -> Self {
        Ingest::Text(text.to_string())
    }
}

impl From<String> for Ingest {
    fn from(text: String) -> Self {
        Ingest::Text(text)
    }
}

impl From<Value> for Ingest {
    fn from(value: Value) -> Self {
        Ingest::Value(value)
    }
}

/// Ordered, append-only JSON buffer.
#[derive(Debug, Default)]
pub struct Collector {
    entries: RwLock<Vec<BufferEntry>>,
    settings: CollectorSettings,
}

impl Collector {
    pub fn new(settings: CollectorSettings) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            settings,
        }
    }

    pub fn settings(&self) -> CollectorSettings {
        self.settings
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of the whole buffer in insertion order.
    pub fn entries(&self) -> Vec<BufferEntry> {
        self.entries.read().clone()
    }

    /// Ingest one item.
    ///
    /// Returns `false` only when `strict_mode` rejects unparseable text.
    pub fn collect(&self, item: impl Into<Ingest>) -> bool {
        let entry = match item.into() {
            Ingest::Value(value) => BufferEntry::Structured(value),
            Ingest::Text(text) => {
                let cleaned = if self.settings.comment_strip {
                    strip_line_comments(&text)
                } else {
                    text.clone()
                };

                match serde_json::from_str::<Value>(&cleaned) {
                    Ok(value) => BufferEntry::Structured(value),
                    Err(e) if self.settings.strict_mode => {
                        error!(error = %e, "Collector rejected malformed JSON in strict mode");
                        return false;
                    }
                    Err(e) => {
                        warn!(error = %e, "Collector kept partial state after JSON error");
                        BufferEntry::Degraded {
                            partial_state: text,
                            error: e.to_string(),
                        }
                    }
                }
            }
        };

        let mut entries = self.entries.write();
        entries.push(entry);
        info!(size = entries.len(), "Collector collected item");
        true
    }

    /// Tail entry without removing it.
    pub fn peek(&self) -> Option<BufferEntry> {
        self.entries.read().last().cloned()
    }

    /// Remove and return the tail entry.
    pub fn pop(&self) -> Option<BufferEntry> {
        self.entries.write().pop()
    }

    /// Up to `depth` entries: the most recent ones when `reverse_order` is
    /// set, otherwise the oldest. Relative order is always insertion order.
    pub fn fetch(&self, depth: usize) -> Vec<BufferEntry> {
        let entries = self.entries.read();
        if depth == 0 || entries.is_empty() {
            return Vec::new();
        }
        let take = depth.min(entries.len());
        if self.settings.reverse_order {
            entries[entries.len() - take..].to_vec()
        } else {
            entries[..take].to_vec()
        }
    }

    /// Whole buffer (`None`), nothing (`Some(0)`) or the last `n` entries,
    /// in insertion order.
    pub fn rewind(&self, depth: Option<usize>) -> Vec<BufferEntry> {
        self.rewind_map(depth, BufferEntry::clone)
    }

    /// [`Collector::rewind`] with `map` applied to every returned entry.
    pub fn rewind_map<T, F>(&self, depth: Option<usize>, map: F) -> Vec<T>
    where
        F: FnMut(&BufferEntry) -> T,
    {
        let entries = self.entries.read();
        let start = match depth {
            None => 0,
            Some(n) => entries.len().saturating_sub(n),
        };
        entries[start..].iter().map(map).collect()
    }

    /// Full traversal in the configured direction.
    ///
    /// The index walk (`hybrid`) and the direct reversal path yield the same
    /// sequence for the same contents.
    pub fn iterate(&self, hybrid: bool) -> Vec<BufferEntry> {
        let entries = self.entries.read();
        let reverse = self.settings.reverse_order;

        if !hybrid {
            return if reverse {
                entries.iter().rev().cloned().collect()
            } else {
                entries.clone()
            };
        }

        let mut result = Vec::with_capacity(entries.len());
        let mut cursor = if reverse {
            entries.len().checked_sub(1)
        } else if entries.is_empty() {
            None
        } else {
            Some(0)
        };

        while let Some(idx) = cursor {
            result.push(entries[idx].clone());
            cursor = if reverse {
                idx.checked_sub(1)
            } else {
                Some(idx + 1).filter(|next| *next < entries.len())
            };
        }

        result
    }
}

/// Drop `//` comments line by line, leaving `//` inside string literals alone.
fn strip_line_comments(text: &str) -> String {
    text.split('\n')
        .map(|line| &line[..comment_start(line).unwrap_or(line.len())])
        .collect::<Vec<_>>()
        .join("\n")
}

fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            return Some(i);
        }
    }
    None
}
