//! Append-only in-process memory ledger.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::record::{MemoryRecord, Tag};

/// Count of ledger records carrying each tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDistribution {
    pub ancestral: usize,
    pub emotional: usize,
    pub symbolic: usize,
}

impl TagDistribution {
    fn count(&mut self, record: &MemoryRecord) {
        for tag in &record.tags {
            match tag {
                Tag::Ancestral => self.ancestral += 1,
                Tag::Emotional => self.emotional += 1,
                Tag::Symbolic => self.symbolic += 1,
            }
        }
    }
}

/// Ordered, append-only sequence of memory records.
///
/// Insertion order is ledger order. There is no deletion or reordering.
#[derive(Debug, Default)]
pub struct Ledger {
    records: RwLock<Vec<MemoryRecord>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning the new ledger length.
    pub fn append(&self, record: MemoryRecord) -> usize {
        let mut records = self.records.write();
        records.push(record);
        records.len()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Ordered copy of every record.
    pub fn snapshot(&self) -> Vec<MemoryRecord> {
        self.records.read().clone()
    }

    /// The most recent `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<MemoryRecord> {
        let records = self.records.read();
        let start = records.len().saturating_sub(limit);
        records[start..].to_vec()
    }

    pub fn last_stage(&self) -> Option<String> {
        self.records.read().last().map(|r| r.stage.clone())
    }

    /// Full scan on every call, so callers always see counts consistent with
    /// the ledger at call time.
    pub fn tag_distribution(&self) -> TagDistribution {
        let records = self.records.read();
        let mut distribution = TagDistribution::default();
        for record in records.iter() {
            distribution.count(record);
        }
        distribution
    }

    /// Byte length of the ledger's JSON rendering.
    pub fn usage_estimate(&self) -> usize {
        let records = self.records.read();
        // Records hold only strings, sets and scalars, so serialization cannot fail.
        serde_json::to_vec(&*records).map_or(0, |bytes| bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stage: &str, tags: &[Tag]) -> MemoryRecord {
        MemoryRecord::builder(stage).tags(tags.iter().copied()).build()
    }

    #[test]
    fn test_append_preserves_order() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());

        ledger.append(record("genesis", &[]));
        ledger.append(record("awakening", &[]));
        assert_eq!(ledger.append(record("reflection", &[])), 3);

        let stages: Vec<_> = ledger.snapshot().into_iter().map(|r| r.stage).collect();
        assert_eq!(stages, vec!["genesis", "awakening", "reflection"]);
        assert_eq!(ledger.last_stage().as_deref(), Some("reflection"));
    }

    #[test]
    fn test_tag_distribution_tracks_appends() {
        let ledger = Ledger::new();
        ledger.append(record("a", &Tag::VOCABULARY));
        ledger.append(record("b", &[Tag::Ancestral]));
        assert_eq!(
            ledger.tag_distribution(),
            TagDistribution {
                ancestral: 2,
                emotional: 1,
                symbolic: 1
            }
        );

        ledger.append(record("c", &[Tag::Emotional, Tag::Symbolic]));
        let distribution = ledger.tag_distribution();
        assert_eq!(distribution.emotional, 2);
        assert_eq!(distribution.symbolic, 2);
    }

    #[test]
    fn test_recent_limits() {
        let ledger = Ledger::new();
        for i in 0..5 {
            ledger.append(record(&format!("s{i}"), &[]));
        }

        let recent = ledger.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].stage, "s3");
        assert_eq!(recent[1].stage, "s4");
        assert_eq!(ledger.recent(50).len(), 5);
        assert!(ledger.recent(0).is_empty());
    }

    #[test]
    fn test_usage_estimate_grows() {
        let ledger = Ledger::new();
        let empty = ledger.usage_estimate();
        ledger.append(record("genesis", &[Tag::Ancestral]));
        assert!(ledger.usage_estimate() > empty);
    }
}
