use crate::sketch::model::{Drawing, ModelKind, Prediction, PredictionResult};
use crate::sketch::snapshot::Snapshot;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryId(pub i64);

/// One completed classification attempt, with everything needed to put it
/// back on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    id: HistoryId,
    snapshot: Snapshot,
    prediction: Prediction,
    model: ModelKind,
    strokes: Drawing,
}

impl HistoryEntry {
    pub fn new(
        id: HistoryId,
        snapshot: Snapshot,
        prediction: Prediction,
        model: ModelKind,
        strokes: Drawing,
    ) -> Self {
        Self {
            id,
            snapshot,
            prediction,
            model,
            strokes,
        }
    }

    pub fn id(&self) -> HistoryId {
        self.id
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn prediction(&self) -> &Prediction {
        &self.prediction
    }

    pub fn result(&self) -> PredictionResult {
        PredictionResult::Success(self.prediction.clone())
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn strokes(&self) -> &Drawing {
        &self.strokes
    }
}

/// Most-recent-first store of past attempts, bounded at
/// [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    last_id: Option<HistoryId>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives an id from the creation time, bumped past the previous id
    /// when two entries land in the same millisecond.
    pub fn issue_id(&mut self, now_ms: i64) -> HistoryId {
        let id = match self.last_id {
            Some(HistoryId(last)) if now_ms <= last => HistoryId(last + 1),
            _ => HistoryId(now_ms),
        };
        self.last_id = Some(id);
        id
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        tracing::debug!(id = entry.id.0, "history entry recorded");
        self.entries.push_front(entry);
        while self.entries.len() > HISTORY_CAPACITY {
            if let Some(evicted) = self.entries.pop_back() {
                tracing::debug!(id = evicted.id.0, "history entry evicted");
            }
        }
    }

    pub fn restore(&self, id: HistoryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
