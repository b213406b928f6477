use crate::timeline::TimelineId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolution outcome for a single timeline node.
///
/// Every business-level failure mode is a case here; the resolver never
/// throws for any graph shape. `Loading` is the consumer-side initial state
/// (it is the `Default`) and is never produced by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkRange {
    /// Resolved range; `begin <= end` always holds.
    Success { begin: NaiveDate, end: NaiveDate },
    /// Consumer-side placeholder before the first resolution lands.
    #[default]
    Loading,
    /// Task with neither predecessors nor a pinned start.
    NoInput,
    /// Task listing its own id among its predecessors.
    SelfReference,
    /// Group without children.
    NoChildren,
    /// Some predecessor resolved to `NoInput`.
    RelationNoInput,
    /// Some predecessor or child resolved to an error.
    RelationError,
    /// Still unresolved when the iteration budget ran out.
    Unresolved,
}

impl WorkRange {
    pub fn success(begin: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(begin <= end);
        WorkRange::Success { begin, end }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WorkRange::Success { .. })
    }

    /// Error kinds: everything except `Success` and `Loading`.
    pub fn is_error(&self) -> bool {
        !matches!(self, WorkRange::Success { .. } | WorkRange::Loading)
    }

    pub fn as_success(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            WorkRange::Success { begin, end } => Some((*begin, *end)),
            _ => None,
        }
    }
}

/// Output of a resolution run: node id to work range.
///
/// Nodes that were still unresolved when the iteration budget ran out are
/// absent; the document layer reports those as [`WorkRange::Unresolved`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkRangeMap {
    entries: HashMap<TimelineId, WorkRange>,
}

impl WorkRangeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: TimelineId, range: WorkRange) {
        debug_assert!(!self.entries.contains_key(&id));
        self.entries.insert(id, range);
    }

    pub fn get(&self, id: &TimelineId) -> Option<&WorkRange> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &TimelineId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimelineId, &WorkRange)> {
        self.entries.iter()
    }

    pub fn success_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_success()).count()
    }

    pub fn error_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_error()).count()
    }

    /// Overall `[min begin, max end]` across the `Success` entries.
    pub fn resolved_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        for range in self.entries.values() {
            if let Some((begin, end)) = range.as_success() {
                span = Some(match span {
                    Some((lo, hi)) => (lo.min(begin), hi.max(end)),
                    None => (begin, end),
                });
            }
        }
        span
    }
}
