// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Universe, Timeline, Audit
// ─────────────────────────────────────────────────────────────────────
//! A `Universe` is one branch of simulated history. Its `Timeline` is
//! append-only; forks share the parent's prefix storage and copy it
//! only when the fork first appends.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Policy;
use crate::signal::Timestamp;
use crate::snapshot::Snapshot;

/// What produced a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionLabel {
    Init,
    Reset,
    Fork,
    Signal,
    TrustCollapse,
    FakeConsensus,
    SupervisorOverride,
    DebtCollection,
}

impl ActionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionLabel::Init => "init",
            ActionLabel::Reset => "reset",
            ActionLabel::Fork => "fork",
            ActionLabel::Signal => "signal",
            ActionLabel::TrustCollapse => "trust_collapse",
            ActionLabel::FakeConsensus => "fake_consensus",
            ActionLabel::SupervisorOverride => "supervisor_override",
            ActionLabel::DebtCollection => "debt_collection",
        }
    }

    /// Scripted actions that push a universe back toward health.
    pub fn is_corrective(self) -> bool {
        matches!(
            self,
            ActionLabel::SupervisorOverride | ActionLabel::DebtCollection | ActionLabel::Reset
        )
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub at: Timestamp,
    pub state: Snapshot,
    pub action: ActionLabel,
    pub audit_id: Option<String>,
}

impl TimelineEvent {
    pub fn trust_score(&self) -> u8 {
        self.state.trust_score
    }
}

/// Cross-cutting audit record, independent of any single timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub at: Timestamp,
    pub universe_id: String,
    pub action: ActionLabel,
    pub payload: serde_json::Value,
    pub outcome: String,
}

/// Append-only event sequence with copy-on-append prefix sharing.
///
/// `events[..len]` is the visible history. A fork holds the same `Arc`
/// with a shorter `len`, so forking is O(1) and the first append on the
/// fork copies exactly the prefix it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<TimelineEvent>", into = "Vec<TimelineEvent>")]
pub struct Timeline {
    events: Arc<Vec<TimelineEvent>>,
    len: usize,
}

impl Timeline {
    pub fn new(first: TimelineEvent) -> Self {
        Self {
            events: Arc::new(vec![first]),
            len: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Only possible for timelines built from an empty list.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[TimelineEvent] {
        &self.events[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimelineEvent> {
        self.as_slice().iter()
    }

    pub fn get(&self, index: usize) -> Option<&TimelineEvent> {
        self.as_slice().get(index)
    }

    pub fn first(&self) -> Option<&TimelineEvent> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&TimelineEvent> {
        self.as_slice().last()
    }

    /// A new timeline with `event` appended; `self` is untouched.
    pub fn appended(&self, event: TimelineEvent) -> Self {
        let mut next = self.clone();
        next.push(event);
        next
    }

    /// Shares storage for `events[..=index]`. `index` is clamped to the
    /// last visible event; an empty timeline stays empty.
    pub fn prefix_through(&self, index: usize) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self {
            events: Arc::clone(&self.events),
            len: index.min(self.len - 1) + 1,
        }
    }

    pub fn shares_storage_with(&self, other: &Timeline) -> bool {
        Arc::ptr_eq(&self.events, &other.events)
    }

    fn push(&mut self, event: TimelineEvent) {
        if self.len == self.events.len() {
            Arc::make_mut(&mut self.events).push(event);
        } else {
            let mut owned = Vec::with_capacity(self.len + 1);
            owned.extend_from_slice(self.as_slice());
            owned.push(event);
            self.events = Arc::new(owned);
        }
        self.len += 1;
    }
}

impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl From<Vec<TimelineEvent>> for Timeline {
    fn from(events: Vec<TimelineEvent>) -> Self {
        let len = events.len();
        Self {
            events: Arc::new(events),
            len,
        }
    }
}

impl From<Timeline> for Vec<TimelineEvent> {
    fn from(timeline: Timeline) -> Self {
        timeline.as_slice().to_vec()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a TimelineEvent;
    type IntoIter = std::slice::Iter<'a, TimelineEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Scoring "physics" a universe runs under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsProfile {
    pub name: String,
    pub policy: Policy,
    pub human_factors_enabled: bool,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            name: "standard".to_string(),
            policy: Policy::default(),
            human_factors_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub id: String,
    pub label: String,
    pub physics: PhysicsProfile,
    pub timeline: Timeline,
    /// Current state. Usually the last event's state; differs after
    /// time travel.
    pub trust_state: Snapshot,
    pub created_at: Timestamp,
    /// `None` for root universes.
    pub parent_id: Option<String>,
    pub forked_at: Option<Timestamp>,
}

impl Universe {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn trust_score(&self) -> u8 {
        self.trust_state.trust_score
    }

    pub fn trust_scores(&self) -> Vec<u8> {
        self.timeline.iter().map(TimelineEvent::trust_score).collect()
    }

    /// Timestamp of the latest event, or creation time.
    pub fn latest_at(&self) -> Timestamp {
        self.timeline.last().map_or(self.created_at, |e| e.at)
    }
}
