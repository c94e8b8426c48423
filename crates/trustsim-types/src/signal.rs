// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Signals
// ─────────────────────────────────────────────────────────────────────
//! A signal is one weighted observation about an entity: a review, an
//! endorsement, a flag. Signals are immutable and identified by `id`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch. Always caller-supplied.
pub type Timestamp = i64;

pub const MS_PER_DAY: i64 = 86_400_000;

/// Where a signal came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Peer,
    Supervisor,
    Manager,
    Synthetic,
    #[serde(rename = "self")]
    SelfReport,
    External,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Peer,
        SourceKind::Supervisor,
        SourceKind::Manager,
        SourceKind::Synthetic,
        SourceKind::SelfReport,
        SourceKind::External,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Peer => "peer",
            SourceKind::Supervisor => "supervisor",
            SourceKind::Manager => "manager",
            SourceKind::Synthetic => "synthetic",
            SourceKind::SelfReport => "self",
            SourceKind::External => "external",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub source: SourceKind,
    pub weight: f64,
    pub timestamp: Timestamp,
}

impl Signal {
    pub fn new(
        id: impl Into<String>,
        source: SourceKind,
        weight: f64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            weight,
            timestamp,
        }
    }

    pub fn peer(id: impl Into<String>, weight: f64, timestamp: Timestamp) -> Self {
        Self::new(id, SourceKind::Peer, weight, timestamp)
    }

    pub fn supervisor(id: impl Into<String>, weight: f64, timestamp: Timestamp) -> Self {
        Self::new(id, SourceKind::Supervisor, weight, timestamp)
    }
}
