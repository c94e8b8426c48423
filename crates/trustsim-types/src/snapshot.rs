// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Snapshot and Delta
// ─────────────────────────────────────────────────────────────────────
//! `Snapshot` is a complete, self-contained state; `Delta` is the only
//! input the reducer accepts. Neither is ever mutated after creation by
//! kernel code: every transition yields a fresh `Snapshot`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::EngineOutputs;
use crate::signal::{Signal, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: Timestamp,
    /// Ordered by insertion; order is stable across replay.
    pub signals: Vec<Signal>,
    pub trust_score: u8,
    pub confidence_score: u8,
    /// Always equal to `signals.len()`.
    pub network_strength: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// `None` only on the zero seed snapshot.
    pub engine_outputs: Option<EngineOutputs>,
}

impl Snapshot {
    /// The initial seed: no signals, zero scores, no engine outputs.
    pub fn zero(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            signals: Vec::new(),
            trust_score: 0,
            confidence_score: 0,
            network_strength: 0,
            metadata: BTreeMap::new(),
            engine_outputs: None,
        }
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn contains_signal(&self, id: &str) -> bool {
        self.signals.iter().any(|s| s.id == id)
    }

    pub fn risk_score(&self) -> u8 {
        self.engine_outputs.as_ref().map_or(0, |o| o.risk_score)
    }

    pub fn fragility_score(&self) -> u8 {
        self.engine_outputs
            .as_ref()
            .map_or(0, |o| o.fragility_score)
    }

    /// Compliance of a bare seed counts as fully compliant.
    pub fn compliance_score(&self) -> u8 {
        self.engine_outputs
            .as_ref()
            .map_or(100, |o| o.compliance_score)
    }
}

/// Caller-declared adjustments to how signals are read for one transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentModifiers {
    /// Fraction of signals assumed mis-recorded, on [0, 1]. Default 0.
    pub human_error_rate: f64,
    /// Global multiplier on every signal weight. Default 1.
    pub intent_bias: f64,
    /// Multiplies Fragility and TrustDebt. Default 1.
    pub decay_multiplier: f64,
    /// Replaces the policy's supervisor weight for this transition.
    pub supervisor_weight_override: Option<f64>,
}

impl Default for IntentModifiers {
    fn default() -> Self {
        Self {
            human_error_rate: 0.0,
            intent_bias: 1.0,
            decay_multiplier: 1.0,
            supervisor_weight_override: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub add_signals: Vec<Signal>,
    #[serde(default)]
    pub remove_signal_ids: Vec<String>,
    /// Bypasses the TrustScore engine for this transition only.
    pub trust_score_override: Option<f64>,
    /// Replaces the policy threshold for Risk and Compliance.
    pub threshold_override: Option<f64>,
    #[serde(default)]
    pub intent: IntentModifiers,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub notes: Option<String>,
}

impl Delta {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add(signal: Signal) -> Self {
        Self {
            add_signals: vec![signal],
            ..Self::default()
        }
    }

    pub fn add_all(signals: impl IntoIterator<Item = Signal>) -> Self {
        Self {
            add_signals: signals.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn remove(id: impl Into<String>) -> Self {
        Self {
            remove_signal_ids: vec![id.into()],
            ..Self::default()
        }
    }

    pub fn with_trust_override(mut self, score: f64) -> Self {
        self.trust_score_override = Some(score);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold_override = Some(threshold);
        self
    }

    pub fn with_intent(mut self, intent: IntentModifiers) -> Self {
        self.intent = intent;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes = Some(note.into());
        self
    }

    pub fn is_noop(&self) -> bool {
        self.add_signals.is_empty()
            && self.remove_signal_ids.is_empty()
            && self.trust_score_override.is_none()
            && self.threshold_override.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_snapshot() {
        let snap = Snapshot::zero(5);
        assert_eq!(snap.network_strength, 0);
        assert!(snap.engine_outputs.is_none());
        assert_eq!(snap.compliance_score(), 100);
    }

    #[test]
    fn test_delta_builders() {
        let delta = Delta::add(Signal::peer("a", 0.4, 1))
            .with_trust_override(50.0)
            .with_note("calibration");
        assert_eq!(delta.add_signals.len(), 1);
        assert_eq!(delta.trust_score_override, Some(50.0));
        assert!(!delta.is_noop());
        assert!(Delta::empty().is_noop());
    }

    #[test]
    fn test_delta_deserializes_with_defaults() {
        let json = r#"{"trust_score_override":null,"threshold_override":null,"notes":null}"#;
        let delta: Delta = serde_json::from_str(json).unwrap();
        assert_eq!(delta.intent, IntentModifiers::default());
        assert!(delta.add_signals.is_empty());
    }
}
