// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Universe Metrics and Diff
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use trustsim_types::score::clamp_score;
use trustsim_types::{KernelConfig, Snapshot, TimelineEvent, Universe};

/// Trust debt accrued by sharp rises along a timeline.
///
/// Sums `(curr − prev) × rate` over adjacent pairs whose rise exceeds
/// `jump`, clamped to 100.
pub fn compute_trust_debt_with(events: &[TimelineEvent], jump: f64, rate: f64) -> f64 {
    let debt: f64 = events
        .windows(2)
        .map(|w| f64::from(w[1].trust_score()) - f64::from(w[0].trust_score()))
        .filter(|rise| *rise > jump)
        .map(|rise| rise * rate)
        .sum();
    clamp_score(debt, 0.0, 100.0)
}

/// `compute_trust_debt_with` using a jump of 5 points and a rate of 0.1.
pub fn compute_trust_debt(events: &[TimelineEvent]) -> f64 {
    let config = KernelConfig::default();
    compute_trust_debt_with(events, config.debt_jump_threshold, config.debt_rate)
}

/// `min(100, |score − 50| × 0.5 + signalCount × 2)`.
pub fn compute_fragility(state: &Snapshot) -> f64 {
    let distance = (f64::from(state.trust_score) - 50.0).abs();
    (distance * 0.5 + state.signal_count() as f64 * 2.0).min(100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSummary {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
    pub trust_score: u8,
    pub signal_count: usize,
    pub timeline_len: usize,
    pub trust_debt: f64,
    pub fragility: f64,
}

pub fn summarize(universe: &Universe, config: &KernelConfig) -> UniverseSummary {
    UniverseSummary {
        id: universe.id.clone(),
        label: universe.label.clone(),
        parent_id: universe.parent_id.clone(),
        trust_score: universe.trust_score(),
        signal_count: universe.trust_state.signal_count(),
        timeline_len: universe.timeline.len(),
        trust_debt: compute_trust_debt_with(
            universe.timeline.as_slice(),
            config.debt_jump_threshold,
            config.debt_rate,
        ),
        fragility: compute_fragility(&universe.trust_state),
    }
}

/// Side-by-side comparison of two universes' current states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseDiff {
    pub left_id: String,
    pub right_id: String,
    /// `right − left`.
    pub trust_delta: i16,
    /// `right − left`.
    pub confidence_delta: i16,
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub left_timeline_len: usize,
    pub right_timeline_len: usize,
    /// Leading events the two timelines have in common.
    pub shared_prefix_len: usize,
    /// One is the other's parent.
    pub directly_related: bool,
}

fn signal_ids(universe: &Universe) -> BTreeSet<&str> {
    universe
        .trust_state
        .signals
        .iter()
        .map(|s| s.id.as_str())
        .collect()
}

pub fn diff_universes(left: &Universe, right: &Universe) -> UniverseDiff {
    let left_ids = signal_ids(left);
    let right_ids = signal_ids(right);

    let shared_prefix_len = left
        .timeline
        .iter()
        .zip(right.timeline.iter())
        .take_while(|(a, b)| a == b)
        .count();

    UniverseDiff {
        left_id: left.id.clone(),
        right_id: right.id.clone(),
        trust_delta: i16::from(right.trust_score()) - i16::from(left.trust_score()),
        confidence_delta: i16::from(right.trust_state.confidence_score)
            - i16::from(left.trust_state.confidence_score),
        only_in_left: left_ids
            .difference(&right_ids)
            .map(|s| s.to_string())
            .collect(),
        only_in_right: right_ids
            .difference(&left_ids)
            .map(|s| s.to_string())
            .collect(),
        left_timeline_len: left.timeline.len(),
        right_timeline_len: right.timeline.len(),
        shared_prefix_len,
        directly_related: left.parent_id.as_deref() == Some(right.id.as_str())
            || right.parent_id.as_deref() == Some(left.id.as_str()),
    }
}
