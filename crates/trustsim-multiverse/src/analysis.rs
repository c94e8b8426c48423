// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Counterfactual, Autopsy, Break-Multiverse
// ─────────────────────────────────────────────────────────────────────
//! Explanations over finished universes.
//!
//! `counterfactual` and `autopsy` are read-only. `break_the_multiverse`
//! goes through the engine and returns fresh forks; the source universe
//! is never touched.

use serde::{Deserialize, Serialize};

use trustsim_types::{KernelConfig, SourceKind, Timestamp, Universe};

use crate::engine::MultiverseEngine;

/// Interventions suggested by every counterfactual report.
pub const ALTERNATIVE_INTERVENTIONS: [&str; 5] = [
    "Collect additional peer reviews from distinct colleagues",
    "Request a supervisor endorsement",
    "Diversify signal sources beyond a single kind",
    "Lower the policy threshold for this role",
    "Wait for stale signals to decay before re-evaluating",
];

const BREAK_OVERRIDE_WEIGHT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualReport {
    pub universe_id: String,
    pub current_score: u8,
    pub threshold: f64,
    pub above_threshold: bool,
    pub signal_count: usize,
    pub supervisor_weight_sum: f64,
    pub supervisor_factor: f64,
    /// `threshold − current_score`; negative when above threshold.
    pub score_gap: f64,
    /// Extra raw supervisor weight that would close the gap.
    pub required_supervisor_weight: f64,
    /// Extra unit-weight peer signals that would close the gap.
    pub required_peer_signals: usize,
    pub explanation: String,
    pub alternative_interventions: Vec<String>,
}

/// What had to be true for `universe` to land where it did.
pub fn counterfactual(universe: &Universe, config: &KernelConfig) -> CounterfactualReport {
    let state = &universe.trust_state;
    let policy = &universe.physics.policy;
    let current_score = state.trust_score;
    let threshold = if policy.threshold.is_finite() {
        policy.threshold
    } else {
        config.default_policy.threshold
    };
    let weight = policy.supervisor_weight;
    let supervisor_factor = if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        config.default_policy.supervisor_weight
    };
    let supervisor_weight_sum: f64 = state
        .signals
        .iter()
        .filter(|s| s.source == SourceKind::Supervisor && s.weight.is_finite())
        .map(|s| s.weight)
        .sum();

    let score_gap = threshold - f64::from(current_score);
    let above_threshold = score_gap <= 0.0;
    // One unit of weight is worth ten score points.
    let missing_weight = score_gap.max(0.0) / 10.0;
    let required_supervisor_weight = missing_weight / supervisor_factor;
    let required_peer_signals = missing_weight.ceil() as usize;

    let explanation = if above_threshold {
        format!(
            "Score {current_score} clears the threshold of {threshold:.0} on {} signal(s), \
             {supervisor_weight_sum:.2} of which is supervisor weight \
             (x{supervisor_factor:.2}). Losing {:.0} point(s) would drop it below.",
            state.signal_count(),
            -score_gap
        )
    } else {
        format!(
            "Score {current_score} sits {score_gap:.0} point(s) below the threshold of \
             {threshold:.0}. It would have cleared with {required_supervisor_weight:.2} more \
             supervisor weight or {required_peer_signals} more unit-weight peer signal(s)."
        )
    };

    CounterfactualReport {
        universe_id: universe.id.clone(),
        current_score,
        threshold,
        above_threshold,
        signal_count: state.signal_count(),
        supervisor_weight_sum,
        supervisor_factor,
        score_gap,
        required_supervisor_weight,
        required_peer_signals,
        explanation,
        alternative_interventions: ALTERNATIVE_INTERVENTIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopsyReport {
    pub universe_id: String,
    /// Index of the first event whose score fell below the collapse line
    /// from at or above it.
    pub collapse_point: Option<usize>,
    /// Index of the first event that dropped more than the mistake
    /// threshold in one step.
    pub first_mistake: Option<usize>,
    /// Index of the last corrective action.
    pub last_intervention_point: Option<usize>,
    pub narrative: String,
}

pub fn autopsy(universe: &Universe, config: &KernelConfig) -> AutopsyReport {
    let events = universe.timeline.as_slice();
    let line = config.collapse_line;
    let drop = config.mistake_drop;

    let collapse_point = events
        .windows(2)
        .position(|w| {
            let (prev, curr) = (f64::from(w[0].trust_score()), f64::from(w[1].trust_score()));
            prev >= line && curr < line
        })
        .map(|i| i + 1);
    let first_mistake = events
        .windows(2)
        .position(|w| f64::from(w[0].trust_score()) - f64::from(w[1].trust_score()) > drop)
        .map(|i| i + 1);
    let last_intervention_point = events.iter().rposition(|e| e.action.is_corrective());

    let mut parts = Vec::new();
    match collapse_point {
        Some(i) => parts.push(format!(
            "Trust collapsed at event {i} ({}), falling from {} to {}.",
            events[i].action,
            events[i - 1].trust_score(),
            events[i].trust_score()
        )),
        None => parts.push(format!("Trust never crossed below {line:.0}.")),
    }
    match first_mistake {
        Some(i) => parts.push(format!(
            "The first large drop came at event {i} ({}).",
            events[i].action
        )),
        None => parts.push(format!("No single step lost more than {drop:.0} points.")),
    }
    match last_intervention_point {
        Some(i) => parts.push(format!(
            "The last intervention was a {} at event {i}.",
            events[i].action
        )),
        None => parts.push("Nobody intervened.".to_string()),
    }

    AutopsyReport {
        universe_id: universe.id.clone(),
        collapse_point,
        first_mistake,
        last_intervention_point,
        narrative: parts.join(" "),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakReport {
    pub source_id: String,
    /// Override, collapse, rewound and re-collapsed forks, in that order.
    pub forks: Vec<Universe>,
    /// `max − min` of the forks' trust scores.
    pub divergence_score: f64,
    pub narrative: String,
}

/// Fork `universe` four ways and report how far the outcomes spread.
pub fn break_the_multiverse(
    engine: &MultiverseEngine,
    universe: &Universe,
    at: Timestamp,
) -> BreakReport {
    let latest = universe.latest_at();
    let audit = |step: usize| engine.next_audit_id(&format!("break:{}:{step}", universe.id));

    let base = engine.fork_universe_at(universe, latest, at);
    let boosted = engine.supervisor_override(
        &base,
        BREAK_OVERRIDE_WEIGHT,
        at,
        Some(audit(0).as_str()),
    );

    let base = engine.fork_universe_at(universe, latest, at);
    let collapsed = engine.trust_collapse(&base, at, Some(audit(1).as_str()));

    let base = engine.fork_universe_at(universe, latest, at);
    let rewound = engine.time_travel_to(&base, 0);

    // Earlier than any event, so the fork starts from the first one.
    let base = engine.fork_universe_at(&rewound, Timestamp::MIN, at);
    let recollapsed = engine.trust_collapse(&base, at, Some(audit(3).as_str()));

    let forks = vec![boosted, collapsed, rewound, recollapsed];
    let scores: Vec<u8> = forks.iter().map(Universe::trust_score).collect();
    let max = scores.iter().copied().max().unwrap_or(0);
    let min = scores.iter().copied().min().unwrap_or(0);
    let divergence_score = f64::from(max - min);

    let narrative = format!(
        "From a starting score of {}: a strong supervisor override lifted one branch to {}, \
         a collapse zeroed another ({}), rewinding to the beginning gave {}, and collapsing \
         that rewound branch left {}. Divergence {divergence_score:.0}.",
        universe.trust_score(),
        scores[0],
        scores[1],
        scores[2],
        scores[3]
    );
    log::info!(
        "multiverse: broke {} into {} forks, divergence {divergence_score:.0}",
        universe.id,
        forks.len()
    );

    BreakReport {
        source_id: universe.id.clone(),
        forks,
        divergence_score,
        narrative,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::engine::CreateOptions;
    use trustsim_types::{ActionLabel, Signal, Timeline, MS_PER_DAY};

    fn seeded(engine: &MultiverseEngine) -> Universe {
        let u = engine.create_universe("root", None, 0, CreateOptions::default());
        let u = engine.apply_signal(&u, Signal::peer("p1", 2.0, 0), MS_PER_DAY, None);
        engine.apply_signal(&u, Signal::supervisor("s1", 2.0, 0), 2 * MS_PER_DAY, None)
    }

    #[test]
    fn test_counterfactual_below_threshold() {
        let engine = MultiverseEngine::default();
        let u = seeded(&engine);
        // 2 + 2 * 1.5 = 5 → 50, threshold 70
        let report = counterfactual(&u, engine.config());
        assert_eq!(report.current_score, 50);
        assert!(!report.above_threshold);
        assert_eq!(report.score_gap, 20.0);
        assert_eq!(report.supervisor_weight_sum, 2.0);
        assert!((report.required_supervisor_weight - 2.0 / 1.5).abs() < 1e-9);
        assert_eq!(report.required_peer_signals, 2);
        assert_eq!(
            report.alternative_interventions.len(),
            ALTERNATIVE_INTERVENTIONS.len()
        );
    }

    #[test]
    fn test_counterfactual_above_threshold() {
        let engine = MultiverseEngine::default();
        let u = engine.supervisor_override(&seeded(&engine), 4.0, 3 * MS_PER_DAY, None);
        let report = counterfactual(&u, engine.config());
        assert!(report.above_threshold);
        assert_eq!(report.required_peer_signals, 0);
        assert_eq!(report.required_supervisor_weight, 0.0);
    }

    #[test]
    fn test_autopsy_finds_collapse_and_intervention() {
        let engine = MultiverseEngine::default();
        let u = seeded(&engine);
        let u = engine.trust_collapse(&u, 3 * MS_PER_DAY, None);
        let u = engine.supervisor_override(&u, 1.0, 4 * MS_PER_DAY, None);
        let report = autopsy(&u, engine.config());
        // events: init 0, 20, 50, collapse 0, override 15
        assert_eq!(report.collapse_point, Some(3));
        assert_eq!(report.first_mistake, Some(3));
        assert_eq!(report.last_intervention_point, Some(4));
        assert!(report.narrative.contains("collapsed at event 3"));
    }

    #[test]
    fn test_autopsy_quiet_timeline() {
        let engine = MultiverseEngine::default();
        let u = seeded(&engine);
        let report = autopsy(&u, engine.config());
        assert_eq!(report.collapse_point, None);
        assert_eq!(report.first_mistake, None);
        assert_eq!(report.last_intervention_point, None);
    }

    #[test]
    fn test_autopsy_mistake_without_collapse() {
        let engine = MultiverseEngine::default();
        let u = seeded(&engine);
        let u = engine.apply_signal(&u, Signal::peer("neg", -2.0, 0), 3 * MS_PER_DAY, None);
        let report = autopsy(&u, engine.config());
        // 50 → 30 stays above the collapse line
        assert_eq!(report.first_mistake, Some(3));
        assert_eq!(report.collapse_point, None);
    }

    #[test]
    fn test_break_the_multiverse() {
        let engine = MultiverseEngine::default();
        let u = seeded(&engine);
        let before = u.clone();
        let report = break_the_multiverse(&engine, &u, 10 * MS_PER_DAY);
        assert_eq!(report.forks.len(), 4);
        let scores: Vec<u8> = report.forks.iter().map(Universe::trust_score).collect();
        // 50 + 5 * 1.5 * 10 → 100
        assert_eq!(scores, vec![100, 0, 0, 0]);
        assert_eq!(report.divergence_score, 100.0);
        assert!(report.forks.iter().all(|f| !f.is_root()));
        assert_eq!(
            report.forks[3].parent_id.as_deref(),
            Some(report.forks[2].id.as_str())
        );
        assert_eq!(
            report.forks[1].timeline.last().unwrap().action,
            ActionLabel::TrustCollapse
        );
        assert_eq!(u, before);
        assert_eq!(engine.audit_entries_for(&report.forks[0].id).len(), 1);
    }

    #[test]
    fn test_repeated_breaks_audit_distinct_ids() {
        let engine = MultiverseEngine::default();
        let u = seeded(&engine);
        let _ = break_the_multiverse(&engine, &u, 10 * MS_PER_DAY);
        let _ = break_the_multiverse(&engine, &u, 10 * MS_PER_DAY);
        let log = engine.audit_log();
        assert_eq!(log.len(), 6);
        let ids: BTreeSet<&str> = log.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), log.len());
        let prefix = format!("break:{}:", u.id);
        assert!(log.iter().all(|a| a.id.starts_with(&prefix)));
    }

    #[test]
    fn test_break_with_empty_timeline() {
        let engine = MultiverseEngine::default();
        let u = Universe {
            timeline: Timeline::from(Vec::new()),
            ..seeded(&engine)
        };
        let report = break_the_multiverse(&engine, &u, 10 * MS_PER_DAY);
        assert_eq!(report.forks.len(), 4);
        assert_eq!(report.forks[0].trust_score(), 100);
        assert!(u.timeline.is_empty());
    }
}
