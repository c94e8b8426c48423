// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Reducer
// ─────────────────────────────────────────────────────────────────────
//! The single state transition `apply_delta(snapshot, delta, ctx)`.
//!
//! Stages run in a fixed order and none may be skipped:
//!   1. Removals by id, then additions → provisional snapshot
//!   2. Human-factor insights + modifiers from the provisional snapshot
//!   3. TrustScore (or the delta's explicit override)
//!   4. Confidence, Risk, Fragility, TrustDebt, Compliance, CultureImpact
//!   5. Assemble `EngineOutputs` and return the new snapshot
//!
//! The previous snapshot is only ever borrowed.

use std::collections::BTreeSet;

use trustsim_types::score::to_score;
use trustsim_types::{Delta, EngineContext, EngineOutputs, HumanFactorModifiers, Signal, Snapshot};

use crate::engines;
use crate::human_factor;

/// Metadata key under which a delta's notes are recorded.
pub const NOTE_KEY: &str = "note";

fn provisional(prev: &Snapshot, delta: &Delta, ctx: &EngineContext) -> Snapshot {
    let removals: BTreeSet<&str> = delta.remove_signal_ids.iter().map(String::as_str).collect();
    let mut signals: Vec<Signal> = prev
        .signals
        .iter()
        .filter(|s| !removals.contains(s.id.as_str()))
        .cloned()
        .collect();

    for signal in &delta.add_signals {
        if signals.iter().any(|s| s.id == signal.id) {
            log::warn!("apply_delta: duplicate signal id {:?} ignored", signal.id);
            continue;
        }
        signals.push(signal.clone());
    }

    let mut metadata = prev.metadata.clone();
    metadata.extend(delta.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    if let Some(note) = &delta.notes {
        metadata.insert(NOTE_KEY.to_string(), note.clone());
    }

    Snapshot {
        timestamp: ctx.now,
        network_strength: signals.len(),
        signals,
        trust_score: prev.trust_score,
        confidence_score: prev.confidence_score,
        metadata,
        engine_outputs: None,
    }
}

/// Run one full transition. Never panics, never mutates `prev`.
pub fn apply_delta(prev: &Snapshot, delta: &Delta, ctx: &EngineContext) -> Snapshot {
    // Stage 1
    let mut next = provisional(prev, delta, ctx);

    // Stage 2
    let insights = human_factor::compute_insights(&next.signals, ctx.now);
    let modifiers = if ctx.human_factors_enabled {
        insights.modifiers
    } else {
        HumanFactorModifiers::default()
    };

    // Stage 3
    let trust = match delta.trust_score_override {
        Some(value) if value.is_finite() => to_score(value),
        Some(value) => {
            log::warn!("apply_delta: non-finite trust override {value} ignored");
            engines::trust_score(&next, delta, ctx)
        }
        None => engines::trust_score(&next, delta, ctx),
    };

    // Stage 4
    let confidence = engines::confidence(&next, delta, &modifiers);
    let risk = engines::risk(&next, delta, ctx, trust, &modifiers);
    let fragility = engines::fragility(&next, delta, trust, &modifiers);
    let trust_debt = engines::trust_debt(delta, trust, confidence, &modifiers);
    let compliance = engines::compliance(delta, ctx, trust, &modifiers);
    let culture_impact = engines::culture_impact(&next);

    // Stage 5
    next.trust_score = trust;
    next.confidence_score = confidence;
    next.engine_outputs = Some(EngineOutputs {
        trust_score: trust,
        confidence_score: confidence,
        risk_score: risk,
        fragility_score: fragility,
        trust_debt,
        compliance_score: compliance,
        culture_impact_score: culture_impact,
        human_factor_insights: insights,
    });

    log::debug!(
        "apply_delta: +{} -{} signals={} trust={} confidence={} risk={}",
        delta.add_signals.len(),
        delta.remove_signal_ids.len(),
        next.network_strength,
        trust,
        confidence,
        risk
    );
    next
}

/// Fold an ordered sequence of transitions from `initial`.
///
/// Returns every intermediate snapshot, excluding `initial`. Identical
/// inputs reproduce identical outputs.
pub fn replay<I>(initial: &Snapshot, steps: I) -> Vec<Snapshot>
where
    I: IntoIterator<Item = (Delta, EngineContext)>,
{
    let mut history: Vec<Snapshot> = Vec::new();
    for (delta, ctx) in steps {
        let prev = history.last().unwrap_or(initial);
        let next = apply_delta(prev, &delta, &ctx);
        history.push(next);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustsim_types::{IntentModifiers, Policy, MS_PER_DAY};

    fn ctx(now: i64) -> EngineContext {
        EngineContext::new(Policy::default(), now)
    }

    fn three_peers() -> Snapshot {
        let delta = Delta::add_all(vec![
            Signal::peer("a", 0.4, 0),
            Signal::peer("b", 0.4, MS_PER_DAY),
            Signal::peer("c", 0.4, 2 * MS_PER_DAY),
        ]);
        apply_delta(&Snapshot::zero(0), &delta, &ctx(3 * MS_PER_DAY))
    }

    #[test]
    fn test_golden_three_peers() {
        let snap = three_peers();
        assert_eq!(snap.trust_score, 12);
        assert_eq!(snap.network_strength, 3);
        let outputs = snap.engine_outputs.as_ref().unwrap();
        assert_eq!(outputs.trust_score, 12);
        // threshold 70, gap 58 → compliance 100 - 116 < 0
        assert_eq!(outputs.compliance_score, 0);
    }

    #[test]
    fn test_empty_delta_is_idempotent() {
        let snap = three_peers();
        let again = apply_delta(&snap, &Delta::empty(), &ctx(3 * MS_PER_DAY));
        assert_eq!(again.engine_outputs, snap.engine_outputs);
        assert_eq!(again.signals, snap.signals);
    }

    #[test]
    fn test_add_then_remove_restores() {
        let base = three_peers();
        let added = apply_delta(
            &base,
            &Delta::add(Signal::supervisor("s", 2.0, 2 * MS_PER_DAY)),
            &ctx(3 * MS_PER_DAY),
        );
        assert_eq!(added.network_strength, 4);
        assert_ne!(added.trust_score, base.trust_score);
        let removed = apply_delta(&added, &Delta::remove("s"), &ctx(3 * MS_PER_DAY));
        assert_eq!(removed.signals, base.signals);
        assert_eq!(removed.engine_outputs, base.engine_outputs);
    }

    #[test]
    fn test_previous_snapshot_untouched() {
        let base = three_peers();
        let copy = base.clone();
        let _ = apply_delta(&base, &Delta::remove("a"), &ctx(0));
        assert_eq!(base, copy);
    }

    #[test]
    fn test_trust_override_bypasses_engine() {
        let base = three_peers();
        let next = apply_delta(
            &base,
            &Delta::empty().with_trust_override(88.4),
            &ctx(3 * MS_PER_DAY),
        );
        assert_eq!(next.trust_score, 88);
        // Other engines see the overridden trust.
        assert_eq!(next.engine_outputs.unwrap().compliance_score, 100);
    }

    #[test]
    fn test_nan_trust_override_falls_back() {
        let base = three_peers();
        let next = apply_delta(
            &base,
            &Delta::empty().with_trust_override(f64::NAN),
            &ctx(3 * MS_PER_DAY),
        );
        assert_eq!(next.trust_score, 12);
    }

    #[test]
    fn test_duplicate_add_ignored() {
        let base = three_peers();
        let next = apply_delta(&base, &Delta::add(Signal::peer("a", 9.0, 0)), &ctx(0));
        assert_eq!(next.network_strength, 3);
        assert_eq!(next.signals[0].weight, 0.4);
    }

    #[test]
    fn test_removal_of_unknown_id_is_noop() {
        let base = three_peers();
        let next = apply_delta(&base, &Delta::remove("missing"), &ctx(3 * MS_PER_DAY));
        assert_eq!(next.signals, base.signals);
    }

    #[test]
    fn test_metadata_and_note_merged() {
        let mut delta = Delta::empty().with_note("quarterly review");
        delta.metadata.insert("source".into(), "hr".into());
        let next = apply_delta(&Snapshot::zero(0), &delta, &ctx(0));
        assert_eq!(next.metadata.get(NOTE_KEY).unwrap(), "quarterly review");
        assert_eq!(next.metadata.get("source").unwrap(), "hr");
    }

    #[test]
    fn test_human_factors_disabled_uses_neutral_modifiers() {
        let delta = Delta::add_all(vec![
            Signal::peer("a", 1.0, 0),
            Signal::supervisor("s", 1.0, 30 * MS_PER_DAY),
        ]);
        let on = apply_delta(&Snapshot::zero(0), &delta, &ctx(30 * MS_PER_DAY));
        let off = apply_delta(
            &Snapshot::zero(0),
            &delta,
            &ctx(30 * MS_PER_DAY).without_human_factors(),
        );
        let on = on.engine_outputs.unwrap();
        let off = off.engine_outputs.unwrap();
        // Insights are always reported, only their influence changes.
        assert_eq!(on.human_factor_insights, off.human_factor_insights);
        assert_ne!(on.compliance_score, off.compliance_score);
    }

    #[test]
    fn test_all_scores_bounded_under_extreme_intent() {
        let delta = Delta::add_all(vec![
            Signal::supervisor("s", 1e9, 0),
            Signal::peer("p", -1e9, 0),
        ])
        .with_intent(IntentModifiers {
            human_error_rate: 0.9,
            intent_bias: 10.0,
            decay_multiplier: 10.0,
            supervisor_weight_override: Some(1e6),
        });
        let next = apply_delta(&Snapshot::zero(0), &delta, &ctx(0));
        for score in next.engine_outputs.unwrap().scores() {
            assert!(score <= 100);
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let steps = || {
            vec![
                (Delta::add(Signal::peer("a", 0.7, 0)), ctx(MS_PER_DAY)),
                (Delta::add(Signal::supervisor("s", 0.9, MS_PER_DAY)), ctx(2 * MS_PER_DAY)),
                (Delta::remove("a"), ctx(3 * MS_PER_DAY)),
            ]
        };
        let first = replay(&Snapshot::zero(0), steps());
        let second = replay(&Snapshot::zero(0), steps());
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(first[2].network_strength, 1);
    }
}
