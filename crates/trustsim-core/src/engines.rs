// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Engine Set
// ─────────────────────────────────────────────────────────────────────
//! Seven pure scoring engines. Each reads the provisional snapshot and
//! the pending delta (plus context, earlier outputs of the same pass and
//! human-factor modifiers where needed) and returns one integer on
//! [0, 100].
//!
//! | engine | core term |
//! |---|---|
//! | TrustScore | `10 · Σ wᵢ · supᵢ · bias · (1 − noiseᵢ)` |
//! | Confidence | signal volume + source diversity, `× (1 − err)` |
//! | Risk | `max(0, θ − trust) + min(50, 100·Var(w))` |
//! | Fragility | `(100 − trust)/2 + 30/(1 + 100·Var(w))` |
//! | TrustDebt | `100 · max(0, trust/100 − conf/100)` |
//! | Compliance | `100 − 2·max(0, θ − trust)` |
//! | CultureImpact | volume + peer/supervisor balance |

use std::collections::BTreeSet;

use trustsim_types::score::{clamp_score, finite_or, to_score};
use trustsim_types::{
    Delta, EngineContext, HumanFactorModifiers, IntentModifiers, Signal, Snapshot, SourceKind,
    Timestamp,
};

/// Weight cap on the variance penalty inside Risk.
pub const RISK_VARIANCE_CAP: f64 = 50.0;
/// Peak of the Fragility concentration term (all weights identical).
pub const FRAGILITY_CONCENTRATION_PEAK: f64 = 30.0;

/// Intent modifiers with every field forced into its documented range.
pub fn sanitize_intent(intent: &IntentModifiers) -> IntentModifiers {
    IntentModifiers {
        human_error_rate: clamp_score(intent.human_error_rate, 0.0, 1.0),
        intent_bias: clamp_score(finite_or(intent.intent_bias, 1.0), 0.0, 10.0),
        decay_multiplier: clamp_score(finite_or(intent.decay_multiplier, 1.0), 0.0, 10.0),
        supervisor_weight_override: intent
            .supervisor_weight_override
            .filter(|w| w.is_finite())
            .map(|w| w.max(0.0)),
    }
}

/// Effective threshold: delta override, else policy, else the midpoint.
pub fn effective_threshold(delta: &Delta, ctx: &EngineContext) -> f64 {
    let base = clamp_score(finite_or(ctx.policy.threshold, 50.0), 0.0, 100.0);
    match delta.threshold_override {
        Some(t) if t.is_finite() => clamp_score(t, 0.0, 100.0),
        _ => base,
    }
}

/// Deterministic per-signal damping in `[0, human_error_rate]`.
///
/// A splitmix64 finaliser over `(timestamp, index)`; no entropy source.
pub fn signal_noise(timestamp: Timestamp, index: usize, human_error_rate: f64) -> f64 {
    let mut z = (timestamp as u64) ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    let unit = (z >> 11) as f64 / (1u64 << 53) as f64;
    clamp_score(human_error_rate, 0.0, 1.0) * unit
}

fn weights(signals: &[Signal]) -> impl Iterator<Item = f64> + '_ {
    signals.iter().map(|s| finite_or(s.weight, 0.0))
}

/// Population variance of signal weights; 0 for fewer than two signals.
pub fn weight_variance(signals: &[Signal]) -> f64 {
    let n = signals.len();
    if n < 2 {
        return 0.0;
    }
    let mean = weights(signals).sum::<f64>() / n as f64;
    weights(signals).map(|w| (w - mean).powi(2)).sum::<f64>() / n as f64
}

fn count_source(signals: &[Signal], kind: SourceKind) -> usize {
    signals.iter().filter(|s| s.source == kind).count()
}

// ── 1. TrustScore ───────────────────────────────────────────────────

pub fn trust_score(snapshot: &Snapshot, delta: &Delta, ctx: &EngineContext) -> u8 {
    let intent = sanitize_intent(&delta.intent);
    let supervisor_factor = intent
        .supervisor_weight_override
        .unwrap_or_else(|| finite_or(ctx.policy.supervisor_weight, 1.0).max(0.0));

    let sum: f64 = snapshot
        .signals
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut w = finite_or(s.weight, 0.0);
            if s.source == SourceKind::Supervisor {
                w *= supervisor_factor;
            }
            w *= intent.intent_bias;
            w * (1.0 - signal_noise(s.timestamp, i, intent.human_error_rate))
        })
        .sum();

    to_score(sum * 10.0)
}

// ── 2. Confidence ───────────────────────────────────────────────────

pub fn confidence(snapshot: &Snapshot, delta: &Delta, modifiers: &HumanFactorModifiers) -> u8 {
    let intent = sanitize_intent(&delta.intent);
    let n = snapshot.signals.len();
    let kinds: BTreeSet<SourceKind> = snapshot.signals.iter().map(|s| s.source).collect();

    let volume = (n as f64 * 7.0).min(70.0);
    let diversity = (kinds.len() as f64 * 10.0).min(30.0);
    let stability = finite_or(modifiers.confidence_stability, 1.0);

    let raw = (volume + diversity) * (1.0 - intent.human_error_rate) * stability;
    to_score(raw)
}

// ── 3. Risk ─────────────────────────────────────────────────────────

pub fn risk(
    snapshot: &Snapshot,
    delta: &Delta,
    ctx: &EngineContext,
    trust: u8,
    modifiers: &HumanFactorModifiers,
) -> u8 {
    let gap = (effective_threshold(delta, ctx) - f64::from(trust)).max(0.0);
    let penalty = (weight_variance(&snapshot.signals) * 100.0).min(RISK_VARIANCE_CAP);
    let reduction = finite_or(modifiers.risk_volatility_reduction, 1.0);
    to_score((gap + penalty) * reduction)
}

// ── 4. Fragility ────────────────────────────────────────────────────

pub fn fragility(
    snapshot: &Snapshot,
    delta: &Delta,
    trust: u8,
    modifiers: &HumanFactorModifiers,
) -> u8 {
    let intent = sanitize_intent(&delta.intent);
    let base = (100.0 - f64::from(trust)) * 0.5;
    let concentration = if snapshot.signals.len() < 2 {
        0.0
    } else {
        FRAGILITY_CONCENTRATION_PEAK / (1.0 + weight_variance(&snapshot.signals) * 100.0)
    };
    let adjustment = finite_or(modifiers.fragility_adjustment, 0.0);
    let raw = (base + concentration) * intent.decay_multiplier + adjustment;
    to_score(raw)
}

// ── 5. TrustDebt ────────────────────────────────────────────────────

/// Trust running ahead of the evidence behind it.
pub fn trust_debt(
    delta: &Delta,
    trust: u8,
    confidence: u8,
    modifiers: &HumanFactorModifiers,
) -> u8 {
    let intent = sanitize_intent(&delta.intent);
    let gap = (f64::from(trust) / 100.0 - f64::from(confidence) / 100.0).max(0.0);
    let multiplier = finite_or(modifiers.trust_debt_multiplier, 1.0);
    to_score(gap * 100.0 * intent.decay_multiplier * multiplier)
}

// ── 6. Compliance ───────────────────────────────────────────────────

pub fn compliance(
    delta: &Delta,
    ctx: &EngineContext,
    trust: u8,
    modifiers: &HumanFactorModifiers,
) -> u8 {
    let gap = (effective_threshold(delta, ctx) - f64::from(trust)).max(0.0);
    let divisor = finite_or(modifiers.compliance_risk_multiplier, 1.0);
    let divisor = if divisor > 0.0 { divisor } else { 1.0 };
    to_score((100.0 - 2.0 * gap) / divisor)
}

// ── 7. CultureImpact ────────────────────────────────────────────────

pub fn culture_impact(snapshot: &Snapshot) -> u8 {
    let total = snapshot.signals.len();
    if total == 0 {
        return 0;
    }
    let peer = count_source(&snapshot.signals, SourceKind::Peer) as f64;
    let supervisor = count_source(&snapshot.signals, SourceKind::Supervisor) as f64;
    let balance = 1.0 - (peer - supervisor).abs() / total as f64;
    let volume = (total as f64 * 5.0).min(50.0);
    to_score(volume + balance * 50.0)
}
