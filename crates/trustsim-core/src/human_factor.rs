// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Human-Factor Proxies
// ─────────────────────────────────────────────────────────────────────
//! Observable proxies derived only from signal counts, timestamps,
//! source kinds and weights. Nothing here reads free text or infers a
//! trait; every insight string describes what was observed.
//!
//! The module also emits the modifiers the engine set consumes. They
//! are pure functions of the same proxies, so every soft adjustment to
//! a hard score is traceable to observed timing and composition.

use trustsim_types::score::{clamp_score, finite_or};
use trustsim_types::{
    HumanFactorInsights, HumanFactorModifiers, ProxyMeasurement, Signal, SourceKind, Timestamp,
    MS_PER_DAY,
};

/// Value reported when a proxy has too few observations to measure.
pub const NEUTRAL_PROXY: f64 = 50.0;

/// Recency window for the relational-trust proxy, in days.
const PEER_RECENCY_DAYS: f64 = 30.0;

fn days_between(earlier: Timestamp, later: Timestamp) -> f64 {
    (later.saturating_sub(earlier)).max(0) as f64 / MS_PER_DAY as f64
}

fn relational_trust(signals: &[Signal], now: Timestamp) -> ProxyMeasurement {
    let peers: Vec<&Signal> = signals
        .iter()
        .filter(|s| s.source == SourceKind::Peer)
        .collect();
    let Some(latest) = peers.iter().map(|s| s.timestamp).max() else {
        return ProxyMeasurement::new(0.0, "No peer signals observed yet.");
    };
    let volume = (peers.len() as f64 * 10.0).min(60.0);
    let age_days = days_between(latest, now);
    let recency = 40.0 * (1.0 - age_days / PEER_RECENCY_DAYS).max(0.0);
    ProxyMeasurement::new(
        volume + recency,
        format!(
            "{} peer signal(s); most recent {:.1} day(s) ago.",
            peers.len(),
            age_days
        ),
    )
}

fn collaboration_stability(signals: &[Signal]) -> ProxyMeasurement {
    if signals.len() < 3 {
        return ProxyMeasurement::new(
            NEUTRAL_PROXY,
            "Too few signals to measure the rhythm between them.",
        );
    }
    let mut times: Vec<Timestamp> = signals.iter().map(|s| s.timestamp).collect();
    times.sort_unstable();
    let gaps: Vec<f64> = times
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]) as f64)
        .collect();
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= 0.0 {
        return ProxyMeasurement::new(100.0, "All signals arrived at the same moment.");
    }
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64;
    // Coefficient of variation: variance normalised by the mean gap.
    let cv = finite_or(variance.sqrt() / mean, 0.0);
    ProxyMeasurement::new(
        100.0 / (1.0 + cv),
        format!("Spacing between signals varies by {cv:.2}x the average gap."),
    )
}

fn ethical_friction(signals: &[Signal]) -> ProxyMeasurement {
    let supervisor_times: Vec<Timestamp> = signals
        .iter()
        .filter(|s| s.source == SourceKind::Supervisor)
        .map(|s| s.timestamp)
        .collect();
    let (Some(first_sup), Some(last_sup)) = (
        supervisor_times.iter().min().copied(),
        supervisor_times.iter().max().copied(),
    ) else {
        return ProxyMeasurement::new(0.0, "No supervisor signals observed.");
    };
    let earliest = signals
        .iter()
        .map(|s| s.timestamp)
        .min()
        .unwrap_or(first_sup);
    let spread = days_between(first_sup, last_sup);
    let delay = days_between(earliest, first_sup);
    ProxyMeasurement::new(
        spread * 2.0 + delay * 3.0,
        format!(
            "Supervisor signals span {spread:.1} day(s); the first arrived {delay:.1} day(s) \
             after the earliest signal."
        ),
    )
}

fn social_gravity(signals: &[Signal]) -> ProxyMeasurement {
    if signals.is_empty() {
        return ProxyMeasurement::new(0.0, "No signals observed.");
    }
    let total_weight: f64 = signals.iter().map(|s| finite_or(s.weight, 0.0).abs()).sum();
    let supervisor_weight: f64 = signals
        .iter()
        .filter(|s| s.source == SourceKind::Supervisor)
        .map(|s| finite_or(s.weight, 0.0).abs())
        .sum();
    let share = if total_weight > 0.0 {
        supervisor_weight / total_weight
    } else {
        0.0
    };
    let volume = (signals.len() as f64 * 5.0).min(50.0);
    ProxyMeasurement::new(
        volume + share * 50.0,
        format!(
            "{} signal(s); {:.0}% of total weight came from supervisors.",
            signals.len(),
            share * 100.0
        ),
    )
}

fn workplace_friction(signals: &[Signal], now: Timestamp) -> ProxyMeasurement {
    let (Some(earliest), Some(latest)) = (
        signals.iter().map(|s| s.timestamp).min(),
        signals.iter().map(|s| s.timestamp).max(),
    ) else {
        return ProxyMeasurement::new(0.0, "No signal history observed.");
    };
    let span = days_between(earliest, latest);
    let age = days_between(earliest, now);
    ProxyMeasurement::new(
        span + age * 0.5,
        format!("History spans {span:.1} day(s); oldest signal is {age:.1} day(s) old."),
    )
}

/// Modifiers as pure functions of the proxies.
pub fn derive_modifiers(
    collaboration_stability: f64,
    ethical_friction: f64,
    workplace_friction: f64,
) -> HumanFactorModifiers {
    let stability = clamp_score(collaboration_stability, 0.0, 100.0) / 100.0;
    let friction = clamp_score(ethical_friction, 0.0, 100.0) / 100.0;
    let workplace = clamp_score(workplace_friction, 0.0, 100.0);
    HumanFactorModifiers {
        confidence_stability: 0.9 + stability * 0.2,
        risk_volatility_reduction: 1.0 - stability * 0.2,
        fragility_adjustment: (workplace - 50.0) / 10.0,
        trust_debt_multiplier: 1.0 + friction * 0.5,
        compliance_risk_multiplier: 1.0 + friction * 0.25,
    }
}

/// Compute all five proxies and the engine modifiers at time `now`.
pub fn compute_insights(signals: &[Signal], now: Timestamp) -> HumanFactorInsights {
    let relational_trust = relational_trust(signals, now);
    let collaboration_stability = collaboration_stability(signals);
    let ethical_friction = ethical_friction(signals);
    let social_gravity = social_gravity(signals);
    let workplace_friction = workplace_friction(signals, now);
    let modifiers = derive_modifiers(
        collaboration_stability.value,
        ethical_friction.value,
        workplace_friction.value,
    );
    HumanFactorInsights {
        relational_trust,
        collaboration_stability,
        ethical_friction,
        social_gravity,
        workplace_friction,
        modifiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = MS_PER_DAY;

    #[test]
    fn test_empty_signals() {
        let insights = compute_insights(&[], 0);
        assert_eq!(insights.relational_trust.value, 0.0);
        assert_eq!(insights.collaboration_stability.value, NEUTRAL_PROXY);
        assert_eq!(insights.ethical_friction.value, 0.0);
        assert_eq!(insights.social_gravity.value, 0.0);
        assert_eq!(insights.workplace_friction.value, 0.0);
    }

    #[test]
    fn test_relational_trust_recency() {
        let signals = vec![Signal::peer("a", 0.5, 0), Signal::peer("b", 0.5, 10 * DAY)];
        let fresh = compute_insights(&signals, 10 * DAY);
        // 2*10 + 40
        assert!((fresh.relational_trust.value - 60.0).abs() < 1e-9);
        let stale = compute_insights(&signals, 100 * DAY);
        assert!((stale.relational_trust.value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_collaboration_stability_regular_gaps() {
        let signals: Vec<Signal> = (0..5)
            .map(|i| Signal::peer(format!("p{i}"), 0.5, i * DAY))
            .collect();
        let insights = compute_insights(&signals, 5 * DAY);
        let stability = insights.collaboration_stability.value;
        assert!((stability - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_collaboration_stability_irregular_gaps() {
        let signals = vec![
            Signal::peer("a", 0.5, 0),
            Signal::peer("b", 0.5, DAY),
            Signal::peer("c", 0.5, 20 * DAY),
        ];
        let insights = compute_insights(&signals, 20 * DAY);
        assert!(insights.collaboration_stability.value < 60.0);
    }

    #[test]
    fn test_ethical_friction_delay_and_spread() {
        let signals = vec![
            Signal::peer("a", 0.5, 0),
            Signal::supervisor("s1", 0.5, 2 * DAY),
            Signal::supervisor("s2", 0.5, 5 * DAY),
        ];
        let insights = compute_insights(&signals, 5 * DAY);
        // spread 3 days * 2 + delay 2 days * 3 = 12
        assert!((insights.ethical_friction.value - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_social_gravity_supervisor_share() {
        let signals = vec![Signal::peer("a", 1.0, 0), Signal::supervisor("s", 1.0, 0)];
        let insights = compute_insights(&signals, 0);
        // 2*5 + 0.5*50
        assert!((insights.social_gravity.value - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_workplace_friction_span_and_age() {
        let signals = vec![Signal::peer("a", 1.0, 0), Signal::peer("b", 1.0, 10 * DAY)];
        let insights = compute_insights(&signals, 20 * DAY);
        // span 10 + age 20 * 0.5
        assert!((insights.workplace_friction.value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_modifier_ranges() {
        let low = derive_modifiers(0.0, 0.0, 0.0);
        let high = derive_modifiers(100.0, 100.0, 100.0);
        assert!((low.confidence_stability - 0.9).abs() < 1e-12);
        assert!((high.confidence_stability - 1.1).abs() < 1e-12);
        assert!((high.risk_volatility_reduction - 0.8).abs() < 1e-12);
        assert_eq!(low.fragility_adjustment, -5.0);
        assert_eq!(high.fragility_adjustment, 5.0);
        assert_eq!(high.trust_debt_multiplier, 1.5);
        assert_eq!(high.compliance_risk_multiplier, 1.25);
    }

    #[test]
    fn test_insight_strings_present() {
        let signals = vec![Signal::peer("a", 1.0, 0), Signal::supervisor("s", 1.0, DAY)];
        let insights = compute_insights(&signals, 2 * DAY);
        for proxy in [
            &insights.relational_trust,
            &insights.collaboration_stability,
            &insights.ethical_friction,
            &insights.social_gravity,
            &insights.workplace_friction,
        ] {
            assert!(!proxy.insight.is_empty());
        }
    }
}
