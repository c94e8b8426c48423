// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Population Engine
// ─────────────────────────────────────────────────────────────────────
//! Cross-entity aggregates over a read-only list of snapshots.
//!
//! Empty input yields `PopulationMetrics::default()` (all zeros). A
//! single snapshot has zero variance.

use serde::{Deserialize, Serialize};

use trustsim_types::score::clamp_score;
use trustsim_types::{KernelConfig, Population, Snapshot};

/// Share of the population treated as the tail.
pub const TAIL_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationMetrics {
    pub size: usize,
    pub mean_trust: f64,
    pub trust_variance: f64,
    /// `100 − mean trust of the bottom 10%` (at least one member).
    pub tail_risk: f64,
    /// `(1 − mean/max) × 100`; 0 when the best score is 0.
    pub concentration_risk: f64,
    /// `meanFragility × (1 + min(1, varFragility / 100))`.
    pub fragility_amplification: f64,
    /// Fraction of members below the compliance-breach line, on [0, 1].
    pub compliance_breach_probability: f64,
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

/// Aggregate `snapshots`, counting compliance below `breach_line` as a breach.
pub fn analyze_with(snapshots: &[Snapshot], breach_line: f64) -> PopulationMetrics {
    if snapshots.is_empty() {
        return PopulationMetrics::default();
    }
    let n = snapshots.len();

    let trust: Vec<f64> = snapshots.iter().map(|s| f64::from(s.trust_score)).collect();
    let (mean_trust, trust_variance) = mean_and_variance(&trust);

    let mut sorted = trust.clone();
    sorted.sort_by(f64::total_cmp);
    let tail_len = ((n as f64 * TAIL_FRACTION).floor() as usize).max(1);
    let tail_mean = sorted[..tail_len].iter().sum::<f64>() / tail_len as f64;
    let tail_risk = 100.0 - tail_mean;

    let max_trust = sorted.last().copied().unwrap_or(0.0);
    let concentration_risk = if max_trust > 0.0 {
        (1.0 - mean_trust / max_trust) * 100.0
    } else {
        0.0
    };

    let fragility: Vec<f64> = snapshots
        .iter()
        .map(|s| f64::from(s.fragility_score()))
        .collect();
    let (mean_fragility, var_fragility) = mean_and_variance(&fragility);
    let fragility_amplification = mean_fragility * (1.0 + (var_fragility / 100.0).min(1.0));

    let breaches = snapshots
        .iter()
        .filter(|s| f64::from(s.compliance_score()) < breach_line)
        .count();

    PopulationMetrics {
        size: n,
        mean_trust,
        trust_variance,
        tail_risk: clamp_score(tail_risk, 0.0, 100.0),
        concentration_risk: clamp_score(concentration_risk, 0.0, 100.0),
        fragility_amplification: clamp_score(fragility_amplification, 0.0, 200.0),
        compliance_breach_probability: breaches as f64 / n as f64,
    }
}

/// Aggregate with the default breach line of 60.
pub fn analyze(snapshots: &[Snapshot]) -> PopulationMetrics {
    analyze_with(snapshots, KernelConfig::default().compliance_breach_line)
}

/// Aggregate every employee of `population`.
pub fn analyze_population(population: &Population, config: &KernelConfig) -> PopulationMetrics {
    let snapshots: Vec<Snapshot> = population.snapshots().cloned().collect();
    analyze_with(&snapshots, config.compliance_breach_line)
}
