// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Score Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Return `value` if finite, otherwise `default`.
#[inline]
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::warn!("finite_or: non-finite input {value}, substituting {default}");
        default
    }
}

/// Round a raw engine value onto the integer [0, 100] scale.
#[inline]
pub fn to_score(raw: f64) -> u8 {
    clamp_score(raw.round(), 0.0, 100.0) as u8
}

/// A single observable proxy plus its plain-language reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyMeasurement {
    /// Proxy value on the [0, 100] scale.
    pub value: f64,
    /// Non-judgmental description of what was observed.
    pub insight: String,
}

impl ProxyMeasurement {
    pub fn new(value: f64, insight: impl Into<String>) -> Self {
        Self {
            value: clamp_score(value, 0.0, 100.0),
            insight: insight.into(),
        }
    }
}

/// Modifiers fed back from the human-factor module into the engine set.
///
/// The neutral element (`Default`) leaves every engine unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanFactorModifiers {
    /// Multiplies Confidence. Range [0.9, 1.1].
    pub confidence_stability: f64,
    /// Multiplies Risk. Range [0.8, 1.0].
    pub risk_volatility_reduction: f64,
    /// Added to Fragility after the decay multiplier. Range [-5, 5].
    pub fragility_adjustment: f64,
    /// Multiplies TrustDebt. Range [1.0, 1.5].
    pub trust_debt_multiplier: f64,
    /// Divides Compliance. Range [1.0, 1.25].
    pub compliance_risk_multiplier: f64,
}

impl Default for HumanFactorModifiers {
    fn default() -> Self {
        Self {
            confidence_stability: 1.0,
            risk_volatility_reduction: 1.0,
            fragility_adjustment: 0.0,
            trust_debt_multiplier: 1.0,
            compliance_risk_multiplier: 1.0,
        }
    }
}

/// Five observable proxies derived from signal timing and composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanFactorInsights {
    pub relational_trust: ProxyMeasurement,
    pub collaboration_stability: ProxyMeasurement,
    pub ethical_friction: ProxyMeasurement,
    pub social_gravity: ProxyMeasurement,
    pub workplace_friction: ProxyMeasurement,
    pub modifiers: HumanFactorModifiers,
}

/// The full metric bundle attached to a Snapshot by the reducer.
///
/// All seven scores are integers on [0, 100] and are always populated
/// together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutputs {
    pub trust_score: u8,
    pub confidence_score: u8,
    pub risk_score: u8,
    pub fragility_score: u8,
    pub trust_debt: u8,
    pub compliance_score: u8,
    pub culture_impact_score: u8,
    pub human_factor_insights: HumanFactorInsights,
}

impl EngineOutputs {
    /// The seven numeric scores in fixed engine order.
    pub fn scores(&self) -> [u8; 7] {
        [
            self.trust_score,
            self.confidence_score,
            self.risk_score,
            self.fragility_score,
            self.trust_debt,
            self.compliance_score,
            self.culture_impact_score,
        ]
    }
}
