// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{TrustSimError, TrustSimResult};
use crate::signal::Timestamp;

/// Employer-owned scoring policy. Read-only input to the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Trust score an entity is expected to meet, on [0, 100].
    /// Default: 70.
    pub threshold: f64,

    /// Per-day decay rate applied by callers that age signals.
    /// Default: 0.05.
    pub decay_rate: f64,

    /// Multiplier applied to supervisor-sourced signal weights.
    /// Default: 1.5.
    pub supervisor_weight: f64,

    /// Appetite for risk on [0, 1]. Reported, not scored.
    /// Default: 0.5.
    pub risk_tolerance: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            threshold: 70.0,
            decay_rate: 0.05,
            supervisor_weight: 1.5,
            risk_tolerance: 0.5,
        }
    }
}

impl Policy {
    pub fn validate(&self) -> TrustSimResult<()> {
        if !self.threshold.is_finite() || !(0.0..=100.0).contains(&self.threshold) {
            return Err(TrustSimError::Config(format!(
                "threshold must be in [0, 100], got {}",
                self.threshold
            )));
        }
        if !self.decay_rate.is_finite() || !(0.0..=1.0).contains(&self.decay_rate) {
            return Err(TrustSimError::Config(format!(
                "decay_rate must be in [0, 1], got {}",
                self.decay_rate
            )));
        }
        if !self.supervisor_weight.is_finite() || self.supervisor_weight < 0.0 {
            return Err(TrustSimError::Config(format!(
                "supervisor_weight must be finite and >= 0, got {}",
                self.supervisor_weight
            )));
        }
        if !self.risk_tolerance.is_finite() || !(0.0..=1.0).contains(&self.risk_tolerance) {
            return Err(TrustSimError::Config(format!(
                "risk_tolerance must be in [0, 1], got {}",
                self.risk_tolerance
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> TrustSimResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TrustSimError::Config(format!("JSON parse error: {e}")))
    }
}

/// Kernel-wide constants for the multiverse and population layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Policy used for universes created without an explicit one.
    pub default_policy: Policy,

    /// Feed human-factor modifiers back into the engine set.
    /// Default: true.
    pub human_factors_enabled: bool,

    /// Weight of each signal added by fake-consensus injection.
    /// Default: 0.5.
    pub fake_consensus_weight: f64,

    /// Autopsy collapse line: a drop from >= this to < this.
    /// Default: 20.
    pub collapse_line: f64,

    /// Autopsy "first mistake": single-step drop larger than this.
    /// Default: 15.
    pub mistake_drop: f64,

    /// Trust-debt accrues only on single-step rises above this.
    /// Default: 5.
    pub debt_jump_threshold: f64,

    /// Fraction of each qualifying rise booked as debt.
    /// Default: 0.1.
    pub debt_rate: f64,

    /// Compliance below this counts as a breach in population metrics.
    /// Default: 60.
    pub compliance_breach_line: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            default_policy: Policy::default(),
            human_factors_enabled: true,
            fake_consensus_weight: 0.5,
            collapse_line: 20.0,
            mistake_drop: 15.0,
            debt_jump_threshold: 5.0,
            debt_rate: 0.1,
            compliance_breach_line: 60.0,
        }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> TrustSimResult<()> {
        self.default_policy.validate()?;
        if !self.fake_consensus_weight.is_finite() {
            return Err(TrustSimError::Config(format!(
                "fake_consensus_weight must be finite, got {}",
                self.fake_consensus_weight
            )));
        }
        for (name, value) in [
            ("collapse_line", self.collapse_line),
            ("mistake_drop", self.mistake_drop),
            ("debt_jump_threshold", self.debt_jump_threshold),
            ("compliance_breach_line", self.compliance_breach_line),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(TrustSimError::Config(format!(
                    "{name} must be in [0, 100], got {value}"
                )));
            }
        }
        if !self.debt_rate.is_finite() || !(0.0..=1.0).contains(&self.debt_rate) {
            return Err(TrustSimError::Config(format!(
                "debt_rate must be in [0, 1], got {}",
                self.debt_rate
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> TrustSimResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TrustSimError::Config(format!("JSON parse error: {e}")))
    }

    /// Build an engine context for `policy` at time `now`.
    pub fn context(&self, policy: &Policy, now: Timestamp) -> EngineContext {
        EngineContext {
            policy: policy.clone(),
            now,
            human_factors_enabled: self.human_factors_enabled,
        }
    }
}

/// Everything an engine may read besides the snapshot and delta.
///
/// `now` is explicit: no engine reads a wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineContext {
    pub policy: Policy,
    pub now: Timestamp,
    pub human_factors_enabled: bool,
}

impl EngineContext {
    pub fn new(policy: Policy, now: Timestamp) -> Self {
        Self {
            policy,
            now,
            human_factors_enabled: true,
        }
    }

    pub fn without_human_factors(mut self) -> Self {
        self.human_factors_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_valid() {
        assert!(Policy::default().validate().is_ok());
    }

    #[test]
    fn test_policy_threshold_out_of_range() {
        let policy = Policy {
            threshold: 120.0,
            ..Policy::default()
        };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_policy_nan_supervisor_weight() {
        let policy = Policy {
            supervisor_weight: f64::NAN,
            ..Policy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_kernel_config_default_valid() {
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_kernel_config_bad_debt_rate() {
        let config = KernelConfig {
            debt_rate: 3.0,
            ..KernelConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kernel_config_json_roundtrip() {
        let config = KernelConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back = KernelConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_policy_from_json_error() {
        let err = Policy::from_json("{not json").unwrap_err();
        assert!(matches!(err, TrustSimError::Config(_)));
    }

    #[test]
    fn test_context_carries_flag() {
        let mut config = KernelConfig::default();
        config.human_factors_enabled = false;
        let ctx = config.context(&Policy::default(), 42);
        assert_eq!(ctx.now, 42);
        assert!(!ctx.human_factors_enabled);
    }
}
