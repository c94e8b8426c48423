// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Synthetic Population Generator
// ─────────────────────────────────────────────────────────────────────
//! Deterministic construction of fake employees and their signal
//! histories for load and what-if testing.
//!
//! Each employee gets a target trust score drawn from the requested
//! range. Signal kinds are drawn from the source mix, raw weights from
//! [0.5, 1.5), and the weights are then scaled so that the reducer's
//! weighted sum lands on the target. Identical parameters reproduce
//! identical employees.

use serde::{Deserialize, Serialize};

use trustsim_core::apply_delta;
use trustsim_types::{
    Delta, Employee, Employer, EngineContext, Policy, Population, Signal, Snapshot, SourceKind,
    Timestamp, TrustSimError, TrustSimResult, MS_PER_DAY,
};

use crate::rng::SimpleRng;

/// Fewest employees produced by one bulk call.
pub const MIN_BULK_COUNT: usize = 10;
/// Most employees produced by one bulk call.
pub const MAX_BULK_COUNT: usize = 1000;
/// Generated trust scores land within the requested range ± this.
pub const TRUST_TOLERANCE: u8 = 1;

/// Relative frequency of each source kind in generated histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMix {
    pub peer: f64,
    pub supervisor: f64,
    pub manager: f64,
    pub synthetic: f64,
    pub self_report: f64,
    pub external: f64,
}

impl Default for SourceMix {
    fn default() -> Self {
        Self {
            peer: 0.6,
            supervisor: 0.25,
            manager: 0.1,
            synthetic: 0.0,
            self_report: 0.05,
            external: 0.0,
        }
    }
}

impl SourceMix {
    fn weight_of(&self, kind: SourceKind) -> f64 {
        let w = match kind {
            SourceKind::Peer => self.peer,
            SourceKind::Supervisor => self.supervisor,
            SourceKind::Manager => self.manager,
            SourceKind::Synthetic => self.synthetic,
            SourceKind::SelfReport => self.self_report,
            SourceKind::External => self.external,
        };
        if w.is_finite() && w > 0.0 {
            w
        } else {
            0.0
        }
    }

    pub fn total(&self) -> f64 {
        SourceKind::ALL.iter().map(|&k| self.weight_of(k)).sum()
    }

    /// Map a unit draw onto a source kind by cumulative weight.
    pub fn pick(&self, unit: f64) -> SourceKind {
        let target = unit * self.total();
        let mut acc = 0.0;
        let mut last = SourceKind::Peer;
        for kind in SourceKind::ALL {
            let w = self.weight_of(kind);
            if w <= 0.0 {
                continue;
            }
            acc += w;
            last = kind;
            if target < acc {
                return kind;
            }
        }
        last
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployerParams {
    pub id: String,
    pub name: String,
    pub policy: Policy,
}

impl Default for EmployerParams {
    fn default() -> Self {
        Self {
            id: "employer-synthetic".to_string(),
            name: "Synthetic Employer".to_string(),
            policy: Policy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeParams {
    pub name_templates: Vec<String>,
    pub role_templates: Vec<String>,
    pub trust_score_min: f64,
    pub trust_score_max: f64,
    /// Signals per employee.
    pub review_count: usize,
    pub source_mix: SourceMix,
    pub seed: u64,
    /// Timestamp of every employee's first signal.
    pub start: Timestamp,
    pub review_interval_days: i64,
}

impl Default for EmployeeParams {
    fn default() -> Self {
        Self {
            name_templates: vec!["Alex".into(), "Sam".into(), "Jordan".into(), "Riley".into()],
            role_templates: vec!["Engineer".into(), "Analyst".into(), "Designer".into()],
            trust_score_min: 40.0,
            trust_score_max: 90.0,
            review_count: 8,
            source_mix: SourceMix::default(),
            seed: 1337,
            start: 1_700_000_000_000,
            review_interval_days: 7,
        }
    }
}

impl EmployeeParams {
    pub fn validate(&self) -> TrustSimResult<()> {
        if !self.trust_score_min.is_finite() || !self.trust_score_max.is_finite() {
            return Err(TrustSimError::Numerical(
                "trust score range must be finite".to_string(),
            ));
        }
        if self.trust_score_min < 0.0
            || self.trust_score_max > 100.0
            || self.trust_score_min > self.trust_score_max
        {
            return Err(TrustSimError::Validation(format!(
                "trust score range must satisfy 0 <= min <= max <= 100, got [{}, {}]",
                self.trust_score_min, self.trust_score_max
            )));
        }
        if self.trust_score_min.ceil() > self.trust_score_max.floor() {
            return Err(TrustSimError::Validation(format!(
                "trust score range [{}, {}] contains no integer score",
                self.trust_score_min, self.trust_score_max
            )));
        }
        if self.review_count == 0 {
            return Err(TrustSimError::Validation(
                "review_count must be >= 1".to_string(),
            ));
        }
        if self.name_templates.is_empty() || self.role_templates.is_empty() {
            return Err(TrustSimError::Validation(
                "name and role templates must be non-empty".to_string(),
            ));
        }
        if self.source_mix.total() <= 0.0 {
            return Err(TrustSimError::Validation(
                "source mix must have positive total weight".to_string(),
            ));
        }
        if self.review_interval_days < 0 {
            return Err(TrustSimError::Validation(format!(
                "review_interval_days must be >= 0, got {}",
                self.review_interval_days
            )));
        }
        Ok(())
    }
}

/// Seeded generator for one employer.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    employer: Employer,
    params: EmployeeParams,
}

impl SyntheticGenerator {
    pub fn new(employer: EmployerParams, params: EmployeeParams) -> TrustSimResult<Self> {
        employer.policy.validate()?;
        params.validate()?;
        Ok(Self {
            employer: Employer {
                id: employer.id,
                name: employer.name,
                policy: employer.policy,
            },
            params,
        })
    }

    pub fn employer(&self) -> &Employer {
        &self.employer
    }

    /// Generate `count` employees, clamped to `[MIN_BULK_COUNT, MAX_BULK_COUNT]`.
    pub fn generate(&self, count: usize) -> Vec<Employee> {
        let bounded = count.clamp(MIN_BULK_COUNT, MAX_BULK_COUNT);
        if bounded != count {
            log::warn!(
                "generate: count {count} outside [{MIN_BULK_COUNT}, {MAX_BULK_COUNT}], \
                 using {bounded}"
            );
        }
        let mut rng = SimpleRng::new(self.params.seed);
        (0..bounded).map(|i| self.employee(i, &mut rng)).collect()
    }

    pub fn generate_population(&self, count: usize) -> Population {
        Population::new(self.employer.clone(), self.generate(count))
    }

    fn target_score(&self, rng: &mut SimpleRng) -> f64 {
        let lo = self.params.trust_score_min.ceil();
        let hi = self.params.trust_score_max.floor();
        (lo + rng.next_f64() * (hi - lo)).round().clamp(lo, hi)
    }

    fn employee(&self, index: usize, rng: &mut SimpleRng) -> Employee {
        let p = &self.params;
        let name = &p.name_templates[rng.next_index(p.name_templates.len())];
        let role = &p.role_templates[rng.next_index(p.role_templates.len())];
        let id = format!("emp-{:x}-{index:04}", p.seed);
        let target = self.target_score(rng);

        let supervisor_factor = self.employer.policy.supervisor_weight;
        let mut draws: Vec<(SourceKind, f64)> = (0..p.review_count)
            .map(|_| {
                let kind = p.source_mix.pick(rng.next_f64());
                (kind, 0.5 + rng.next_f64())
            })
            .collect();
        let factor = |kind: SourceKind| {
            if kind == SourceKind::Supervisor {
                supervisor_factor
            } else {
                1.0
            }
        };
        let mut effective: f64 = draws.iter().map(|&(k, raw)| raw * factor(k)).sum();
        if effective <= f64::EPSILON {
            // Only zero-weighted supervisors were drawn.
            draws[0].0 = SourceKind::Peer;
            effective = draws.iter().map(|&(k, raw)| raw * factor(k)).sum();
        }
        let scale = (target / 10.0) / effective;

        let interval = p.review_interval_days.saturating_mul(MS_PER_DAY);
        let signals: Vec<Signal> = draws
            .iter()
            .enumerate()
            .map(|(j, &(kind, raw))| {
                Signal::new(
                    format!("{id}-sig-{j:03}"),
                    kind,
                    raw * scale,
                    p.start.saturating_add(interval.saturating_mul(j as i64)),
                )
            })
            .collect();

        let now = p
            .start
            .saturating_add(interval.saturating_mul(p.review_count as i64));
        let ctx = EngineContext::new(self.employer.policy.clone(), now);
        let snapshot = apply_delta(&Snapshot::zero(p.start), &Delta::add_all(signals), &ctx);

        Employee {
            id,
            name: format!("{name} {}", index + 1),
            role: role.clone(),
            snapshot,
        }
    }
}
