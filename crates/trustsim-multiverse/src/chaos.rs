// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Chaos Presets
// ─────────────────────────────────────────────────────────────────────
//! Named, fixed sequences of multiverse actions reproducing canonical
//! adverse scenarios. Presets only compose `MultiverseEngine` calls; no
//! preset scores anything itself.
//!
//! Every step is audited under `chaos:<preset>:<step>:<sequence>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use trustsim_types::score::clamp_score;
use trustsim_types::{Signal, Timestamp, TrustSimError, Universe, MS_PER_DAY};

use crate::engine::MultiverseEngine;

const GLASSDOOR_REVIEWS: usize = 10;
const GLASSDOOR_WEIGHT: f64 = -0.8;
const ZOMBIE_WEAK_WEIGHT: f64 = 0.5;
const FRAUD_WEIGHT: f64 = 3.0;
const FRAUD_BACKDATE_DAYS: i64 = 180;
const FRAUD_CONSENSUS: usize = 5;
const AI_FLOOD_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosPreset {
    /// Flood of negative peer reviews.
    GlassdoorAttack,
    /// Forced collapse, then one weak supervisor signal.
    ZombieStartup,
    /// Backdated strong supervisor signal plus injected consensus.
    PerfectFraud,
    /// Debt collection followed by collapse.
    MassLayoffShock,
    /// A large batch of injected consensus.
    AiReferenceFlood,
}

impl ChaosPreset {
    pub const ALL: [ChaosPreset; 5] = [
        ChaosPreset::GlassdoorAttack,
        ChaosPreset::ZombieStartup,
        ChaosPreset::PerfectFraud,
        ChaosPreset::MassLayoffShock,
        ChaosPreset::AiReferenceFlood,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChaosPreset::GlassdoorAttack => "glassdoor_attack",
            ChaosPreset::ZombieStartup => "zombie_startup",
            ChaosPreset::PerfectFraud => "perfect_fraud",
            ChaosPreset::MassLayoffShock => "mass_layoff_shock",
            ChaosPreset::AiReferenceFlood => "ai_reference_flood",
        }
    }
}

impl fmt::Display for ChaosPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChaosPreset {
    type Err = TrustSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChaosPreset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| TrustSimError::Validation(format!("unknown chaos preset: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosOutcome {
    pub preset: ChaosPreset,
    /// Resulting universe(s); the input is never modified.
    pub universes: Vec<Universe>,
    pub narrative: String,
    /// `|final − initial| / 100`, on [0, 1].
    pub divergence_score: f64,
}

fn scripted_id(universe: &Universe, preset: ChaosPreset, ordinal: usize) -> String {
    format!(
        "{}:{}:{}:{ordinal}",
        universe.id,
        preset.name(),
        universe.timeline.len()
    )
}

/// Run `preset` against `universe` at time `at`.
pub fn run_preset(
    engine: &MultiverseEngine,
    universe: &Universe,
    preset: ChaosPreset,
    at: Timestamp,
) -> ChaosOutcome {
    let audit = |step: usize| engine.next_audit_id(&format!("chaos:{}:{step}", preset.name()));
    let initial = universe.trust_score();
    let (result, narrative) = match preset {
        ChaosPreset::GlassdoorAttack => {
            let mut current = universe.clone();
            for i in 0..GLASSDOOR_REVIEWS {
                let id = scripted_id(&current, preset, i);
                let signal = Signal::peer(id, GLASSDOOR_WEIGHT, at);
                current = engine.apply_signal(&current, signal, at, Some(audit(i).as_str()));
            }
            let narrative = format!(
                "{GLASSDOOR_REVIEWS} hostile peer reviews landed at once; \
                 trust went from {initial} to {}.",
                current.trust_score()
            );
            (current, narrative)
        }
        ChaosPreset::ZombieStartup => {
            let collapsed = engine.trust_collapse(universe, at, Some(audit(0).as_str()));
            let revived = engine.supervisor_override(
                &collapsed,
                ZOMBIE_WEAK_WEIGHT,
                at,
                Some(audit(1).as_str()),
            );
            let narrative = format!(
                "Trust collapsed from {initial} to {}, then a single weak supervisor signal \
                 left it shambling at {}.",
                collapsed.trust_score(),
                revived.trust_score()
            );
            (revived, narrative)
        }
        ChaosPreset::PerfectFraud => {
            let backdated = Signal::supervisor(
                scripted_id(universe, preset, 0),
                FRAUD_WEIGHT,
                at.saturating_sub(FRAUD_BACKDATE_DAYS * MS_PER_DAY),
            );
            let forged = engine.apply_signal(universe, backdated, at, Some(audit(0).as_str()));
            let echoed = engine.fake_consensus_injection(
                &forged,
                FRAUD_CONSENSUS,
                at,
                Some(audit(1).as_str()),
            );
            let narrative = format!(
                "A strong supervisor endorsement backdated {FRAUD_BACKDATE_DAYS} days, echoed by \
                 {FRAUD_CONSENSUS} fabricated peers, lifted trust from {initial} to {}.",
                echoed.trust_score()
            );
            (echoed, narrative)
        }
        ChaosPreset::MassLayoffShock => {
            let collected =
                engine.trust_debt_collection_event(universe, at, Some(audit(0).as_str()));
            let collapsed = engine.trust_collapse(&collected, at, Some(audit(1).as_str()));
            let narrative = format!(
                "Accrued trust debt was called in ({initial} to {}), then the organisation \
                 collapsed to {}.",
                collected.trust_score(),
                collapsed.trust_score()
            );
            (collapsed, narrative)
        }
        ChaosPreset::AiReferenceFlood => {
            let flooded = engine.fake_consensus_injection(
                universe,
                AI_FLOOD_COUNT,
                at,
                Some(audit(0).as_str()),
            );
            let narrative = format!(
                "{AI_FLOOD_COUNT} generated references arrived in one batch; trust moved from \
                 {initial} to {} with no new real evidence.",
                flooded.trust_score()
            );
            (flooded, narrative)
        }
    };

    let divergence_score = clamp_score(
        (f64::from(result.trust_score()) - f64::from(initial)).abs() / 100.0,
        0.0,
        1.0,
    );
    log::info!(
        "chaos: {} on {} finished with divergence {divergence_score:.2}",
        preset,
        universe.id
    );
    ChaosOutcome {
        preset,
        universes: vec![result],
        narrative,
        divergence_score,
    }
}
