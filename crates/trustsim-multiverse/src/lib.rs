// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Multiverse
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Branching timelines over reducer state.
//!
//! A `Universe` is a snapshot history. `MultiverseEngine` forks, resets,
//! rewinds and mutates universes by returning new values; the chaos
//! presets and the analysis functions are built purely from those
//! operations.
//!
//! # Invariants
//!
//! 1. A timeline is only ever appended to.
//! 2. Forking never mutates the source universe.
//! 3. A fork's `created_at` is strictly after its parent's.

pub mod analysis;
pub mod chaos;
pub mod engine;
pub mod metrics;

pub use analysis::{
    autopsy, break_the_multiverse, counterfactual, AutopsyReport, BreakReport,
    CounterfactualReport, ALTERNATIVE_INTERVENTIONS,
};
pub use chaos::{run_preset, ChaosOutcome, ChaosPreset};
pub use engine::{CreateOptions, MultiverseEngine};
pub use metrics::{
    compute_fragility, compute_trust_debt, compute_trust_debt_with, diff_universes, summarize,
    UniverseDiff, UniverseSummary,
};
