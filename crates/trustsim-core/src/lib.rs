// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Scoring engines, human-factor proxies, the reducer, and the
//! population engine.
//!
//! # Invariants
//!
//! 1. **Every transition runs all seven engines**: the reducer has no
//!    conditional path that leaves an `EngineOutputs` field unset.
//!
//! 2. **Bounded outputs**: every score is an integer on [0, 100]. NaN
//!    and Inf inputs are substituted (and logged), never propagated.
//!
//! 3. **Deterministic**: no wall clock, no entropy. The per-signal noise
//!    term is a hash of `(timestamp, index)` scaled by the declared
//!    human-error rate, so replaying the same deltas with the same
//!    contexts reproduces bit-identical outputs.

pub mod engines;
pub mod human_factor;
pub mod population;
pub mod reducer;

pub use human_factor::compute_insights;
pub use population::{analyze, analyze_population, analyze_with, PopulationMetrics};
pub use reducer::{apply_delta, replay};
