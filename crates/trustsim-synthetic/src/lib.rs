// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Synthetic Populations
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Seeded, reproducible fake employees for load and what-if testing.

pub mod generator;
pub mod rng;

pub use generator::{
    EmployeeParams, EmployerParams, SourceMix, SyntheticGenerator, MAX_BULK_COUNT,
    MIN_BULK_COUNT, TRUST_TOLERANCE,
};
pub use rng::SimpleRng;
