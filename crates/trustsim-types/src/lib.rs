// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Value types, configuration, and error hierarchy for the Trust
//! Simulation Kernel.
//!
//! Everything here is plain data. Behaviour lives in `trustsim-core`
//! (engines, reducer, population) and `trustsim-multiverse`
//! (branching timelines).

pub mod config;
pub mod error;
pub mod population;
pub mod score;
pub mod signal;
pub mod snapshot;
pub mod universe;

pub use config::{EngineContext, KernelConfig, Policy};
pub use error::{TrustSimError, TrustSimResult};
pub use population::{Employee, Employer, Population};
pub use score::{
    clamp_score, finite_or, to_score, EngineOutputs, HumanFactorInsights, HumanFactorModifiers,
    ProxyMeasurement,
};
pub use signal::{Signal, SourceKind, Timestamp, MS_PER_DAY};
pub use snapshot::{Delta, IntentModifiers, Snapshot};
pub use universe::{ActionLabel, AuditEntry, PhysicsProfile, Timeline, TimelineEvent, Universe};
