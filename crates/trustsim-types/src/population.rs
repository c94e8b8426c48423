// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Population Grouping
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::config::Policy;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    pub id: String,
    pub name: String,
    pub policy: Policy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub snapshot: Snapshot,
}

/// A pure grouping of employees under one employer's policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub employer: Employer,
    pub employees: Vec<Employee>,
}

impl Population {
    pub fn new(employer: Employer, employees: Vec<Employee>) -> Self {
        Self {
            employer,
            employees,
        }
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.employees.iter().map(|e| &e.snapshot)
    }
}
