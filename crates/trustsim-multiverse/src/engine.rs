// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Multiverse Engine
// ─────────────────────────────────────────────────────────────────────
//! Branching timelines over reducer state.
//!
//! Every operation borrows its input `Universe` and returns a new one.
//! Mutating actions append exactly one `TimelineEvent`; nothing rewrites
//! history. Scoring goes through `trustsim_core::apply_delta`, so a
//! universe's numbers always agree with the single-snapshot reducer.
//!
//! The only shared state is the audit log, guarded by a
//! `parking_lot::Mutex`, and the id sequence counter.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::json;

use trustsim_core::{apply_delta, compute_insights};
use trustsim_types::{
    ActionLabel, AuditEntry, Delta, EngineContext, EngineOutputs, KernelConfig, PhysicsProfile,
    Signal, Snapshot, SourceKind, Timeline, TimelineEvent, Timestamp, Universe,
};

use crate::metrics::compute_trust_debt_with;

/// Optional inputs to `create_universe`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Caller-supplied id; a fingerprint id is derived when `None`.
    pub id: Option<String>,
    /// Defaults to the kernel's default policy.
    pub physics: Option<PhysicsProfile>,
    /// Defaults to `Snapshot::zero(at)`.
    pub initial_state: Option<Snapshot>,
}

pub struct MultiverseEngine {
    config: KernelConfig,
    audit: Mutex<Vec<AuditEntry>>,
    sequence: AtomicU64,
}

impl Default for MultiverseEngine {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl MultiverseEngine {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            audit: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Copy of every audit entry recorded so far, in order.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.lock().clone()
    }

    pub fn audit_entries_for(&self, universe_id: &str) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .iter()
            .filter(|e| e.universe_id == universe_id)
            .cloned()
            .collect()
    }

    /// Drain every recorded entry, oldest first, leaving the log empty.
    pub fn drain_audit_log(&self) -> Vec<AuditEntry> {
        std::mem::take(&mut *self.audit.lock())
    }

    /// `<scope>:<n>` with `n` drawn from the engine's sequence, so two
    /// runs of the same script never share an audit id.
    pub fn next_audit_id(&self, scope: &str) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        format!("{scope}:{sequence}")
    }

    fn next_id(&self, label: &str, parent_id: Option<&str>, created_at: Timestamp) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut hasher = blake3::Hasher::new();
        hasher.update(label.as_bytes());
        hasher.update(&[0]);
        hasher.update(parent_id.unwrap_or("").as_bytes());
        hasher.update(&[0]);
        hasher.update(&created_at.to_le_bytes());
        hasher.update(&sequence.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        format!("u-{}", &hex[..16])
    }

    fn context(&self, universe: &Universe, at: Timestamp) -> EngineContext {
        EngineContext {
            policy: universe.physics.policy.clone(),
            now: at,
            human_factors_enabled: universe.physics.human_factors_enabled,
        }
    }

    fn transition(&self, universe: &Universe, delta: &Delta, at: Timestamp) -> Snapshot {
        apply_delta(&universe.trust_state, delta, &self.context(universe, at))
    }

    fn scripted_signal_id(universe: &Universe, action: ActionLabel, ordinal: usize) -> String {
        format!(
            "{}:{}:{}:{ordinal}",
            universe.id,
            action,
            universe.timeline.len()
        )
    }

    fn append(
        &self,
        universe: &Universe,
        state: Snapshot,
        action: ActionLabel,
        at: Timestamp,
        audit_id: Option<&str>,
        payload: serde_json::Value,
    ) -> Universe {
        let before = universe.trust_score();
        let after = state.trust_score;
        let event = TimelineEvent {
            at,
            state: state.clone(),
            action,
            audit_id: audit_id.map(str::to_string),
        };
        let next = Universe {
            timeline: universe.timeline.appended(event),
            trust_state: state,
            ..universe.clone()
        };
        if let Some(id) = audit_id {
            self.audit.lock().push(AuditEntry {
                id: id.to_string(),
                at,
                universe_id: universe.id.clone(),
                action,
                payload,
                outcome: format!("trust {before} -> {after}"),
            });
        }
        log::debug!(
            "multiverse: {} {} trust {} -> {} (timeline {})",
            universe.id,
            action,
            before,
            after,
            next.timeline.len()
        );
        next
    }

    // ── lifecycle ───────────────────────────────────────────────────

    pub fn create_universe(
        &self,
        label: &str,
        parent_id: Option<&str>,
        at: Timestamp,
        options: CreateOptions,
    ) -> Universe {
        let id = options
            .id
            .unwrap_or_else(|| self.next_id(label, parent_id, at));
        let physics = options.physics.unwrap_or_else(|| PhysicsProfile {
            policy: self.config.default_policy.clone(),
            human_factors_enabled: self.config.human_factors_enabled,
            ..PhysicsProfile::default()
        });
        let state = options.initial_state.unwrap_or_else(|| Snapshot::zero(at));
        log::info!("multiverse: created universe {id} ({label})");
        Universe {
            id,
            label: label.to_string(),
            physics,
            timeline: Timeline::new(TimelineEvent {
                at,
                state: state.clone(),
                action: ActionLabel::Init,
                audit_id: None,
            }),
            trust_state: state,
            created_at: at,
            parent_id: parent_id.map(str::to_string),
            forked_at: None,
        }
    }

    /// Branch from the latest event at or before `at_timestamp` (or the
    /// oldest event when none qualifies). The child shares the parent's
    /// prefix through that event and appends one `Fork` event.
    pub fn fork_universe_at(
        &self,
        universe: &Universe,
        at_timestamp: Timestamp,
        now: Timestamp,
    ) -> Universe {
        let index = universe
            .timeline
            .iter()
            .rposition(|e| e.at <= at_timestamp)
            .unwrap_or(0);
        let state = universe
            .timeline
            .get(index)
            .map_or_else(|| universe.trust_state.clone(), |e| e.state.clone());

        // A child must be strictly younger than its parent.
        let created_at = now.max(universe.created_at.saturating_add(1));
        let label = format!("{} (fork@{index})", universe.label);
        let id = self.next_id(&label, Some(&universe.id), created_at);
        let fork_event = TimelineEvent {
            at: created_at,
            state: state.clone(),
            action: ActionLabel::Fork,
            audit_id: None,
        };
        log::info!(
            "multiverse: forked {} from {} at event {index}",
            id,
            universe.id
        );
        Universe {
            id,
            label,
            physics: universe.physics.clone(),
            timeline: universe.timeline.prefix_through(index).appended(fork_event),
            trust_state: state,
            created_at,
            parent_id: Some(universe.id.clone()),
            forked_at: Some(at_timestamp),
        }
    }

    /// Fresh timeline with a single `Reset` event at the zero state.
    /// Identity, lineage and physics are preserved.
    pub fn reset_universe(
        &self,
        universe: &Universe,
        at: Timestamp,
        audit_id: Option<&str>,
    ) -> Universe {
        let state = Snapshot::zero(at);
        if let Some(id) = audit_id {
            self.audit.lock().push(AuditEntry {
                id: id.to_string(),
                at,
                universe_id: universe.id.clone(),
                action: ActionLabel::Reset,
                payload: json!({ "previous_timeline_len": universe.timeline.len() }),
                outcome: format!("trust {} -> 0", universe.trust_score()),
            });
        }
        log::info!("multiverse: reset universe {}", universe.id);
        Universe {
            timeline: Timeline::new(TimelineEvent {
                at,
                state: state.clone(),
                action: ActionLabel::Reset,
                audit_id: audit_id.map(str::to_string),
            }),
            trust_state: state,
            ..universe.clone()
        }
    }

    /// Point the current state at `timeline[index]` without touching the
    /// timeline. Out-of-range indices return an unchanged copy.
    pub fn time_travel_to(&self, universe: &Universe, index: usize) -> Universe {
        match universe.timeline.get(index) {
            Some(event) => Universe {
                trust_state: event.state.clone(),
                ..universe.clone()
            },
            None => {
                log::debug!(
                    "multiverse: time travel index {index} out of range for {} (len {})",
                    universe.id,
                    universe.timeline.len()
                );
                universe.clone()
            }
        }
    }

    // ── scripted actions ────────────────────────────────────────────

    pub fn apply_signal(
        &self,
        universe: &Universe,
        signal: Signal,
        at: Timestamp,
        audit_id: Option<&str>,
    ) -> Universe {
        let payload = json!({
            "signal_id": signal.id,
            "source": signal.source,
            "weight": signal.weight,
            "timestamp": signal.timestamp,
        });
        let state = self.transition(universe, &Delta::add(signal), at);
        self.append(universe, state, ActionLabel::Signal, at, audit_id, payload)
    }

    /// Drop every signal and zero every score.
    pub fn trust_collapse(
        &self,
        universe: &Universe,
        at: Timestamp,
        audit_id: Option<&str>,
    ) -> Universe {
        let mut state = Snapshot::zero(at);
        state.metadata = universe.trust_state.metadata.clone();
        state.engine_outputs = Some(EngineOutputs {
            human_factor_insights: compute_insights(&[], at),
            ..EngineOutputs::default()
        });
        let payload = json!({ "signals_dropped": universe.trust_state.signal_count() });
        self.append(
            universe,
            state,
            ActionLabel::TrustCollapse,
            at,
            audit_id,
            payload,
        )
    }

    /// Append `count` peer signals of the configured fake-consensus weight
    /// as one event.
    pub fn fake_consensus_injection(
        &self,
        universe: &Universe,
        count: usize,
        at: Timestamp,
        audit_id: Option<&str>,
    ) -> Universe {
        let weight = self.config.fake_consensus_weight;
        let signals: Vec<Signal> = (0..count)
            .map(|i| {
                Signal::new(
                    Self::scripted_signal_id(universe, ActionLabel::FakeConsensus, i),
                    SourceKind::Peer,
                    weight,
                    at,
                )
            })
            .collect();
        let state = self.transition(universe, &Delta::add_all(signals), at);
        let payload = json!({ "count": count, "weight": weight });
        self.append(
            universe,
            state,
            ActionLabel::FakeConsensus,
            at,
            audit_id,
            payload,
        )
    }

    pub fn supervisor_override(
        &self,
        universe: &Universe,
        weight: f64,
        at: Timestamp,
        audit_id: Option<&str>,
    ) -> Universe {
        let signal = Signal::new(
            Self::scripted_signal_id(universe, ActionLabel::SupervisorOverride, 0),
            SourceKind::Supervisor,
            weight,
            at,
        );
        let state = self.transition(universe, &Delta::add(signal), at);
        let payload = json!({ "weight": weight });
        self.append(
            universe,
            state,
            ActionLabel::SupervisorOverride,
            at,
            audit_id,
            payload,
        )
    }

    /// Subtract the timeline's accrued trust debt from the current score.
    pub fn trust_debt_collection_event(
        &self,
        universe: &Universe,
        at: Timestamp,
        audit_id: Option<&str>,
    ) -> Universe {
        let debt = compute_trust_debt_with(
            universe.timeline.as_slice(),
            self.config.debt_jump_threshold,
            self.config.debt_rate,
        );
        let collected = (f64::from(universe.trust_score()) - debt).max(0.0);
        let state = self.transition(universe, &Delta::empty().with_trust_override(collected), at);
        let payload = json!({ "debt": debt });
        self.append(
            universe,
            state,
            ActionLabel::DebtCollection,
            at,
            audit_id,
            payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustsim_types::MS_PER_DAY;

    fn engine() -> MultiverseEngine {
        MultiverseEngine::default()
    }

    fn seeded(engine: &MultiverseEngine) -> Universe {
        let u = engine.create_universe("root", None, 0, CreateOptions::default());
        let u = engine.apply_signal(&u, Signal::peer("p1", 1.0, 0), MS_PER_DAY, None);
        let u = engine.apply_signal(&u, Signal::peer("p2", 1.0, 0), 2 * MS_PER_DAY, None);
        engine.apply_signal(&u, Signal::supervisor("s1", 2.0, 0), 3 * MS_PER_DAY, None)
    }

    #[test]
    fn test_create_root() {
        let e = engine();
        let u = e.create_universe("root", None, 10, CreateOptions::default());
        assert!(u.is_root());
        assert_eq!(u.timeline.len(), 1);
        assert_eq!(u.timeline.first().unwrap().action, ActionLabel::Init);
        assert_eq!(u.created_at, 10);
        assert!(u.id.starts_with("u-"));
    }

    #[test]
    fn test_ids_unique_for_same_label() {
        let e = engine();
        let a = e.create_universe("same", None, 0, CreateOptions::default());
        let b = e.create_universe("same", None, 0, CreateOptions::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_caller_supplied_id() {
        let e = engine();
        let u = e.create_universe(
            "root",
            None,
            0,
            CreateOptions {
                id: Some("mine".into()),
                ..CreateOptions::default()
            },
        );
        assert_eq!(u.id, "mine");
    }

    #[test]
    fn test_apply_signal_matches_reducer() {
        let e = engine();
        let u = seeded(&e);
        // 1 + 1 + 2 * 1.5 = 5 → 50
        assert_eq!(u.trust_score(), 50);
        assert_eq!(u.timeline.len(), 4);
        assert_eq!(u.trust_scores(), vec![0, 10, 20, 50]);
    }

    #[test]
    fn test_fork_picks_latest_event_at_or_before() {
        let e = engine();
        let u = seeded(&e);
        let fork = e.fork_universe_at(&u, 2 * MS_PER_DAY, 10 * MS_PER_DAY);
        assert_eq!(fork.parent_id.as_deref(), Some(u.id.as_str()));
        assert_eq!(fork.trust_score(), 20);
        assert_eq!(fork.timeline.len(), 4);
        assert_eq!(fork.timeline.last().unwrap().action, ActionLabel::Fork);
        assert!(fork.created_at > u.created_at);
    }

    #[test]
    fn test_fork_before_history_uses_oldest() {
        let e = engine();
        let u = seeded(&e);
        let fork = e.fork_universe_at(&u, -1, MS_PER_DAY);
        assert_eq!(fork.trust_score(), 0);
        assert_eq!(fork.timeline.len(), 2);
    }

    #[test]
    fn test_fork_does_not_mutate_source() {
        let e = engine();
        let u = seeded(&e);
        let before = u.clone();
        let fork = e.fork_universe_at(&u, MS_PER_DAY, 10 * MS_PER_DAY);
        let _ = e.trust_collapse(&fork, 11 * MS_PER_DAY, None);
        assert_eq!(u, before);
    }

    #[test]
    fn test_reset_preserves_identity() {
        let e = engine();
        let u = seeded(&e);
        let reset = e.reset_universe(&u, 5 * MS_PER_DAY, Some("audit-reset"));
        assert_eq!(reset.id, u.id);
        assert_eq!(reset.physics, u.physics);
        assert_eq!(reset.timeline.len(), 1);
        assert_eq!(reset.timeline.first().unwrap().action, ActionLabel::Reset);
        assert_eq!(reset.trust_score(), 0);
        assert_eq!(e.audit_entries_for(&u.id).len(), 1);
    }

    #[test]
    fn test_time_travel() {
        let e = engine();
        let u = seeded(&e);
        let back = e.time_travel_to(&u, 1);
        assert_eq!(back.trust_state, u.timeline.get(1).unwrap().state);
        assert_eq!(back.timeline, u.timeline);
        let same = e.time_travel_to(&u, 99);
        assert_eq!(same, u);
    }

    #[test]
    fn test_collapse_zeroes_state() {
        let e = engine();
        let u = e.trust_collapse(&seeded(&e), 4 * MS_PER_DAY, Some("a1"));
        assert_eq!(u.trust_score(), 0);
        assert_eq!(u.trust_state.signal_count(), 0);
        let outputs = u.trust_state.engine_outputs.as_ref().unwrap();
        assert!(outputs.scores().iter().all(|&s| s == 0));
        let last = u.timeline.last().unwrap();
        assert_eq!(last.action, ActionLabel::TrustCollapse);
        assert_eq!(last.audit_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_fake_consensus() {
        let e = engine();
        let u = e.create_universe("root", None, 0, CreateOptions::default());
        let u = e.fake_consensus_injection(&u, 4, MS_PER_DAY, None);
        // 4 * 0.5 → 20
        assert_eq!(u.trust_score(), 20);
        assert_eq!(u.trust_state.signal_count(), 4);
        let again = e.fake_consensus_injection(&u, 4, MS_PER_DAY, None);
        assert_eq!(again.trust_state.signal_count(), 8);
    }

    #[test]
    fn test_supervisor_override() {
        let e = engine();
        let u = e.create_universe("root", None, 0, CreateOptions::default());
        let u = e.supervisor_override(&u, 2.0, MS_PER_DAY, None);
        assert_eq!(u.trust_score(), 30);
        assert_eq!(u.trust_state.signals[0].source, SourceKind::Supervisor);
    }

    #[test]
    fn test_debt_collection() {
        let e = engine();
        let u = seeded(&e);
        // rises 10, 10, 30 → debt 5
        let collected = e.trust_debt_collection_event(&u, 4 * MS_PER_DAY, Some("debt"));
        assert_eq!(collected.trust_score(), 45);
        assert_eq!(collected.trust_state.signal_count(), 3);
        let entry = &e.audit_log()[0];
        assert_eq!(entry.action, ActionLabel::DebtCollection);
        assert_eq!(entry.outcome, "trust 50 -> 45");
    }

    #[test]
    fn test_audit_only_when_id_supplied() {
        let e = engine();
        let u = seeded(&e);
        assert!(e.audit_log().is_empty());
        let _ = e.supervisor_override(&u, 1.0, 0, Some("x"));
        assert_eq!(e.audit_log().len(), 1);
    }

    #[test]
    fn test_drain_empties_log() {
        let e = engine();
        let u = seeded(&e);
        let u = e.trust_collapse(&u, 4 * MS_PER_DAY, Some("first"));
        let _ = e.supervisor_override(&u, 1.0, 5 * MS_PER_DAY, Some("second"));
        let drained = e.drain_audit_log();
        let ids: Vec<&str> = drained.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert!(e.audit_log().is_empty());
        assert!(e.drain_audit_log().is_empty());
    }

    #[test]
    fn test_next_audit_id_never_repeats() {
        let e = engine();
        let a = e.next_audit_id("chaos:zombie_startup:0");
        let b = e.next_audit_id("chaos:zombie_startup:0");
        assert_ne!(a, b);
        assert!(a.starts_with("chaos:zombie_startup:0:"));
    }

    #[test]
    fn test_fork_of_empty_timeline() {
        let e = engine();
        let u = Universe {
            timeline: Timeline::from(Vec::new()),
            ..seeded(&e)
        };
        let fork = e.fork_universe_at(&u, MS_PER_DAY, 10 * MS_PER_DAY);
        assert_eq!(fork.timeline.len(), 1);
        assert_eq!(fork.timeline.first().unwrap().action, ActionLabel::Fork);
        assert_eq!(fork.trust_state, u.trust_state);
        assert!(u.timeline.is_empty());
    }

    #[test]
    fn test_scripted_after_time_travel_builds_on_current_state() {
        let e = engine();
        let u = seeded(&e);
        let back = e.time_travel_to(&u, 1);
        let next = e.supervisor_override(&back, 1.0, 5 * MS_PER_DAY, None);
        // p1 (1.0) + override 1.0 * 1.5 → 25
        assert_eq!(next.trust_score(), 25);
        assert_eq!(next.timeline.len(), 5);
    }
}
