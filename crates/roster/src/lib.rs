//! Muster Roster Store
//!
//! This crate contains the authoritative seat-assignment state: the vessel
//! catalog and the identity-keyed assignment table. It is the single source
//! of truth; every client-side copy is a disposable cache rebuilt from each
//! broadcast.
//!
//! # Architecture Constraints
//!
//! The Roster Store MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Validate requests (that is the assignment engine's job)
//! - Know anything about connections beyond an opaque handle
//!
//! It enforces structural invariants only: the assignment table is keyed by
//! identity, so at most one assignment can ever exist per identity, and
//! `replace_vessels` clears every assignment atomically because seat
//! identities are not stable across a catalog edit.

#![deny(unsafe_code)]

use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique, stable identifier for a vessel in the catalog.
pub type VesselId = u32;

/// Opaque handle to a gateway connection.
///
/// A non-owning, best-effort back-reference used only to route private
/// notices and to recognize reconnection. Its staleness never invalidates
/// an assignment.
pub type ConnectionId = u64;

// ============================================================================
// Core Types
// ============================================================================

/// A named vessel and its ordered list of role labels.
///
/// Created or replaced wholesale by an administrative catalog update; never
/// partially patched. Duplicate position labels within a vessel are permitted
/// but not meaningfully distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vessel {
    pub id: VesselId,
    pub name: String,
    pub positions: Vec<String>,
}

impl Vessel {
    pub fn new(id: VesselId, name: impl Into<String>, positions: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            positions,
        }
    }
}

/// A single identity's hold on a seat.
///
/// `identity` is the durable ownership key; `connection` is volatile and
/// refreshed on reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub identity: String,
    pub vessel_id: VesselId,
    pub position: String,
    pub connection: ConnectionId,
}

impl Assignment {
    /// True if this assignment occupies the given seat.
    pub fn holds_seat(&self, vessel_id: VesselId, position: &str) -> bool {
        self.vessel_id == vessel_id && self.position == position
    }
}

/// Read-only copy of the full roster state, as delivered to observers.
///
/// Assignments are ordered by identity ascending so that two snapshots of
/// the same state always serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub vessels: Vec<Vessel>,
    pub assignments: Vec<Assignment>,
}

// ============================================================================
// Roster Implementation
// ============================================================================

/// The authoritative roster state container.
///
/// Exclusively owned by the server process; all mutation is routed through
/// the assignment engine, one request at a time.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// Vessel catalog, in administrative order.
    vessels: Vec<Vessel>,
    /// Assignment table keyed by identity.
    assignments: HashMap<String, Assignment>,
}

impl Roster {
    /// Create a roster with the given starting catalog and no assignments.
    pub fn new(vessels: Vec<Vessel>) -> Self {
        Self {
            vessels,
            assignments: HashMap::new(),
        }
    }

    /// Current vessel catalog.
    pub fn vessels(&self) -> &[Vessel] {
        &self.vessels
    }

    /// Whether a vessel with this id exists in the catalog.
    pub fn has_vessel(&self, id: VesselId) -> bool {
        self.vessels.iter().any(|v| v.id == id)
    }

    /// Number of vessels in the catalog.
    pub fn vessel_count(&self) -> usize {
        self.vessels.len()
    }

    /// Number of live assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// The assignment held by `identity`, if any.
    pub fn assignment_for(&self, identity: &str) -> Option<&Assignment> {
        self.assignments.get(identity)
    }

    /// The assignment occupying `(vessel_id, position)`, if any.
    pub fn seat_holder(&self, vessel_id: VesselId, position: &str) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|a| a.holds_seat(vessel_id, position))
    }

    /// Reverse lookup: the assignment whose volatile connection pointer
    /// currently equals `connection`.
    pub fn find_by_connection(&self, connection: ConnectionId) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|a| a.connection == connection)
    }

    /// Replace the vessel catalog wholesale.
    ///
    /// Clears all assignments atomically: seat semantics are catalog-relative
    /// and cannot be safely carried over.
    pub fn replace_vessels(&mut self, vessels: Vec<Vessel>) {
        self.vessels = vessels;
        self.assignments.clear();
    }

    /// Insert or replace the assignment for `identity`.
    ///
    /// Any prior assignment held by this identity is displaced (an identity
    /// holds at most one seat across the whole fleet).
    pub fn upsert_assignment(
        &mut self,
        identity: impl Into<String>,
        vessel_id: VesselId,
        position: impl Into<String>,
        connection: ConnectionId,
    ) {
        let identity = identity.into();
        let assignment = Assignment {
            identity: identity.clone(),
            vessel_id,
            position: position.into(),
            connection,
        };
        self.assignments.insert(identity, assignment);
    }

    /// Remove the assignment for `identity`, returning it if present.
    pub fn remove_assignment(&mut self, identity: &str) -> Option<Assignment> {
        self.assignments.remove(identity)
    }

    /// Remove every assignment, leaving the catalog untouched.
    pub fn clear_assignments(&mut self) {
        self.assignments.clear();
    }

    /// Refresh the volatile connection pointer for `identity`.
    ///
    /// Returns true if an assignment existed and was rebound. The assignment
    /// itself is otherwise untouched.
    pub fn rebind_connection(&mut self, identity: &str, connection: ConnectionId) -> bool {
        match self.assignments.get_mut(identity) {
            Some(assignment) => {
                assignment.connection = connection;
                true
            }
            None => false,
        }
    }

    /// Produce the observer-facing snapshot of the current state.
    ///
    /// Assignments are sorted by identity ascending for deterministic
    /// serialization.
    pub fn snapshot(&self) -> RosterSnapshot {
        let mut assignments: Vec<Assignment> = self.assignments.values().cloned().collect();
        assignments.sort_by(|a, b| a.identity.cmp(&b.identity));

        RosterSnapshot {
            vessels: self.vessels.clone(),
            assignments,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_vessel_catalog() -> Vec<Vessel> {
        vec![
            Vessel::new(1, "USS Artemis", vec!["Helm".into(), "Weapons".into()]),
            Vessel::new(2, "USS Phoenix", vec!["Helm".into(), "Captain".into()]),
        ]
    }

    #[test]
    fn test_new_roster_has_no_assignments() {
        let roster = Roster::new(two_vessel_catalog());
        assert_eq!(roster.vessel_count(), 2);
        assert_eq!(roster.assignment_count(), 0);
    }

    #[test]
    fn test_upsert_is_keyed_by_identity() {
        let mut roster = Roster::new(two_vessel_catalog());

        roster.upsert_assignment("Kirk", 1, "Helm", 10);
        roster.upsert_assignment("Kirk", 2, "Captain", 10);

        // One identity, one assignment: the second upsert displaced the first.
        assert_eq!(roster.assignment_count(), 1);
        let assignment = roster.assignment_for("Kirk").unwrap();
        assert!(assignment.holds_seat(2, "Captain"));
        assert!(roster.seat_holder(1, "Helm").is_none());
    }

    #[test]
    fn test_seat_holder_lookup() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Spock", 1, "Weapons", 7);

        let holder = roster.seat_holder(1, "Weapons").unwrap();
        assert_eq!(holder.identity, "Spock");
        assert!(roster.seat_holder(1, "Helm").is_none());
        assert!(roster.seat_holder(2, "Weapons").is_none());
    }

    #[test]
    fn test_replace_vessels_clears_assignments() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Kirk", 1, "Helm", 10);
        roster.upsert_assignment("Spock", 1, "Weapons", 11);

        roster.replace_vessels(vec![Vessel::new(5, "USS Vega", vec!["Helm".into()])]);

        assert_eq!(roster.assignment_count(), 0);
        assert_eq!(roster.vessel_count(), 1);
        assert!(roster.has_vessel(5));
        assert!(!roster.has_vessel(1));
    }

    #[test]
    fn test_remove_assignment_is_idempotent() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Kirk", 1, "Helm", 10);

        assert!(roster.remove_assignment("Kirk").is_some());
        assert!(roster.remove_assignment("Kirk").is_none());
        assert_eq!(roster.assignment_count(), 0);
    }

    #[test]
    fn test_rebind_connection_preserves_seat() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Kirk", 1, "Helm", 10);

        assert!(roster.rebind_connection("Kirk", 99));

        let assignment = roster.assignment_for("Kirk").unwrap();
        assert!(assignment.holds_seat(1, "Helm"));
        assert_eq!(assignment.connection, 99);
    }

    #[test]
    fn test_rebind_unknown_identity_is_noop() {
        let mut roster = Roster::new(two_vessel_catalog());
        assert!(!roster.rebind_connection("Kirk", 99));
        assert_eq!(roster.assignment_count(), 0);
    }

    #[test]
    fn test_find_by_connection() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Kirk", 1, "Helm", 10);
        roster.upsert_assignment("Spock", 1, "Weapons", 11);

        assert_eq!(roster.find_by_connection(11).unwrap().identity, "Spock");
        assert!(roster.find_by_connection(42).is_none());
    }

    #[test]
    fn test_snapshot_orders_assignments_by_identity() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Uhura", 2, "Captain", 12);
        roster.upsert_assignment("Kirk", 1, "Helm", 10);
        roster.upsert_assignment("Spock", 1, "Weapons", 11);

        let snapshot = roster.snapshot();
        let order: Vec<&str> = snapshot
            .assignments
            .iter()
            .map(|a| a.identity.as_str())
            .collect();
        assert_eq!(order, vec!["Kirk", "Spock", "Uhura"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut roster = Roster::new(two_vessel_catalog());
        roster.upsert_assignment("Kirk", 1, "Helm", 10);

        let snapshot = roster.snapshot();
        roster.clear_assignments();

        // The snapshot is a disposable copy, not a view of live state.
        assert_eq!(snapshot.assignments.len(), 1);
        assert_eq!(roster.assignment_count(), 0);
    }
}
