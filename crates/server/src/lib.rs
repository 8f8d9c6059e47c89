//! Muster Server Edge
//!
//! The Server Edge mediates between gateway connections and the roster
//! store. It owns:
//! - Session management (connection ↔ identity binding)
//! - Claim and catalog validation
//! - Commit of granted requests into the roster
//! - Full-state broadcast fan-out after every committed mutation
//!
//! # Architecture
//!
//! The gateway performs all I/O. The server is invoked with one decoded
//! request at a time and returns delivery instructions ([`Outbound`]); it
//! never touches a socket. Every method takes `&mut self` and runs to
//! completion before the next request is processed, so all mutations are
//! atomic with respect to one another. First valid claim wins and losers
//! receive a private rejection, whatever order the gateway dispatches in.
//!
//! Seat ownership is keyed by identity, not by connection: a disconnect
//! leaves the assignment in place, and a later resume under the same
//! identity merely refreshes the stored connection pointer.

#![deny(unsafe_code)]

pub mod session;
pub mod validation;

use std::collections::HashMap;

use prost::Message;
use tracing::{debug, info, warn};

use muster_roster::{ConnectionId, Roster, Vessel, VesselId};
use muster_wire::{ClaimRejected, StateSnapshot};
use session::Session;
use validation::{CatalogError, ClaimDecision, check_catalog, check_claim};

// ============================================================================
// Default Fleet
// ============================================================================

/// Bridge stations every starter vessel offers.
const DEFAULT_STATIONS: [&str; 6] = [
    "Helm",
    "Weapons",
    "Engineering",
    "Science",
    "Communications",
    "Captain",
];

/// The two-vessel starter catalog used until an administrator replaces it.
pub fn default_fleet() -> Vec<Vessel> {
    let stations = || DEFAULT_STATIONS.iter().map(|s| (*s).to_string()).collect();
    vec![
        Vessel::new(1, "USS Artemis", stations()),
        Vessel::new(2, "USS Phoenix", stations()),
    ]
}

// ============================================================================
// Configuration
// ============================================================================

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Catalog the roster starts with.
    pub vessels: Vec<Vessel>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            vessels: default_fleet(),
        }
    }
}

// ============================================================================
// Delivery Instructions
// ============================================================================

/// A delivery instruction for the gateway.
///
/// Snapshot payloads are serialized exactly once per mutation, so every
/// observer receives byte-identical state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Deliver the encoded [`StateSnapshot`] to every attached connection.
    Broadcast { bytes: Vec<u8> },
    /// Deliver the encoded [`StateSnapshot`] to one connection (initial sync).
    Snapshot {
        connection: ConnectionId,
        bytes: Vec<u8>,
    },
    /// Deliver an encoded [`ClaimRejected`] to the requesting connection only.
    Rejection {
        connection: ConnectionId,
        bytes: Vec<u8>,
    },
}

// ============================================================================
// Server
// ============================================================================

/// Server state: the authoritative roster plus per-connection sessions.
pub struct Server {
    roster: Roster,
    sessions: HashMap<ConnectionId, Session>,
}

impl Server {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            roster: Roster::new(config.vessels),
            sessions: HashMap::new(),
        }
    }

    /// Read-only view of the authoritative roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Number of attached connections.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// All attached connection ids; the audience of a broadcast.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.sessions.keys().copied().collect()
    }

    // ========================================================================
    // Connection Lifecycle
    // ========================================================================

    /// Register a newly established connection.
    ///
    /// The new observer immediately receives the current state so its
    /// replica starts consistent.
    pub fn attach_connection(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        self.sessions.insert(connection, Session::new(connection));
        info!(connection, "client attached");

        vec![Outbound::Snapshot {
            connection,
            bytes: self.encode_snapshot(),
        }]
    }

    /// Handle gateway-signalled connection loss.
    ///
    /// The session is discarded but any assignment held under its identity
    /// stays: seat holds are cleared only by explicit release, catalog
    /// replacement, or administrative reset.
    pub fn detach_connection(&mut self, connection: ConnectionId) {
        let session = self.sessions.remove(&connection);

        if let Some(assignment) = self.roster.find_by_connection(connection) {
            info!(
                connection,
                identity = %assignment.identity,
                "client detached, assignment preserved"
            );
        } else {
            let identity = session.and_then(|s| s.identity).unwrap_or_default();
            debug!(connection, identity = %identity, "client detached");
        }
    }

    // ========================================================================
    // Session Identity Resolution
    // ========================================================================

    /// Bind `identity` to this connection, resuming any existing assignment.
    ///
    /// If an assignment exists under the identity, its connection pointer is
    /// refreshed and a broadcast follows so all observers see the session as
    /// still occupied. Otherwise the identity is merely noted for subsequent
    /// claims; that is not an error.
    pub fn resume_session(&mut self, connection: ConnectionId, identity: &str) -> Vec<Outbound> {
        if identity.trim().is_empty() {
            warn!(connection, "resume with blank identity ignored");
            return Vec::new();
        }

        if let Some(session) = self.sessions.get_mut(&connection) {
            session.bind_identity(identity);
        }

        if self.roster.rebind_connection(identity, connection) {
            info!(connection, identity, "session resumed");
            vec![self.broadcast()]
        } else {
            debug!(connection, identity, "identity noted, nothing to resume");
            Vec::new()
        }
    }

    // ========================================================================
    // Assignment Operations
    // ========================================================================

    /// Attempt to bind `identity` to `(vessel_id, position)`.
    ///
    /// On success the identity's prior seat (if any) is vacated in the same
    /// step and the new state is broadcast. On rejection nothing mutates and
    /// only the requesting connection is notified.
    pub fn claim_seat(
        &mut self,
        connection: ConnectionId,
        identity: &str,
        vessel_id: VesselId,
        position: &str,
    ) -> (ClaimDecision, Vec<Outbound>) {
        let decision = check_claim(&self.roster, identity, vessel_id, position);

        let outbound = match &decision {
            ClaimDecision::Granted => {
                if let Some(session) = self.sessions.get_mut(&connection) {
                    session.bind_identity(identity);
                }
                self.roster
                    .upsert_assignment(identity, vessel_id, position, connection);
                info!(connection, identity, vessel_id, position, "seat claimed");
                vec![self.broadcast()]
            }
            ClaimDecision::Rejected(reason) => {
                debug!(
                    connection,
                    identity,
                    vessel_id,
                    position,
                    ?reason,
                    "claim rejected"
                );
                vec![Outbound::Rejection {
                    connection,
                    bytes: ClaimRejected::new(*reason).encode_to_vec(),
                }]
            }
            ClaimDecision::DroppedMalformed => {
                warn!(connection, "malformed claim dropped");
                Vec::new()
            }
        };

        (decision, outbound)
    }

    /// Vacate whatever seat `identity` holds.
    ///
    /// Idempotent: releasing an identity with no seat is a silent no-op and
    /// produces no broadcast.
    pub fn release_seat(&mut self, identity: &str) -> Vec<Outbound> {
        match self.roster.remove_assignment(identity) {
            Some(assignment) => {
                info!(
                    identity,
                    vessel_id = assignment.vessel_id,
                    position = %assignment.position,
                    "seat released"
                );
                vec![self.broadcast()]
            }
            None => {
                debug!(identity, "release with no assignment, ignoring");
                Vec::new()
            }
        }
    }

    /// Replace the vessel catalog wholesale (administrative).
    ///
    /// Clears every assignment unconditionally: seat semantics are
    /// catalog-relative. Structurally invalid submissions are refused
    /// without touching the roster.
    pub fn replace_catalog(&mut self, vessels: Vec<Vessel>) -> Result<Vec<Outbound>, CatalogError> {
        check_catalog(&vessels).inspect_err(|error| {
            warn!(%error, "catalog submission refused");
        })?;

        let cleared = self.roster.assignment_count();
        self.roster.replace_vessels(vessels);
        info!(
            vessels = self.roster.vessel_count(),
            cleared_assignments = cleared,
            "catalog replaced"
        );

        Ok(vec![self.broadcast()])
    }

    /// Clear every assignment (administrative). Always broadcasts.
    pub fn reset_assignments(&mut self) -> Vec<Outbound> {
        let cleared = self.roster.assignment_count();
        self.roster.clear_assignments();
        info!(cleared_assignments = cleared, "all assignments reset");

        vec![self.broadcast()]
    }

    // ========================================================================
    // Broadcast Coordination
    // ========================================================================

    /// Serialize the current state once for delivery to every observer.
    fn broadcast(&self) -> Outbound {
        Outbound::Broadcast {
            bytes: self.encode_snapshot(),
        }
    }

    fn encode_snapshot(&self) -> Vec<u8> {
        StateSnapshot::from(self.roster.snapshot()).encode_to_vec()
    }
}

// ============================================================================
// Tests
// ============================================================================
