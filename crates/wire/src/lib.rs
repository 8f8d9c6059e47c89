//! Muster Wire Protocol Types
//!
//! This crate defines the shared Protobuf message types exchanged between
//! clients and the server over the gateway's reliable, ordered event channel.
//! Both client and server binaries depend on this crate so the schema cannot
//! fork.
//!
//! # Message Categories
//!
//! - **Requests** (client → server): seat claims, releases, session resume,
//!   administrative catalog updates and resets.
//! - **Events** (server → client): full-state snapshots broadcast after every
//!   committed mutation, and private claim rejections.
//!
//! Assignments carry no connection handle on the wire: the handle is a
//! volatile server-internal back-reference, never part of the observable
//! state.

#![deny(unsafe_code)]

use prost::Message;

use muster_roster::{Assignment, RosterSnapshot, Vessel, VesselId};

// ============================================================================
// Requests (client → server)
// ============================================================================

/// Request to bind an identity to a seat.
#[derive(Clone, PartialEq, Message)]
pub struct ClaimSeat {
    /// Durable player-supplied name; the ownership key.
    #[prost(string, tag = "1")]
    pub identity: String,

    /// Vessel the requested seat belongs to.
    #[prost(uint32, tag = "2")]
    pub vessel_id: VesselId,

    /// Role label of the requested seat.
    #[prost(string, tag = "3")]
    pub position: String,
}

/// Request to vacate whatever seat `identity` currently holds.
///
/// Idempotent: releasing an identity that holds nothing is a silent no-op.
#[derive(Clone, PartialEq, Message)]
pub struct ReleaseSeat {
    #[prost(string, tag = "1")]
    pub identity: String,
}

/// Announce that a connection is resuming a previously known identity.
///
/// If an assignment exists under that identity, its connection pointer is
/// refreshed; otherwise the identity is merely noted for subsequent claims.
#[derive(Clone, PartialEq, Message)]
pub struct ResumeSession {
    #[prost(string, tag = "1")]
    pub identity: String,
}

/// Administrative request replacing the vessel catalog wholesale.
///
/// Committing this clears every assignment.
#[derive(Clone, PartialEq, Message)]
pub struct ReplaceCatalog {
    #[prost(message, repeated, tag = "1")]
    pub vessels: Vec<VesselProto>,
}

/// Administrative request clearing every assignment.
#[derive(Clone, PartialEq, Message)]
pub struct ResetAssignments {}

// ============================================================================
// Events (server → client)
// ============================================================================

/// Full replacement of the roster state, broadcast to every observer after
/// each committed mutation and sent once to each newly attached connection.
#[derive(Clone, PartialEq, Message)]
pub struct StateSnapshot {
    /// Vessel catalog in administrative order.
    #[prost(message, repeated, tag = "1")]
    pub vessels: Vec<VesselProto>,

    /// Live assignments, ordered by identity ascending.
    #[prost(message, repeated, tag = "2")]
    pub assignments: Vec<AssignmentProto>,
}

/// Private notice that a claim was not committed, sent only to the
/// requesting connection.
#[derive(Clone, PartialEq, Message)]
pub struct ClaimRejected {
    #[prost(int32, tag = "1")]
    pub reason: i32,
}

/// Why a claim was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ::prost::Enumeration)]
#[repr(i32)]
pub enum RejectReason {
    /// The seat is held by a different identity.
    SeatTaken = 0,
    /// The requested vessel is not in the current catalog.
    UnknownVessel = 1,
}

impl ClaimRejected {
    pub fn new(reason: RejectReason) -> Self {
        Self {
            reason: reason as i32,
        }
    }

    pub fn reason(&self) -> Option<RejectReason> {
        RejectReason::try_from(self.reason).ok()
    }
}

// ============================================================================
// Embedded Types
// ============================================================================

/// A vessel and its seat definitions as carried on the wire.
#[derive(Clone, PartialEq, Message)]
pub struct VesselProto {
    #[prost(uint32, tag = "1")]
    pub id: VesselId,

    #[prost(string, tag = "2")]
    pub name: String,

    /// Ordered role labels for this vessel.
    #[prost(string, repeated, tag = "3")]
    pub positions: Vec<String>,
}

/// An identity's seat hold as carried on the wire.
#[derive(Clone, PartialEq, Message)]
pub struct AssignmentProto {
    #[prost(string, tag = "1")]
    pub identity: String,

    #[prost(uint32, tag = "2")]
    pub vessel_id: VesselId,

    #[prost(string, tag = "3")]
    pub position: String,
}

// ============================================================================
// Conversion Traits
// ============================================================================

impl From<Vessel> for VesselProto {
    fn from(v: Vessel) -> Self {
        Self {
            id: v.id,
            name: v.name,
            positions: v.positions,
        }
    }
}

impl TryFrom<VesselProto> for Vessel {
    type Error = &'static str;

    fn try_from(v: VesselProto) -> Result<Self, Self::Error> {
        if v.name.trim().is_empty() {
            return Err("vessel name must not be blank");
        }
        if v.positions.is_empty() {
            return Err("vessel must define at least one position");
        }
        Ok(Self {
            id: v.id,
            name: v.name,
            positions: v.positions,
        })
    }
}

impl From<Assignment> for AssignmentProto {
    fn from(a: Assignment) -> Self {
        Self {
            identity: a.identity,
            vessel_id: a.vessel_id,
            position: a.position,
        }
    }
}

impl From<RosterSnapshot> for StateSnapshot {
    fn from(s: RosterSnapshot) -> Self {
        Self {
            vessels: s.vessels.into_iter().map(Into::into).collect(),
            assignments: s.assignments.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_seat_roundtrip() {
        let msg = ClaimSeat {
            identity: "Kirk".to_string(),
            vessel_id: 1,
            position: "Helm".to_string(),
        };
        let encoded = msg.encode_to_vec();
        let decoded = ClaimSeat::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let msg = StateSnapshot {
            vessels: vec![VesselProto {
                id: 1,
                name: "USS Artemis".to_string(),
                positions: vec!["Helm".to_string(), "Weapons".to_string()],
            }],
            assignments: vec![AssignmentProto {
                identity: "Kirk".to_string(),
                vessel_id: 1,
                position: "Helm".to_string(),
            }],
        };
        let encoded = msg.encode_to_vec();
        let decoded = StateSnapshot::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_claim_rejected_reason() {
        let msg = ClaimRejected::new(RejectReason::SeatTaken);
        let decoded = ClaimRejected::decode(msg.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.reason(), Some(RejectReason::SeatTaken));

        let msg = ClaimRejected::new(RejectReason::UnknownVessel);
        let decoded = ClaimRejected::decode(msg.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.reason(), Some(RejectReason::UnknownVessel));
    }

    #[test]
    fn test_vessel_conversion_rejects_blank_name() {
        let proto = VesselProto {
            id: 1,
            name: "   ".to_string(),
            positions: vec!["Helm".to_string()],
        };
        assert!(Vessel::try_from(proto).is_err());
    }

    #[test]
    fn test_vessel_conversion_rejects_empty_positions() {
        let proto = VesselProto {
            id: 1,
            name: "USS Artemis".to_string(),
            positions: vec![],
        };
        assert!(Vessel::try_from(proto).is_err());
    }

    #[test]
    fn test_assignment_omits_connection_handle() {
        let assignment = Assignment {
            identity: "Kirk".to_string(),
            vessel_id: 1,
            position: "Helm".to_string(),
            connection: 42,
        };
        let proto: AssignmentProto = assignment.into();

        // Only durable fields cross the wire.
        assert_eq!(proto.identity, "Kirk");
        assert_eq!(proto.vessel_id, 1);
        assert_eq!(proto.position, "Helm");
    }
}
