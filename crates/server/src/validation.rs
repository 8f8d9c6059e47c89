//! Claim and catalog validation.
//!
//! Pure decision logic over a read-only roster view. Nothing here mutates
//! state; the caller commits (or refuses to commit) based on the returned
//! decision.
//!
//! Rules:
//! - Blank identity or position: DROP + LOG (should-not-happen path)
//! - Vessel absent from catalog: REJECT `UnknownVessel`
//! - Seat held by a different identity: REJECT `SeatTaken`
//! - Reclaiming or moving one's own seat: GRANT (seat-move semantics)

use muster_roster::{Roster, VesselId};
use muster_wire::RejectReason;
use thiserror::Error;

// ============================================================================
// Claim Decisions
// ============================================================================

/// Outcome of evaluating a seat claim against the current roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimDecision {
    /// Claim may be committed; a broadcast follows.
    Granted,
    /// Claim refused; the requester receives a private rejection notice and
    /// the roster is left untouched.
    Rejected(RejectReason),
    /// Malformed request (blank identity or position). Ignored entirely:
    /// no mutation, no reply. Upstream collaborators filter these before
    /// they reach the engine.
    DroppedMalformed,
}

impl ClaimDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Evaluate a seat claim.
///
/// A seat is refused only when a *different* identity already holds it; a
/// player reclaiming or moving from their own seat is always granted.
pub fn check_claim(
    roster: &Roster,
    identity: &str,
    vessel_id: VesselId,
    position: &str,
) -> ClaimDecision {
    if identity.trim().is_empty() || position.trim().is_empty() {
        return ClaimDecision::DroppedMalformed;
    }

    if !roster.has_vessel(vessel_id) {
        return ClaimDecision::Rejected(RejectReason::UnknownVessel);
    }

    match roster.seat_holder(vessel_id, position) {
        Some(holder) if holder.identity != identity => {
            ClaimDecision::Rejected(RejectReason::SeatTaken)
        }
        _ => ClaimDecision::Granted,
    }
}

// ============================================================================
// Catalog Validation
// ============================================================================

/// Structural defects in an administrative catalog submission.
///
/// The administrative collaborator validates before invoking the engine;
/// these checks exist so a bad submission degrades to "refused" rather than
/// corrupting the roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog must contain at least one vessel")]
    EmptyCatalog,

    #[error("vessel at index {index} has a blank name")]
    BlankVesselName { index: usize },

    #[error("vessel {name:?} has no positions")]
    NoPositions { name: String },

    #[error("vessel {name:?} has a blank position label")]
    BlankPosition { name: String },

    #[error("vessel id {id} appears more than once")]
    DuplicateVesselId { id: VesselId },
}

/// Check an incoming catalog for structural validity.
pub fn check_catalog(vessels: &[muster_roster::Vessel]) -> Result<(), CatalogError> {
    if vessels.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }

    let mut seen = std::collections::HashSet::new();
    for (index, vessel) in vessels.iter().enumerate() {
        if vessel.name.trim().is_empty() {
            return Err(CatalogError::BlankVesselName { index });
        }
        if vessel.positions.is_empty() {
            return Err(CatalogError::NoPositions {
                name: vessel.name.clone(),
            });
        }
        if vessel.positions.iter().any(|p| p.trim().is_empty()) {
            return Err(CatalogError::BlankPosition {
                name: vessel.name.clone(),
            });
        }
        if !seen.insert(vessel.id) {
            return Err(CatalogError::DuplicateVesselId { id: vessel.id });
        }
    }

    Ok(())
}
