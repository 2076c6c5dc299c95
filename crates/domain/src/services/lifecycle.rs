//! Battery lifecycle engine.
//!
//! The repair lifecycle is a fixed state machine. Which statuses a battery
//! may move to next is a function of its current status only, and which
//! roles may perform a move is a function of the current status only (never
//! the target). Both tables live here as pure lookups so handlers, tests
//! and reports all consult the same source of truth.
//!
//! This module performs no I/O. [`attempt_transition`] returns a new record
//! value; callers decide whether and how to persist it.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::battery::{BatteryRecord, BatteryStatus, StatusEntry};
use crate::models::user::{StaffRole, User};

/// Why a requested transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The target is not reachable from the current status. Self-transitions
    /// always land here since no status lists itself as a successor.
    #[error("cannot move battery from '{from}' to '{to}'")]
    InvalidTransition {
        from: BatteryStatus,
        to: BatteryStatus,
    },

    /// The acting user's role may not move batteries out of the current
    /// status, even though the target itself is reachable.
    #[error("role '{role}' may not update a battery in status '{status}'")]
    Unauthorized {
        role: StaffRole,
        status: BatteryStatus,
    },
}

/// Statuses reachable in one step from `status`.
///
/// Terminal statuses (`Delivered`, `Cancelled`) return an empty slice. No
/// status ever appears in its own successor set.
pub fn allowed_next(status: BatteryStatus) -> &'static [BatteryStatus] {
    use BatteryStatus::*;

    match status {
        Inward => &[Assigned, Cancelled, OnHold],
        Assigned => &[InProgress, OnHold, Cancelled],
        InProgress => &[Completed, RequiresApproval, OnHold, Cancelled],
        Completed => &[QualityCheck, ReadyForDelivery],
        QualityCheck => &[ReadyForDelivery, InProgress],
        ReadyForDelivery => &[Delivered],
        OnHold => &[Assigned, InProgress, Cancelled],
        RequiresApproval => &[InProgress, Cancelled],
        Delivered => &[],
        Cancelled => &[],
    }
}

/// Roles permitted to move a battery out of `status`.
///
/// Technicians may only act while a battery is on the bench (`InProgress`
/// or `Completed`); every other stage belongs to the front desk.
pub fn permitted_roles(status: BatteryStatus) -> &'static [StaffRole] {
    use BatteryStatus::*;

    const FRONT_DESK: &[StaffRole] = &[StaffRole::Admin, StaffRole::Staff];
    const BENCH: &[StaffRole] = &[StaffRole::Admin, StaffRole::Staff, StaffRole::Technician];

    match status {
        Inward | Assigned => FRONT_DESK,
        InProgress | Completed => BENCH,
        QualityCheck | ReadyForDelivery | Delivered | Cancelled | OnHold | RequiresApproval => {
            FRONT_DESK
        }
    }
}

/// Attempts to move `record` to `target` on behalf of `acting_user`.
///
/// Checks run in a fixed order: transition legality first, then role
/// authorization. On success the returned record carries the new status,
/// a refreshed `updated_at`, and exactly one history entry appended; the
/// input record is not modified.
pub fn attempt_transition(
    record: &BatteryRecord,
    target: BatteryStatus,
    acting_user: &User,
    note: Option<String>,
    location: Option<String>,
    now: DateTime<Utc>,
) -> Result<BatteryRecord, TransitionError> {
    if !allowed_next(record.status).contains(&target) {
        return Err(TransitionError::InvalidTransition {
            from: record.status,
            to: target,
        });
    }

    if !permitted_roles(record.status).contains(&acting_user.role) {
        return Err(TransitionError::Unauthorized {
            role: acting_user.role,
            status: record.status,
        });
    }

    let mut updated = record.clone();
    updated.status = target;
    updated.updated_at = now;
    updated.status_history.push(StatusEntry {
        status: target,
        timestamp: now,
        updated_by: acting_user.id,
        updated_by_name: acting_user.full_name.clone(),
        notes: note,
        location,
    });

    Ok(updated)
}
