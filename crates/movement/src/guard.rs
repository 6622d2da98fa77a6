//! Authority guard for dash requests.
//!
//! Runs every tick on every peer, before mode transitions. The cooldown
//! check only bites on the authority evaluating a character it does not
//! control; everywhere else an eligible request simply executes.

use crate::character::{CharacterId, Role};
use crate::state::CooldownTimer;

/// Log target for security-relevant warnings.
pub const SECURITY_TARGET: &str = "slipstride::security";

/// What to do with the dash request this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashVerdict {
    /// No dash requested.
    Idle,
    /// Requested while ineligible. Drop the request.
    Cleared,
    /// Perform the dash.
    Perform,
    /// Eligible, but faster than the authoritative cooldown allows.
    Rejected,
}

/// Decide on a dash request.
///
/// `authority_cooldown` must have strictly elapsed since the last dash for
/// a remote character's request to pass.
pub fn evaluate_dash(
    character: CharacterId,
    role: Role,
    wants_dash: bool,
    can_dash: bool,
    cooldown: &CooldownTimer,
    authority_cooldown: f32,
    now: f64,
) -> DashVerdict {
    if !wants_dash {
        return DashVerdict::Idle;
    }
    if !can_dash {
        return DashVerdict::Cleared;
    }

    let cooldown_elapsed = cooldown
        .elapsed(now)
        .map_or(true, |elapsed| elapsed > f64::from(authority_cooldown));

    if role.is_remote_authority() && !cooldown_elapsed {
        log::warn!(
            target: SECURITY_TARGET,
            "character {character} requested a dash {:.3}s after the last one (authoritative cooldown {authority_cooldown}s)",
            cooldown.elapsed(now).unwrap_or_default()
        );
        return DashVerdict::Rejected;
    }

    DashVerdict::Perform
}
