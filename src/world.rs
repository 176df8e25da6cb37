//! Seam between the session and whatever hosts the simulation.
//!
//! The session never touches physics or rendering directly. It reads
//! numbers out of a [`GameWorld`] and flips its switches; the daemon
//! supplies the real implementation.

use crate::protocol::Observation;

/// Host-side view of the running episode. All methods take `&self`;
/// implementations are shared with the frame loop and use interior
/// mutability.
pub trait GameWorld: Send + Sync {
    /// Snapshot the eight observation slots.
    fn observe(&self) -> Observation;

    /// Straight-line distance between ball and goal.
    fn distance_from_goal(&self) -> f32;

    /// Whether the ball currently sits in the goal.
    fn goal_reached(&self) -> bool;

    /// Raw human input axis, `-1..=1`.
    fn human_action(&self) -> f32;

    /// Agent action currently applied to the board.
    fn agent_action(&self) -> f32;

    /// Replace the applied agent action.
    fn apply_agent_action(&self, action: f32);

    /// Freeze or thaw the simulation. Frozen worlds ignore time.
    fn set_frozen(&self, frozen: bool);

    fn frozen(&self) -> bool;

    /// Show or hide the timed-out popup.
    fn set_timeout_indicator(&self, visible: bool);

    fn timeout_indicator(&self) -> bool;

    /// Put the episode back in its starting configuration.
    fn reset_episode(&self);
}

/// Map a degree reading onto `(-180, 180]`, so a board tilted just past
/// level reads as a small negative angle instead of a value near 360.
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_angles_pass_through() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(90.0), 90.0);
        assert_eq!(normalize_angle(180.0), 180.0);
    }

    #[test]
    fn reflex_angles_turn_negative() {
        assert_eq!(normalize_angle(350.0), -10.0);
        assert_eq!(normalize_angle(181.0), -179.0);
    }

    #[test]
    fn out_of_range_inputs_wrap_first() {
        assert_eq!(normalize_angle(360.0), 0.0);
        assert_eq!(normalize_angle(-90.0), -90.0);
        assert_eq!(normalize_angle(725.0), 5.0);
    }
}
