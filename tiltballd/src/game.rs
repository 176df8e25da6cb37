//! Ball-and-goal board simulation for the daemon.
//!
//! Stands in for the engine scene: a ball rolls on a tilting board,
//! the agent steers one axis and the human the other, and reaching the
//! goal latches a flag the session turns into a `done` report. Shared
//! between the frame task and the session task, so all mutation goes
//! through interior mutability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tiltball::config::SessionConfig;
use tiltball::protocol::Observation;
use tiltball::world::{normalize_angle, GameWorld};
use tracing::info;

const BOARD_HALF_EXTENT: f32 = 4.0;
const BALL_START: [f32; 2] = [0.0, -3.0];
const GOAL_POSITION: [f32; 2] = [0.0, 3.0];
const GOAL_RADIUS: f32 = 0.45;
/// First-order lag rate pulling the ball toward the commanded speed.
const STEER_RESPONSE: f32 = 6.0;
const MAX_TILT_DEGREES: f32 = 18.0;

/// Board state, positions and velocities as `[x, z]` pairs, tilt in
/// degrees stored engine-style in `[0, 360)`.
#[derive(Debug, Clone, Copy)]
struct BallState {
    position: [f32; 2],
    velocity: [f32; 2],
    tilt: [f32; 2],
    human_axis: f32,
    agent_action: f32,
    human_speed: f32,
    agent_speed: f32,
    goal: bool,
}

impl Default for BallState {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            position: BALL_START,
            velocity: [0.0, 0.0],
            tilt: [0.0, 0.0],
            human_axis: 0.0,
            agent_action: 0.0,
            human_speed: config.human_speed,
            agent_speed: config.agent_speed,
            goal: false,
        }
    }
}

pub struct BallWorld {
    state: Mutex<BallState>,
    frozen: AtomicBool,
    indicator: AtomicBool,
}

impl BallWorld {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BallState::default()),
            frozen: AtomicBool::new(false),
            indicator: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, BallState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Adopt the per-session speed scales from the server config.
    pub fn configure(&self, config: &SessionConfig) {
        let mut s = self.state();
        s.human_speed = config.human_speed;
        s.agent_speed = config.agent_speed;
    }

    /// Human steering input, clamped to the `-1..=1` axis range.
    pub fn set_human_axis(&self, axis: f32) {
        self.state().human_axis = axis.clamp(-1.0, 1.0);
    }

    /// Advance the simulation by `dt` seconds. Frozen boards ignore
    /// time entirely.
    pub fn advance(&self, dt: f32) {
        if !(dt > 0.0) || self.frozen() {
            return;
        }
        let mut s = self.state();

        let blend = (dt * STEER_RESPONSE).min(1.0);
        let target = [s.human_axis * s.human_speed, s.agent_action * s.agent_speed];
        s.velocity[0] += (target[0] - s.velocity[0]) * blend;
        s.velocity[1] += (target[1] - s.velocity[1]) * blend;

        s.position[0] =
            (s.position[0] + s.velocity[0] * dt).clamp(-BOARD_HALF_EXTENT, BOARD_HALF_EXTENT);
        s.position[1] =
            (s.position[1] + s.velocity[1] * dt).clamp(-BOARD_HALF_EXTENT, BOARD_HALF_EXTENT);

        s.tilt[0] = (s.agent_action * MAX_TILT_DEGREES).rem_euclid(360.0);
        s.tilt[1] = (s.human_axis * MAX_TILT_DEGREES).rem_euclid(360.0);

        if !s.goal {
            let distance = distance(s.position, GOAL_POSITION);
            if distance <= GOAL_RADIUS {
                s.goal = true;
                info!(distance, "ball reached the goal");
            }
        }
    }

    /// Full scene-style reset: ball recentered, inputs cleared, popup
    /// hidden, simulation thawed. Used between sessions.
    pub fn reload(&self) {
        {
            let mut s = self.state();
            let (human_speed, agent_speed) = (s.human_speed, s.agent_speed);
            *s = BallState {
                human_speed,
                agent_speed,
                ..BallState::default()
            };
        }
        self.frozen.store(false, Ordering::Relaxed);
        self.indicator.store(false, Ordering::Relaxed);
    }
}

impl Default for BallWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GameWorld for BallWorld {
    fn observe(&self) -> Observation {
        let s = self.state();
        let signed_human = if s.human_axis > 0.0 {
            s.human_speed
        } else if s.human_axis < 0.0 {
            -s.human_speed
        } else {
            0.0
        };
        [
            s.position[1],
            -s.position[0],
            s.velocity[1],
            -s.velocity[0],
            normalize_angle(s.tilt[0]),
            normalize_angle(s.tilt[1]),
            signed_human,
            s.agent_action * s.agent_speed,
        ]
    }

    fn distance_from_goal(&self) -> f32 {
        distance(self.state().position, GOAL_POSITION)
    }

    fn goal_reached(&self) -> bool {
        self.state().goal
    }

    fn human_action(&self) -> f32 {
        self.state().human_axis
    }

    fn agent_action(&self) -> f32 {
        self.state().agent_action
    }

    fn apply_agent_action(&self, action: f32) {
        self.state().agent_action = action;
    }

    fn set_frozen(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Relaxed);
    }

    fn frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }

    fn set_timeout_indicator(&self, visible: bool) {
        self.indicator.store(visible, Ordering::Relaxed);
    }

    fn timeout_indicator(&self) -> bool {
        self.indicator.load(Ordering::Relaxed)
    }

    /// Between-episode reset: reposition the ball and clear the goal
    /// latch. Applied inputs survive, the server overwrites them on the
    /// next step anyway.
    fn reset_episode(&self) {
        let mut s = self.state();
        s.position = BALL_START;
        s.velocity = [0.0, 0.0];
        s.tilt = [0.0, 0.0];
        s.goal = false;
    }
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dz = a[1] - b[1];
    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
impl BallWorld {
    fn place_ball(&self, x: f32, z: f32) {
        let mut s = self.state();
        s.position = [x, z];
        s.velocity = [0.0, 0.0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_toward_the_commanded_speed() {
        let world = BallWorld::new();
        world.configure(&SessionConfig {
            human_speed: 3.0,
            agent_speed: 2.0,
            ..SessionConfig::default()
        });
        world.apply_agent_action(1.0);

        // 0.5 s at STEER_RESPONSE saturates the blend, so the ball
        // reaches full commanded speed in one call
        world.advance(0.5);

        let obs = world.observe();
        assert!((obs[2] - 2.0).abs() < 1e-5, "vel.z {}", obs[2]);
        assert!((obs[0] - (BALL_START[1] + 1.0)).abs() < 1e-5, "pos.z {}", obs[0]);
    }

    #[test]
    fn frozen_board_ignores_time() {
        let world = BallWorld::new();
        world.apply_agent_action(1.0);
        world.set_frozen(true);
        world.advance(1.0);
        let obs = world.observe();
        assert_eq!(obs[0], BALL_START[1]);
        assert_eq!(obs[2], 0.0);
    }

    #[test]
    fn observation_mirrors_board_axes() {
        let world = BallWorld::new();
        world.place_ball(1.0, 2.0);
        let obs = world.observe();
        assert_eq!(obs[0], 2.0);
        assert_eq!(obs[1], -1.0);
    }

    #[test]
    fn tilt_reads_as_a_small_negative_angle() {
        let world = BallWorld::new();
        world.apply_agent_action(-0.5);
        world.advance(0.001);
        let obs = world.observe();
        assert!((obs[4] - (-9.0)).abs() < 1e-4, "tilt {}", obs[4]);
    }

    #[test]
    fn human_slot_reports_signed_speed_only() {
        let world = BallWorld::new();
        world.set_human_axis(-0.4);
        let obs = world.observe();
        assert_eq!(obs[6], -SessionConfig::default().human_speed);

        world.set_human_axis(0.0);
        assert_eq!(world.observe()[6], 0.0);
    }

    #[test]
    fn goal_latches_until_reset() {
        let world = BallWorld::new();
        world.place_ball(GOAL_POSITION[0], GOAL_POSITION[1]);
        world.advance(0.01);
        assert!(world.goal_reached());
        assert!(world.distance_from_goal() < GOAL_RADIUS);

        world.reset_episode();
        assert!(!world.goal_reached());
        assert_eq!(world.observe()[0], BALL_START[1]);
    }

    #[test]
    fn ball_stays_on_the_board() {
        let world = BallWorld::new();
        world.apply_agent_action(1.0);
        for _ in 0..200 {
            world.advance(0.1);
        }
        assert!(world.observe()[0] <= BOARD_HALF_EXTENT);
    }

    #[test]
    fn cloned_handle_drives_the_same_board() {
        use std::sync::Arc;

        let world = Arc::new(BallWorld::new());
        let handle: Arc<dyn GameWorld> = world.clone();
        handle.set_frozen(true);
        handle.apply_agent_action(0.5);
        assert!(world.frozen());
        assert_eq!(world.agent_action(), 0.5);
    }

    #[test]
    fn reload_clears_inputs_and_popup() {
        let world = BallWorld::new();
        world.apply_agent_action(0.7);
        world.set_human_axis(1.0);
        world.set_timeout_indicator(true);
        world.set_frozen(true);
        world.advance(0.1);

        world.reload();

        assert!(!world.frozen());
        assert!(!world.timeout_indicator());
        assert_eq!(world.agent_action(), 0.0);
        assert_eq!(world.human_action(), 0.0);
        assert_eq!(world.observe()[0], BALL_START[1]);
    }
}
