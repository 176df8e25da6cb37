//! Wire schema for the training-server protocol.
//!
//! Field names here are the server contract; keep them exactly as the
//! trainer expects (`duration_pause`, not `pause_duration`). Every reply
//! body on the session routes decodes to a [`CommandEnvelope`].

use serde::{Deserialize, Serialize};

/// Number of slots in the observation vector.
pub const OBSERVATION_LEN: usize = 8;

/// Flat numeric view of the simulation handed to the server.
///
/// Layout: `[pos_z, -pos_x, vel_z, -vel_x, rot_x, rot_z,
/// signed_human_speed, scaled_agent_action]`, with rotations in degrees
/// normalized to `(-180, 180]`.
pub type Observation = [f32; OBSERVATION_LEN];

/// Protocol routes, relative to the resolved host.
pub mod routes {
    pub const ENV_VARIABLES: &str = "/env_variables";
    pub const CONFIG: &str = "/config";
    pub const PLAYER_READY: &str = "/player_ready";
    pub const RESET_DONE: &str = "/reset_done";
    pub const OBSERVATION: &str = "/observation";
}

/// Body of `GET /env_variables`: where the real server lives.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvVariables {
    pub host: String,
}

/// The server's instruction for what happens next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Reset,
    Step,
    Training,
    Finished,
    GoalReached,
}

/// Reply body on every session route: the next command plus its
/// optional payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandEnvelope {
    pub command: Command,
    #[serde(default)]
    pub step_request: Option<StepCommand>,
    #[serde(default)]
    pub training_request: Option<TrainingCommand>,
}

/// Server-authoritative action for one step.
///
/// Missing fields decode to the zero action, matching the lenient
/// decoder on the original engine side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct StepCommand {
    #[serde(default)]
    pub action_agent: f32,
    #[serde(default)]
    pub timed_out: bool,
}

/// Opaque training parameters; forwarded, never interpreted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TrainingCommand(pub serde_json::Value);

/// Outgoing body of `POST /reset_done`.
#[derive(Debug, Clone, Serialize)]
pub struct ResetReport {
    pub observation: Observation,
}

/// Outgoing body of `POST /observation`, built fresh for each step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub observation: Observation,
    pub distance_from_goal: f32,
    /// Goal reached or step timed out.
    pub done: bool,
    /// Mean frame rate since the previous report, integer math.
    pub fps: u32,
    /// Seconds the simulation spent frozen since the previous report.
    pub duration_pause: f32,
    pub human_action: f32,
    pub agent_action: f32,
}
