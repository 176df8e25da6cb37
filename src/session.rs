//! The session protocol state machine.
//!
//! One cooperative task walks a tick loop: pace, act for the current
//! state, exchange with the server, adopt the commanded state. All
//! transitions funnel through [`next_state`] so the whole protocol is
//! readable in one function.
//!
//! Failure handling is deliberately blunt. Any failed exchange, on any
//! route, forces the session back to `start` after a short backoff; the
//! server re-issues whatever it still wants. Requests are never retried
//! in place.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::channel::CommandChannel;
use crate::config::SessionConfig;
use crate::protocol::{
    Command, CommandEnvelope, ResetReport, StepCommand, StepReport, TrainingCommand,
};
use crate::telemetry::Telemetry;
use crate::transport::{ExchangeError, Transport};
use crate::world::GameWorld;

/// Protocol states. `Init` is internal: the loop parks there when the
/// server has declared the run finished and the host should rebuild
/// the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Start,
    Reset,
    Step,
    Training,
    Finished,
    GoalReached,
}

impl From<Command> for SessionState {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => SessionState::Start,
            Command::Reset => SessionState::Reset,
            Command::Step => SessionState::Step,
            Command::Training => SessionState::Training,
            Command::Finished => SessionState::Finished,
            Command::GoalReached => SessionState::GoalReached,
        }
    }
}

/// Everything that can move the session to another state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ServerCommand(Command),
    ExchangeFailed,
    TimerElapsed,
}

/// The complete transition table: `(state, saved, event)` to
/// `(state, saved)`.
///
/// Commands and failures save the outgoing state; the popup timer is
/// the one consumer of that slot, restoring whatever was current when
/// the goal fired. Timers in other states change nothing.
pub fn next_state(
    current: SessionState,
    saved: SessionState,
    event: SessionEvent,
) -> (SessionState, SessionState) {
    match event {
        SessionEvent::ServerCommand(command) => (command.into(), current),
        SessionEvent::ExchangeFailed => (SessionState::Start, current),
        SessionEvent::TimerElapsed => match current {
            SessionState::Finished => (SessionState::Init, current),
            SessionState::GoalReached => (saved, saved),
            _ => (current, saved),
        },
    }
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The server declared the run finished; tear the world down and
    /// bootstrap again.
    Reload,
}

/// Pacing knobs. The defaults are the protocol contract; tests shrink
/// them to keep wall time down.
#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    /// Minimum spacing between ticks, also charged against the step
    /// wait budget.
    pub tick_spacing: Duration,
    /// Pause after a failed exchange before the next tick.
    pub failure_backoff: Duration,
    /// Hold time in `finished` before the reload signal.
    pub finished_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            tick_spacing: Duration::from_millis(5),
            failure_backoff: Duration::from_millis(10),
            finished_delay: Duration::from_secs(5),
        }
    }
}

pub struct SessionLoop<T: Transport> {
    channel: CommandChannel<T>,
    config: SessionConfig,
    world: Arc<dyn GameWorld>,
    telemetry: Arc<Telemetry>,
    timing: SessionTiming,
    state: SessionState,
    saved: SessionState,
    last_command: CommandEnvelope,
    training: Option<TrainingCommand>,
    request_duration: f32,
}

impl<T: Transport> SessionLoop<T> {
    pub fn new(
        channel: CommandChannel<T>,
        config: SessionConfig,
        world: Arc<dyn GameWorld>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self::with_timing(channel, config, world, telemetry, SessionTiming::default())
    }

    pub fn with_timing(
        channel: CommandChannel<T>,
        config: SessionConfig,
        world: Arc<dyn GameWorld>,
        telemetry: Arc<Telemetry>,
        timing: SessionTiming,
    ) -> Self {
        Self {
            channel,
            config,
            world,
            telemetry,
            timing,
            state: SessionState::Start,
            saved: SessionState::Start,
            last_command: CommandEnvelope {
                command: Command::Start,
                step_request: None,
                training_request: None,
            },
            training: None,
            request_duration: 0.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Latest opaque training parameters, if the server sent any.
    pub fn training(&self) -> Option<&TrainingCommand> {
        self.training.as_ref()
    }

    /// Drive the session until the server ends the run.
    pub async fn run(&mut self) -> SessionExit {
        loop {
            if let Some(exit) = self.tick().await {
                return exit;
            }
        }
    }

    async fn tick(&mut self) -> Option<SessionExit> {
        trace!(state = ?self.state, "session tick");
        tokio::time::sleep(self.timing.tick_spacing).await;
        match self.state {
            SessionState::Init => return Some(SessionExit::Reload),
            SessionState::Start => self.tick_start().await,
            SessionState::Reset => self.tick_reset().await,
            SessionState::Step => self.tick_step().await,
            SessionState::Training => self.tick_training().await,
            SessionState::Finished => {
                tokio::time::sleep(self.timing.finished_delay).await;
                self.transition(SessionEvent::TimerElapsed);
                debug!("run finished, requesting scene reload");
            }
            SessionState::GoalReached => {
                tokio::time::sleep(secs_f32(self.config.popup_window_time)).await;
                self.transition(SessionEvent::TimerElapsed);
                self.world.set_timeout_indicator(false);
                self.world.set_frozen(false);
            }
        }
        None
    }

    async fn tick_start(&mut self) {
        self.world.set_frozen(true);
        let result = self.channel.player_ready().await;
        self.settle(result).await;
    }

    async fn tick_reset(&mut self) {
        let report = ResetReport {
            observation: self.world.observe(),
        };
        let result = self.channel.reset_done(&report).await;
        if self.settle(result).await {
            self.telemetry.episode_restarted();
        }
        self.world.reset_episode();
        self.world.set_frozen(true);
    }

    async fn tick_step(&mut self) {
        self.world.set_frozen(false);
        let step = self.last_command.step_request.unwrap_or_default();
        self.world.apply_agent_action(step.action_agent);

        let wait = step_wait(
            self.config.action_duration,
            self.request_duration,
            self.timing.tick_spacing,
        );
        trace!(request_duration = self.request_duration, wait = ?wait, "step pacing");
        tokio::time::sleep(wait).await;

        let report = self.step_report(step);
        let started = Instant::now();
        let result = self.channel.observation(&report).await;
        if self.settle(result).await {
            self.request_duration = started.elapsed().as_secs_f32();
            self.telemetry.step_reported();
            if step.timed_out {
                self.world.set_timeout_indicator(true);
            }
            if report.done {
                self.world.set_frozen(true);
                self.transition(SessionEvent::ServerCommand(Command::GoalReached));
            }
        }
    }

    async fn tick_training(&mut self) {
        if let Some(params) = self.last_command.training_request.clone() {
            debug!("adopted training parameters");
            self.training = Some(params);
        }
        let result = self.channel.player_ready().await;
        self.settle(result).await;
    }

    /// Common tail of every exchange: adopt the server's command, or
    /// fall back to `start` and back off. Returns whether the exchange
    /// succeeded.
    async fn settle(&mut self, result: Result<CommandEnvelope, ExchangeError>) -> bool {
        match result {
            Ok(envelope) => {
                self.transition(SessionEvent::ServerCommand(envelope.command));
                self.last_command = envelope;
                true
            }
            Err(err) => {
                warn!(error = %err, "exchange failed, forcing start");
                self.transition(SessionEvent::ExchangeFailed);
                tokio::time::sleep(self.timing.failure_backoff).await;
                false
            }
        }
    }

    fn transition(&mut self, event: SessionEvent) {
        let (state, saved) = next_state(self.state, self.saved, event);
        self.state = state;
        self.saved = saved;
    }

    fn step_report(&self, step: StepCommand) -> StepReport {
        StepReport {
            observation: self.world.observe(),
            distance_from_goal: self.world.distance_from_goal(),
            done: self.world.goal_reached() || step.timed_out,
            fps: self.telemetry.fps(),
            duration_pause: self.telemetry.pause_seconds(),
            human_action: self.world.human_action(),
            agent_action: self.world.agent_action(),
        }
    }
}

/// Remaining wait before a step executes, after charging the previous
/// request and one tick of loop overhead against the budget.
fn step_wait(action_duration: f32, request_duration: f32, tick_spacing: Duration) -> Duration {
    secs_f32(action_duration - request_duration - tick_spacing.as_secs_f32())
}

fn secs_f32(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        // values past the representable range saturate
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
