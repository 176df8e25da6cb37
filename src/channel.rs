//! Typed command channel over the session routes.
//!
//! One method per route; every reply decodes to a [`CommandEnvelope`].
//! A 2xx reply that fails to decode is reported as
//! [`ExchangeError::MalformedResponse`] and handled like any other
//! failed exchange.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ServerLocation;
use crate::protocol::{routes, CommandEnvelope, ResetReport, StepReport};
use crate::transport::{ExchangeError, Transport};

pub struct CommandChannel<T: Transport> {
    transport: Arc<T>,
    location: ServerLocation,
}

impl<T: Transport> CommandChannel<T> {
    pub fn new(transport: Arc<T>, location: ServerLocation) -> Self {
        Self { transport, location }
    }

    pub fn location(&self) -> &ServerLocation {
        &self.location
    }

    /// `GET /player_ready`, announcing the client at the start of a scene.
    pub async fn player_ready(&self) -> Result<CommandEnvelope, ExchangeError> {
        let body = self.transport.get(&self.location, routes::PLAYER_READY).await?;
        decode(routes::PLAYER_READY, &body)
    }

    /// `POST /reset_done` with the freshly reset observation.
    pub async fn reset_done(&self, report: &ResetReport) -> Result<CommandEnvelope, ExchangeError> {
        self.post(routes::RESET_DONE, report).await
    }

    /// `POST /observation` with one step's report.
    pub async fn observation(&self, report: &StepReport) -> Result<CommandEnvelope, ExchangeError> {
        self.post(routes::OBSERVATION, report).await
    }

    async fn post<B: Serialize>(
        &self,
        route: &'static str,
        body: &B,
    ) -> Result<CommandEnvelope, ExchangeError> {
        let encoded = serde_json::to_vec(body).map_err(|err| ExchangeError::Transport {
            route,
            reason: err.to_string(),
        })?;
        let reply = self.transport.post(&self.location, route, encoded).await?;
        decode(route, &reply)
    }
}

fn decode(route: &'static str, body: &[u8]) -> Result<CommandEnvelope, ExchangeError> {
    serde_json::from_slice(body).map_err(|err| ExchangeError::MalformedResponse {
        route,
        reason: err.to_string(),
    })
}
