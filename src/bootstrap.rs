//! Two-phase startup: find the real server, then fetch the session
//! tuning block.
//!
//! Phase one asks the well-known initial host for `/env_variables` and
//! adopts the host it names. Phase two fetches `/config` from that
//! resolved host. Both phases retry on a fixed cadence until they
//! succeed; there is nothing useful to do without a server, so neither
//! phase ever gives up.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{ServerLocation, SessionConfig};
use crate::protocol::{routes, EnvVariables};
use crate::transport::Transport;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Outcome of a completed bootstrap, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub location: ServerLocation,
    pub config: SessionConfig,
}

pub struct Bootstrap<T: Transport> {
    transport: Arc<T>,
    initial: ServerLocation,
    retry_delay: Duration,
}

impl<T: Transport> Bootstrap<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_initial(transport, ServerLocation::default())
    }

    /// Start the search somewhere other than the compiled-in host.
    pub fn with_initial(transport: Arc<T>, initial: ServerLocation) -> Self {
        Self {
            transport,
            initial,
            retry_delay: RETRY_DELAY,
        }
    }

    #[cfg(test)]
    pub(crate) fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Resolve the server location, then its config. Returns only once
    /// both phases have succeeded.
    pub async fn resolve(&self) -> Resolved {
        let location = self.resolve_location().await;
        let config = self.fetch_config(&location).await;
        Resolved { location, config }
    }

    async fn resolve_location(&self) -> ServerLocation {
        loop {
            match self.transport.get(&self.initial, routes::ENV_VARIABLES).await {
                Ok(body) => match serde_json::from_slice::<EnvVariables>(&body) {
                    Ok(env) => {
                        let location = ServerLocation::new(env.host);
                        info!(host = location.host(), "resolved training server");
                        return location;
                    }
                    Err(err) => warn!(error = %err, "bad env_variables body, retrying"),
                },
                Err(err) => warn!(error = %err, "env_variables unreachable, retrying"),
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn fetch_config(&self, location: &ServerLocation) -> SessionConfig {
        loop {
            match self.transport.get(location, routes::CONFIG).await {
                Ok(body) => match serde_json::from_slice::<SessionConfig>(&body) {
                    Ok(config) => {
                        info!(
                            action_duration = config.action_duration,
                            popup_window_time = config.popup_window_time,
                            "session config loaded"
                        );
                        return config;
                    }
                    Err(err) => warn!(error = %err, "bad config body, retrying"),
                },
                Err(err) => warn!(error = %err, "config unreachable, retrying"),
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}
