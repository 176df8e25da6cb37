//! Client half of a remote-training protocol: a server drives a
//! real-time ball-and-goal episode running in this process.
//!
//! [`bootstrap::Bootstrap`] finds the server and fetches the session
//! config, [`session::SessionLoop`] then runs the command loop over a
//! [`transport::Transport`], reading the world through
//! [`world::GameWorld`] and reporting frame telemetry from
//! [`telemetry::Telemetry`].

pub mod bootstrap;
pub mod channel;
pub mod config;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod world;

pub use bootstrap::{Bootstrap, Resolved};
pub use channel::CommandChannel;
pub use config::{ServerLocation, SessionConfig, DEFAULT_HOST};
pub use session::{SessionExit, SessionLoop, SessionState, SessionTiming};
pub use telemetry::Telemetry;
pub use transport::{ExchangeError, HttpTransport, Transport};
pub use world::GameWorld;
