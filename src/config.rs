//! Server location and the per-session tuning block.

use serde::Deserialize;

/// Where to look for the bootstrap endpoint when nothing else is known.
pub const DEFAULT_HOST: &str = "http://127.0.0.1:5000";

/// Base address of the training server once bootstrap has resolved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLocation {
    host: String,
}

impl ServerLocation {
    pub fn new(host: impl Into<String>) -> Self {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        Self { host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute URL for a protocol route.
    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.host, route)
    }
}

impl Default for ServerLocation {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

/// Tuning block served by `GET /config`, fixed for the whole session.
///
/// Times are in seconds, speeds in world units per second.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SessionConfig {
    pub action_duration: f32,
    pub popup_window_time: f32,
    pub human_speed: f32,
    pub agent_speed: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            action_duration: 0.4,
            popup_window_time: 1.0,
            human_speed: 3.0,
            agent_speed: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::routes;

    #[test]
    fn url_joins_host_and_route() {
        let loc = ServerLocation::new("http://10.0.0.7:8080");
        assert_eq!(loc.url(routes::CONFIG), "http://10.0.0.7:8080/config");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let loc = ServerLocation::new("http://10.0.0.7:8080//");
        assert_eq!(loc.url(routes::OBSERVATION), "http://10.0.0.7:8080/observation");
    }

    #[test]
    fn default_location_points_at_loopback() {
        assert_eq!(ServerLocation::default().host(), DEFAULT_HOST);
    }

    #[test]
    fn config_decodes_from_server_body() {
        let body = r#"{"action_duration":0.35,"popup_window_time":2.0,"human_speed":4.0,"agent_speed":2.5}"#;
        let config: SessionConfig = serde_json::from_str(body).unwrap();
        assert!((config.action_duration - 0.35).abs() < f32::EPSILON);
        assert!((config.popup_window_time - 2.0).abs() < f32::EPSILON);
    }
}
