//! HTTP plumbing under the command channel.
//!
//! The trait moves raw JSON bodies; encoding and decoding stay one
//! level up so tests can swap in a scripted transport.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ServerLocation;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Any way a single request/reply exchange can go wrong.
///
/// All variants are transient from the session's point of view; the
/// caller decides how long to back off.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport failure on {route}: {reason}")]
    Transport { route: &'static str, reason: String },
    #[error("server answered {status} on {route}")]
    Status { route: &'static str, status: u16 },
    #[error("malformed reply on {route}: {reason}")]
    MalformedResponse { route: &'static str, reason: String },
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        location: &ServerLocation,
        route: &'static str,
    ) -> Result<Vec<u8>, ExchangeError>;

    async fn post(
        &self,
        location: &ServerLocation,
        route: &'static str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, ExchangeError>;
}

/// Real client. Connect attempts are bounded; an accepted request is
/// allowed to take as long as the server needs, so there is no overall
/// timeout here.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn read_reply(
        response: reqwest::Response,
        route: &'static str,
    ) -> Result<Vec<u8>, ExchangeError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Status {
                route,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(|err| ExchangeError::Transport {
            route,
            reason: err.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        location: &ServerLocation,
        route: &'static str,
    ) -> Result<Vec<u8>, ExchangeError> {
        let response = self
            .client
            .get(location.url(route))
            .send()
            .await
            .map_err(|err| ExchangeError::Transport {
                route,
                reason: err.to_string(),
            })?;
        Self::read_reply(response, route).await
    }

    async fn post(
        &self,
        location: &ServerLocation,
        route: &'static str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, ExchangeError> {
        let response = self
            .client
            .post(location.url(route))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| ExchangeError::Transport {
                route,
                reason: err.to_string(),
            })?;
        Self::read_reply(response, route).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// One recorded request: route plus decoded body, if any.
    pub(crate) type SentRequest = (&'static str, Option<serde_json::Value>);

    /// Scripted transport: replies are served in push order, and every
    /// request is logged for assertions.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        replies: Mutex<VecDeque<Result<Vec<u8>, ExchangeError>>>,
        sent: Mutex<Vec<SentRequest>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_body(&self, body: &str) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Ok(body.as_bytes().to_vec()));
        }

        pub(crate) fn push_refused(&self, route: &'static str) {
            self.replies.lock().unwrap().push_back(Err(ExchangeError::Transport {
                route,
                reason: "connection refused".into(),
            }));
        }

        pub(crate) fn push_status(&self, route: &'static str, status: u16) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(ExchangeError::Status { route, status }));
        }

        pub(crate) fn sent(&self) -> Vec<SentRequest> {
            self.sent.lock().unwrap().clone()
        }

        fn next_reply(&self, route: &'static str) -> Result<Vec<u8>, ExchangeError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ExchangeError::Transport {
                    route,
                    reason: "no scripted reply".into(),
                }))
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(
            &self,
            _location: &ServerLocation,
            route: &'static str,
        ) -> Result<Vec<u8>, ExchangeError> {
            self.sent.lock().unwrap().push((route, None));
            self.next_reply(route)
        }

        async fn post(
            &self,
            _location: &ServerLocation,
            route: &'static str,
            body: Vec<u8>,
        ) -> Result<Vec<u8>, ExchangeError> {
            let decoded = serde_json::from_slice(&body).ok();
            self.sent.lock().unwrap().push((route, decoded));
            self.next_reply(route)
        }
    }
}
