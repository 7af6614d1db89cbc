//! Test doubles for the transport boundary.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use s3_presign::{Address, Credentials};

use crate::{Client, Executor, Request, Response, TransportError};

/// Replays canned responses in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedExecutor {
    pub fn new(responses: impl IntoIterator<Item = Response>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::default(),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Executor for ScriptedExecutor {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::ConnectionFailed("no scripted response left".into()))
    }
}

/// Client talking to a local MinIO-style endpoint through `executor`.
pub fn scripted_client(executor: Arc<ScriptedExecutor>) -> Client<Arc<ScriptedExecutor>> {
    Client::with_executor(
        Credentials::new("my-access-key", "my-secret-key").unwrap(),
        Address::new("localhost:9000"),
        executor,
    )
}

pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
