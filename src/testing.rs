//! Test doubles shared by the unit tests

use crate::{
    errors::Result,
    transport::{Transport, VaultRequest, VaultResponse},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued responses and records every request; answers 404 once
/// the queue is empty.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<VaultResponse>>,
    requests: Mutex<Vec<VaultRequest>>,
}

impl ScriptedTransport {
    pub fn respond(&self, status: u16, body: serde_json::Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(VaultResponse::new(status, Some(body)));
        self
    }

    pub fn requests(&self) -> Vec<VaultRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: VaultRequest) -> Result<VaultResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| VaultResponse::new(404, Some(serde_json::json!({"errors": []})))))
    }
}
