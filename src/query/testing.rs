//! In-memory transport and progress sink for driving the query layer in
//! tests without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::ProgressSink;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::models::{ApiResponse, HttpMethod};

#[derive(Clone)]
pub(crate) enum Reply {
    Response(ApiResponse),
    Unauthorized,
}

/// Answers each URL from its own queue; the last reply of a queue repeats.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, url: &str, status: u16, body: Value) -> Self {
        self.reply(url, Reply::Response(ApiResponse::new(status, body.to_string(), 0)))
    }

    pub(crate) fn on_text(self, url: &str, status: u16, text: &str) -> Self {
        self.reply(url, Reply::Response(ApiResponse::new(status, text, 0)))
    }

    pub(crate) fn reply(self, url: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        _method: HttpMethod,
        url: &str,
        _body: Option<&Value>,
        _params: &[(String, String)],
    ) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes
                .get_mut(url)
                .unwrap_or_else(|| panic!("no scripted reply for {url}"));
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match reply {
            Some(Reply::Response(resp)) => Ok(resp),
            Some(Reply::Unauthorized) => Err(Error::Authentication(
                "Invalid API key or insufficient permissions".to_string(),
            )),
            None => panic!("empty reply queue for {url}"),
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingProgress {
    messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }
}

impl ProgressSink for RecordingProgress {
    fn update(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
