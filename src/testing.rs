//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::channel::oneshot;

use crate::api::{ApiClient, ApiRequest, HttpReply, Method, Transport};
use crate::config::AppConfig;
use crate::error::TransportError;

type Outcome = Result<HttpReply, TransportError>;

enum Scripted {
    Ready(Outcome),
    Waiting(oneshot::Receiver<Outcome>),
}

/// Transport answering from a per-(method, url) queue of scripted replies.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Rc<RefCell<HashMap<(Method, String), VecDeque<Scripted>>>>,
    sent: Rc<RefCell<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: Method, url: &str, status: u16, body: &str) {
        self.push(
            method,
            url,
            Scripted::Ready(Ok(HttpReply {
                status,
                body: body.as_bytes().to_vec(),
            })),
        );
    }

    pub fn fail(&self, method: Method, url: &str, err: TransportError) {
        self.push(method, url, Scripted::Ready(Err(err)));
    }

    /// Reply held back until the returned sender fires.
    pub fn pending(&self, method: Method, url: &str) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.push(method, url, Scripted::Waiting(rx));
        tx
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.sent.borrow().clone()
    }

    fn push(&self, method: Method, url: &str, entry: Scripted) {
        self.replies
            .borrow_mut()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(entry);
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<HttpReply, TransportError> {
        let key = (request.method, request.url.clone());
        self.sent.borrow_mut().push(request);
        let next = self
            .replies
            .borrow_mut()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Scripted::Ready(outcome)) => outcome,
            Some(Scripted::Waiting(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Network("reply dropped".into()))),
            None => Err(TransportError::Network(format!(
                "no scripted reply for {:?} {}",
                key.0, key.1
            ))),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        api_base: "http://svc.test".to_string(),
        ..AppConfig::default()
    }
}

pub fn client_with(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
    ApiClient::new(transport, test_config())
}

pub fn ok_reply(body: &str) -> Outcome {
    Ok(HttpReply {
        status: 200,
        body: body.as_bytes().to_vec(),
    })
}
