use std::time::Duration;

use futures::future::{self, Either};
use gloo_timers::future::TimeoutFuture;
use tracing::warn;

use crate::api::{ApiRequest, HttpReply, Method, Transport};
use crate::error::TransportError;

/// Browser transport built on reqwest's fetch backend. Each exchange races
/// a timer so a silent service surfaces as `TransportError::Timeout`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<HttpReply, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let exchange = async move {
            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            Ok(HttpReply {
                status,
                body: body.to_vec(),
            })
        };
        let timer = TimeoutFuture::new(timeout_millis(request.timeout));

        futures::pin_mut!(exchange);
        futures::pin_mut!(timer);
        match future::select(exchange, timer).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                warn!(
                    "{:?} {} timed out after {:?}",
                    request.method, request.url, request.timeout
                );
                Err(TransportError::Timeout)
            }
        }
    }
}

fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}
