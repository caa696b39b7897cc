use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::error::{ApiError, TransportError};
use crate::http::HttpTransport;
use crate::session::{Role, Session};

// -- Transport seam --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request/response cycle. Implementations must not panic on
/// transport failures; they resolve to `TransportError` instead.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<HttpReply, TransportError>;
}

// -- Wire types matching the service --

#[derive(Serialize)]
struct LoginArgs<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response of `POST /generate`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GenerationResult {
    pub filename: String,
    pub download_url: String,
    pub json_url: String,
    #[serde(default)]
    pub json_filename: Option<String>,
}

/// Response of `GET /latest`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LatestArtifact {
    pub filename: String,
    pub download_url: String,
}

/// Row of `GET /users`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// The identity fields the service echoes back after create/update.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserSummary,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

// -- Typed client --

/// Typed access to the scheduling service. Every address is composed from
/// the configured base; call sites never embed one.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    config: AppConfig,
}

impl ApiClient<HttpTransport> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(HttpTransport::new(), config.clone())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: AppConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn url_for(&self, path: &str) -> String {
        self.config.url_for(path)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = to_body(&LoginArgs { email, password })?;
        let reply = self
            .call(Method::Post, self.url_for("/login"), Some(body), self.config.request_timeout)
            .await?;
        decode(&reply)
    }

    pub async fn generate(&self) -> Result<GenerationResult, ApiError> {
        let reply = self
            .call(Method::Post, self.url_for("/generate"), None, self.config.generate_timeout)
            .await?;
        decode(&reply)
    }

    pub async fn latest(&self) -> Result<LatestArtifact, ApiError> {
        let reply = self.get(self.url_for("/latest")).await?;
        decode(&reply)
    }

    /// Fetch a dataset at an already-resolved absolute address.
    pub async fn dataset_at(&self, url: &str) -> Result<Dataset, ApiError> {
        let reply = self.get(url.to_string()).await?;
        Dataset::from_json(&reply.body).map_err(ApiError::Malformed)
    }

    pub async fn teacher_dataset(&self, teacher_id: &str) -> Result<Dataset, ApiError> {
        let path = format!("/timetable/teacher/{}", urlencoding::encode(teacher_id));
        self.dataset_at(&self.url_for(&path)).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let reply = self.get(self.url_for("/users")).await?;
        decode(&reply)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserSummary, ApiError> {
        let reply = self
            .call(
                Method::Post,
                self.url_for("/users"),
                Some(to_body(user)?),
                self.config.request_timeout,
            )
            .await?;
        decode::<UserEnvelope>(&reply).map(|e| e.user)
    }

    pub async fn update_user(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserSummary, ApiError> {
        let path = format!("/users/{}", urlencoding::encode(id));
        let reply = self
            .call(
                Method::Put,
                self.url_for(&path),
                Some(to_body(update)?),
                self.config.request_timeout,
            )
            .await?;
        decode::<UserEnvelope>(&reply).map(|e| e.user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/users/{}", urlencoding::encode(id));
        self.call(Method::Delete, self.url_for(&path), None, self.config.request_timeout)
            .await
            .map(|_| ())
    }

    /// Raw bytes of a download/export address.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.get(url.to_string()).await.map(|reply| reply.body)
    }

    async fn get(&self, url: String) -> Result<HttpReply, ApiError> {
        self.call(Method::Get, url, None, self.config.request_timeout)
            .await
    }

    async fn call(
        &self,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<HttpReply, ApiError> {
        debug!("{:?} {}", method, url);
        let reply = self
            .transport
            .send(ApiRequest {
                method,
                url,
                body,
                timeout,
            })
            .await?;

        if reply.is_success() {
            Ok(reply)
        } else {
            Err(ApiError::Service {
                status: reply.status,
                detail: error_detail(&reply.body),
            })
        }
    }
}

fn to_body<S: Serialize>(value: &S) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn decode<D: DeserializeOwned>(reply: &HttpReply) -> Result<D, ApiError> {
    serde_json::from_slice(&reply.body).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// Human-readable `detail` of an error body, if the service sent one.
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
