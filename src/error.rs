use thiserror::Error;

/// Failure of a single request/response cycle before any status is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,
}

/// Failure of a typed call against the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{}", service_message(*status, detail.as_deref()))]
    Service { status: u16, detail: Option<String> },

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

fn service_message(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("Service returned {}: {}", status, d),
        None => format!("Service returned {}", status),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Sign-in service error ({0})")]
    ServiceError(u16),

    #[error("Cannot reach the scheduling service: {0}")]
    NetworkError(String),

    #[error("Unexpected sign-in response: {0}")]
    UnexpectedResponse(String),
}

impl From<ApiError> for AuthFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(t) => AuthFailure::NetworkError(t.to_string()),
            ApiError::Service { status, .. } if (400..500).contains(&status) => {
                AuthFailure::InvalidCredentials
            }
            ApiError::Service { status, .. } => AuthFailure::ServiceError(status),
            ApiError::Malformed(m) => AuthFailure::UnexpectedResponse(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowFailure {
    #[error("No generated timetable found")]
    NotFound,

    #[error("{}", service_message(*status, detail.as_deref()))]
    ServiceError { status: u16, detail: Option<String> },

    #[error("Cannot reach the scheduling service: {0}")]
    NetworkError(String),

    #[error("The scheduling service did not answer in time")]
    Timeout,

    #[error("Timetable data could not be read: {0}")]
    Malformed(String),
}

impl From<ApiError> for WorkflowFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(TransportError::Timeout) => WorkflowFailure::Timeout,
            ApiError::Transport(TransportError::Network(m)) => WorkflowFailure::NetworkError(m),
            ApiError::Service { status, detail } => WorkflowFailure::ServiceError { status, detail },
            ApiError::Malformed(m) => WorkflowFailure::Malformed(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadFailure {
    #[error("Download failed with status {0}")]
    ServiceError(u16),

    #[error("Download failed: {0}")]
    NetworkError(String),

    #[error("Could not save file: {0}")]
    Platform(String),
}

impl From<ApiError> for DownloadFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(t) => DownloadFailure::NetworkError(t.to_string()),
            ApiError::Service { status, .. } => DownloadFailure::ServiceError(status),
            ApiError::Malformed(m) => DownloadFailure::Platform(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid service address '{0}'")]
    InvalidBase(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

impl From<AuthFailure> for String {
    fn from(err: AuthFailure) -> Self {
        err.to_string()
    }
}

impl From<WorkflowFailure> for String {
    fn from(err: WorkflowFailure) -> Self {
        err.to_string()
    }
}

impl From<DownloadFailure> for String {
    fn from(err: DownloadFailure) -> Self {
        err.to_string()
    }
}

impl From<ApiError> for String {
    fn from(err: ApiError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_separates_credentials_from_network() {
        let bad = AuthFailure::from(ApiError::Service { status: 401, detail: None });
        let down = AuthFailure::from(ApiError::Transport(TransportError::Network(
            "connection refused".into(),
        )));
        assert_eq!(bad, AuthFailure::InvalidCredentials);
        assert!(matches!(down, AuthFailure::NetworkError(_)));
        assert_ne!(bad.to_string(), down.to_string());
    }

    #[test]
    fn test_auth_failure_server_error_keeps_status() {
        let err = AuthFailure::from(ApiError::Service { status: 503, detail: None });
        assert_eq!(err, AuthFailure::ServiceError(503));
    }

    #[test]
    fn test_workflow_failure_mapping() {
        assert_eq!(
            WorkflowFailure::from(ApiError::Transport(TransportError::Timeout)),
            WorkflowFailure::Timeout
        );
        let err = WorkflowFailure::from(ApiError::Service {
            status: 500,
            detail: Some("Generation failed: solver crashed".into()),
        });
        assert_eq!(
            err.to_string(),
            "Service returned 500: Generation failed: solver crashed"
        );
    }

    #[test]
    fn test_http_and_transport_failures_read_differently() {
        let http = WorkflowFailure::from(ApiError::Service { status: 502, detail: None });
        let net = WorkflowFailure::from(ApiError::Transport(TransportError::Network(
            "dns".into(),
        )));
        assert_ne!(http.to_string(), net.to_string());
    }
}
