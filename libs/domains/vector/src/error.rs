use core_config::ConfigError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        VectorError::Validation(msg.into())
    }

    /// HTTP status of the failed call, when the failure came from the remote service.
    pub fn status(&self) -> Option<u16> {
        match self {
            VectorError::Api(err) => Some(err.status),
            VectorError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// Structured error returned by the remote service for a non-2xx response.
#[derive(Debug, Error)]
#[error("API error ({status}, code {code}): {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub status: u16,
    pub details: Vec<ErrorDetail>,
    /// The transport failure that carried this response.
    #[source]
    pub source: reqwest::Error,
}

/// Service error codes are gRPC-style integers on most endpoints and names on a few.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Named(String),
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Numeric(0)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Numeric(code) => write!(f, "{}", code),
            ErrorCode::Named(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default)]
    pub type_url: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    code: ErrorCode,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

/// Turn a failed response into a [`VectorError`].
///
/// A JSON body with a `message` field becomes [`VectorError::Api`] chained to `transport`;
/// anything else surfaces `transport` unchanged.
pub(crate) fn translate_error(
    transport: reqwest::Error,
    status: StatusCode,
    body: &[u8],
) -> VectorError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            code,
            details,
        }) => VectorError::Api(ApiError {
            code,
            message,
            status: status.as_u16(),
            details,
            source: transport,
        }),
        Ok(_) => {
            warn!(status = status.as_u16(), "Error response has no message field");
            VectorError::Transport(transport)
        }
        Err(e) => {
            warn!(
                status = status.as_u16(),
                error = %e,
                "Failed to parse error response body"
            );
            VectorError::Transport(transport)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_with_numeric_code() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"code":3,"message":"Vector dimension 3 does not match","details":[{"typeUrl":"t","value":"v"}]}"#,
        )
        .unwrap();

        assert_eq!(body.code, ErrorCode::Numeric(3));
        assert_eq!(body.message.as_deref(), Some("Vector dimension 3 does not match"));
        assert_eq!(
            body.details,
            vec![ErrorDetail {
                type_url: "t".to_string(),
                value: serde_json::json!("v"),
            }]
        );
    }

    #[test]
    fn test_error_body_with_named_code_and_no_details() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"code":"NOT_FOUND","message":"missing"}"#).unwrap();
        assert_eq!(body.code, ErrorCode::Named("NOT_FOUND".to_string()));
        assert!(body.details.is_empty());
        assert_eq!(body.code.to_string(), "NOT_FOUND");
    }

    #[test]
    fn test_error_body_without_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert!(body.message.is_none());
        assert_eq!(body.code, ErrorCode::Numeric(0));
    }

    #[test]
    fn test_validation_error_has_no_status() {
        let err = VectorError::validation("bad");
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Invalid input: bad");
    }

    #[test]
    fn test_config_error_converts() {
        let err: VectorError = ConfigError::MissingEnvVar("PINECONE_API_KEY".to_string()).into();
        assert!(matches!(err, VectorError::Config(_)));
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }
}
