//! HTTP transport: plain-data request/response types, the `Transport` seam,
//! and the production ureq implementation.
//!
//! # Design
//! `HttpRequest`/`HttpResponse` describe round-trips as plain data, so the
//! clients' `build_*`/`parse_*` methods stay deterministic and free of I/O.
//! The [`Transport`] trait is the single place status codes are interpreted:
//! an implementation returns `Ok` only for 2xx, folds every other status into
//! [`ApiError::Remote`] with the server's own message, and maps the
//! no-response case to [`ApiError::Network`]. No transport may retry on its
//! own; retry policy belongs to the caller.

use tracing::debug;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// An HTTP request described as plain data.
///
/// Built by the client `build_*` methods; executed by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data. Only ever carries a 2xx status
/// when produced through a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes one HTTP round-trip and normalizes the outcome.
///
/// Contract: 2xx responses come back as `Ok`; any other status becomes
/// `ApiError::Remote` via [`remote_error`]; a request that never got a
/// response becomes `ApiError::Network`. Exactly one request per call.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Build the uniform error for a non-2xx response.
///
/// The server answers with `{"detail": <string>}` in most places,
/// `{"detail": {"message": ...}}` in others, and `{"message": ...}` in one
/// tree; a body that is not JSON at all must still produce something
/// readable.
pub fn remote_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
                return Some(msg.to_string());
            }
            match value.get("detail") {
                Some(serde_json::Value::String(msg)) => Some(msg.clone()),
                Some(detail) => detail
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                None => None,
            }
        })
        .unwrap_or_else(|| format!("request failed with status {status}"));
    ApiError::Remote { status, message }
}

/// Reject a response whose status is not the one the endpoint documents.
pub(crate) fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status != expected {
        return Err(remote_error(response.status, &response.body));
    }
    Ok(())
}

/// Production transport backed by a ureq agent.
///
/// Status-as-error is disabled so 4xx/5xx arrive as data and go through the
/// same [`remote_error`] normalization as everything else.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = ?request.method, path = %request.path, "executing request");

        let result = match (request.method, request.body) {
            (HttpMethod::Get, _) => self.agent.get(&request.path).call(),
            (HttpMethod::Delete, _) => self.agent.delete(&request.path).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&request.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&request.path).send_empty(),
        };

        let mut response = result.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        debug!(status, "response received");

        if (200..300).contains(&status) {
            Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body,
            })
        } else {
            Err(remote_error(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_extracts_detail_string() {
        let err = remote_error(500, r#"{"detail":"no seats available"}"#);
        assert_eq!(
            err,
            ApiError::Remote {
                status: 500,
                message: "no seats available".to_string()
            }
        );
    }

    #[test]
    fn remote_error_extracts_nested_detail_message() {
        let body = r#"{"detail":{"error":"Validation error","message":"Invalid phone number!"}}"#;
        let err = remote_error(400, body);
        assert_eq!(
            err,
            ApiError::Remote {
                status: 400,
                message: "Invalid phone number!".to_string()
            }
        );
    }

    #[test]
    fn remote_error_prefers_top_level_message() {
        let err = remote_error(409, r#"{"message":"seat already taken"}"#);
        assert_eq!(
            err,
            ApiError::Remote {
                status: 409,
                message: "seat already taken".to_string()
            }
        );
    }

    #[test]
    fn remote_error_survives_non_json_body() {
        let err = remote_error(502, "<html>Bad Gateway</html>");
        assert_eq!(
            err,
            ApiError::Remote {
                status: 502,
                message: "request failed with status 502".to_string()
            }
        );
    }

    #[test]
    fn remote_error_survives_empty_body() {
        let err = remote_error(503, "");
        assert!(matches!(err, ApiError::Remote { status: 503, .. }));
    }
}
