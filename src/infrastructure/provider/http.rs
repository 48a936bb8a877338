//! Shared HTTP plumbing for provider adapters: client construction,
//! cancellable requests and status classification

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::ports::ProviderError;
use crate::domain::provider::ProxyConfig;

/// Default per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a client, routing all traffic through the proxy when enabled
pub fn build_client(proxy: &ProxyConfig, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(url) = proxy.url() {
        let proxy_cfg = reqwest::Proxy::all(&url)
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid proxy: {}", e)))?;
        builder = builder.proxy(proxy_cfg);
        info!(kind = ?proxy.kind, host = %proxy.redacted(), "using proxy");
    }

    builder
        .build()
        .map_err(|e| ProviderError::Transient(format!("failed to build HTTP client: {}", e)))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Human-readable message from a provider error body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope.error.message.unwrap_or_default();
            match envelope.error.status {
                Some(status) if !message.contains(&status) => format!("{} ({})", message, status),
                _ => message,
            }
        }
        Err(_) => body.chars().take(200).collect(),
    }
}

/// Map a non-success HTTP response to the provider error taxonomy
pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = error_message(body);
    let lower = message.to_lowercase();

    match status.as_u16() {
        401 | 403 => ProviderError::InvalidApiKey(message),
        429 => ProviderError::RateLimited(message),
        404 => ProviderError::ModelNotFound(message),
        // Gemini reports bad keys as 400 INVALID_ARGUMENT
        400 if lower.contains("api key") || lower.contains("api_key_invalid") => {
            ProviderError::InvalidApiKey(message)
        }
        408 | 500..=599 => ProviderError::Transient(format!("HTTP {}: {}", status.as_u16(), message)),
        _ if lower.contains("quota") || lower.contains("resource_exhausted") => {
            ProviderError::RateLimited(message)
        }
        code => ProviderError::Api {
            status: code,
            message,
        },
    }
}

/// Map a transport failure; raw reqwest errors stop here
pub fn classify_transport(err: reqwest::Error) -> ProviderError {
    if err.is_decode() {
        ProviderError::InvalidResponse(err.to_string())
    } else if err.is_timeout() {
        ProviderError::Transient(format!("request timed out: {}", err))
    } else {
        ProviderError::Transient(err.to_string())
    }
}

/// Send a request and decode a JSON body, aborting when `cancel` fires
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<T, ProviderError> {
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        response = request.send() => response.map_err(classify_transport)?,
    };

    let status = response.status();
    let body = tokio::select! {
        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        body = response.text() => body.map_err(classify_transport)?,
    };
    debug!(status = status.as_u16(), bytes = body.len(), "provider response");

    if !status.is_success() {
        return Err(classify_status(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_auth_and_quota() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            ProviderError::InvalidApiKey(_)
        ));
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_quota());
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            ProviderError::Transient(_)
        ));
    }

    #[test]
    fn gemini_invalid_key_is_auth() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_status(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ProviderError::InvalidApiKey(m) if m.contains("API key not valid")));
    }

    #[test]
    fn quota_text_in_other_status_is_rate_limit() {
        let body = r#"{"error":{"message":"You exceeded your current quota","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(!classify_status(StatusCode::FORBIDDEN, body).is_quota());
        assert!(classify_status(StatusCode::BAD_REQUEST, body).is_quota());
    }

    #[test]
    fn unknown_status_keeps_code() {
        let err = classify_status(StatusCode::IM_A_TEAPOT, "short and stout");
        assert!(matches!(err, ProviderError::Api { status: 418, .. }));
    }

    #[test]
    fn join_url_trims_slashes() {
        assert_eq!(join_url("http://x/v1/", "/chat/completions"), "http://x/v1/chat/completions");
    }

    #[test]
    fn client_builds_with_proxy() {
        let proxy = ProxyConfig {
            enabled: true,
            kind: crate::domain::provider::ProxyKind::Http,
            connection_string: "user:pw@127.0.0.1:8080".to_string(),
        };
        assert!(build_client(&proxy, REQUEST_TIMEOUT).is_ok());
    }
}
