//! Error kinds for upstream calls.
//!
//! Every client call returns [`SyncError`] so the pipeline can decide per
//! variant whether a record is skipped, left unmatched, or still marked
//! processed. An empty search result is not an error: matchers return
//! `Ok(None)`.

use thiserror::Error;

/// The upstream service a call was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Registry,
    AwardSearch,
    TokenEndpoint,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Service::Registry => "DMP registry",
            Service::AwardSearch => "award search",
            Service::TokenEndpoint => "token endpoint",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("authentication failed: token endpoint returned {status}: {detail}")]
    AuthenticationFailure { status: u16, detail: String },

    #[error("{service} unavailable: {detail}")]
    UpstreamUnavailable {
        service: Service,
        status: Option<u16>,
        detail: String,
    },

    #[error("malformed {service} response: {detail}")]
    MalformedResponse { service: Service, detail: String },

    #[error("write-back to {target} rejected with HTTP {status}: {body}")]
    WriteBackRejected {
        target: String,
        status: u16,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// A transport-level failure (connect, timeout, TLS) talking to `service`.
    pub fn transport(service: Service, err: reqwest::Error) -> Self {
        SyncError::UpstreamUnavailable {
            service,
            status: None,
            detail: err.to_string(),
        }
    }

    /// A non-success HTTP status from `service`.
    pub fn status(service: Service, status: reqwest::StatusCode, body: &str) -> Self {
        SyncError::UpstreamUnavailable {
            service,
            status: Some(status.as_u16()),
            detail: format!("HTTP {}: {}", status, truncate(body, 500)),
        }
    }

    pub fn malformed(service: Service, detail: impl std::fmt::Display) -> Self {
        SyncError::MalformedResponse {
            service,
            detail: detail.to_string(),
        }
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_service() {
        let err = SyncError::status(
            Service::AwardSearch,
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "down for maintenance",
        );
        let msg = err.to_string();
        assert!(msg.starts_with("award search unavailable"), "{}", msg);
        assert!(msg.contains("503"));
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
