use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// RouteTableError
///
/// Raised while building the static route table. A table that fails to build
/// is a programming error and is surfaced at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },
}

/// SessionError
///
/// Failures of the key-value session store. The guard never sees these: a
/// failed read degrades to an anonymous session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// NavigationError
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation to `{0}` exceeded the redirect limit")]
    RedirectLoop(String),
}

/// ProxyError
///
/// Everything that can go wrong while forwarding a request to the booking
/// backend. Each variant maps onto the status code returned to the browser.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("GET requests cannot have a body")]
    GetWithBody,

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    UnreadableBody(String),

    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::GetWithBody => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
