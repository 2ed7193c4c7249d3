//! Purpose: Define the crate-wide error value returned by every fallible operation.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Single failure channel that keeps the four failure classes apart.
//! Invariants: Classified API failures travel only under `ErrorKind::Api`.
//! Invariants: Transport and decode faults never carry an `ApiError`.
use super::api_error::ApiError;
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Request shape violated a constraint; nothing was dispatched.
    InvalidRequest,
    /// The service answered with an error payload.
    Api,
    /// Network, timeout, or HTTP-level fault reported by the transport.
    Transport,
    /// The payload was not JSON or did not match the declared shape.
    Decode,
    Usage,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    api: Option<Box<ApiError>>,
    status: Option<u16>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            api: None,
            status: None,
            source: None,
        }
    }

    pub fn api(err: ApiError) -> Self {
        let message = err.to_string();
        Self {
            kind: ErrorKind::Api,
            message: Some(message),
            hint: None,
            api: Some(Box::new(err)),
            status: None,
            source: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest).with_message(message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// HTTP status when the transport saw a non-success response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        self.api.as_deref()
    }

    pub fn into_api_error(self) -> Option<ApiError> {
        self.api.map(|err| *err)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        if let Some(api) = &self.api {
            return Some(api.as_ref() as &(dyn StdError + 'static));
        }
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::InvalidRequest => 3,
        ErrorKind::Api => 4,
        ErrorKind::Transport => 5,
        ErrorKind::Decode => 6,
    }
}
