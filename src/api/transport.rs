//! Purpose: Define the seam between the typed client and whatever moves bytes.
//! Exports: `Transport`, `Format`, `Reply`.
//! Role: Collaborator contract; the client never touches the network directly.
//! Invariants: `Err` from `execute` is always a transport or decode fault.
//! Invariants: API error payloads come back as `Reply::Failure`, never as `Err`.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, Request};
use crate::core::api_error::RawApiError;
use serde_json::Value;
use std::sync::Arc;

/// Wire format directive. Only structured JSON with version 2 field shapes is spoken.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    JsonV2,
}

impl Format {
    /// Parameters a transport appends to every request.
    pub fn params(self) -> [(&'static str, &'static str); 2] {
        match self {
            Format::JsonV2 => [("format", "json"), ("formatversion", "2")],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Success(Value),
    Failure(RawApiError),
}

impl Reply {
    /// Splits a decoded payload on its top-level `error` key.
    pub fn from_payload(payload: Value) -> ApiResult<Self> {
        match RawApiError::from_payload(&payload)? {
            Some(raw) => Ok(Reply::Failure(raw)),
            None => Ok(Reply::Success(payload)),
        }
    }
}

pub trait Transport {
    fn execute(&self, request: &Request, format: Format) -> ApiResult<Reply>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &Request, format: Format) -> ApiResult<Reply> {
        (**self).execute(request, format)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &Request, format: Format) -> ApiResult<Reply> {
        (**self).execute(request, format)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &Request, format: Format) -> ApiResult<Reply> {
        (**self).execute(request, format)
    }
}
