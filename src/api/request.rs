//! Purpose: Build validated, immutable requests for the transport.
//! Exports: `Request`, `RequestBuilder`, `Method`, `ListQuery`, `Limit`, `Direction`, `TimeDirection`.
//! Role: The only way to obtain a `Request`; every path runs the exclusivity check.
//! Invariants: A `Request` that exists has passed `exclusive::validate`.
//! Invariants: Requests never carry `format`/`formatversion`; transports add them.
#![allow(clippy::result_large_err)]

use crate::core::api_error::ClassifyContext;
use crate::core::error::Error;
use crate::core::exclusive;
use crate::core::page::Continuation;
use crate::core::params::{ParamValue, Params, TokenType};
use serde::de::DeserializeOwned;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    method: Method,
    params: Params,
    token_type: Option<TokenType>,
}

impl Request {
    pub fn get(action: &str) -> RequestBuilder {
        RequestBuilder::new(Method::Get, action)
    }

    pub fn post(action: &str) -> RequestBuilder {
        RequestBuilder::new(Method::Post, action)
    }

    /// Validates a fully assembled parameter map.
    pub fn from_params(method: Method, params: Params) -> ApiResult<Self> {
        if params.text("action").is_none() {
            return Err(Error::invalid_request("request is missing an action"));
        }
        exclusive::validate(&params)?;
        let method = if params.has_files() {
            Method::Post
        } else {
            method
        };
        Ok(Self {
            method,
            params,
            token_type: None,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn action(&self) -> &str {
        self.params.text("action").unwrap_or_default()
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.token_type
    }

    /// The originating request with every continuation field written over it.
    pub fn continued(&self, continuation: &Continuation) -> Request {
        Request {
            method: self.method,
            params: self.params.overlay(continuation.fields()),
            token_type: self.token_type,
        }
    }

    pub fn classify_context(&self) -> ClassifyContext {
        let text = |key: &str| self.params.text(key).map(str::to_string);
        let module = ["list", "prop", "meta"]
            .into_iter()
            .find_map(|key| text(key))
            .or_else(|| text("action"));
        ClassifyContext {
            title: text("title").or_else(|| text("from")).or_else(|| text("cmtitle")),
            target: text("to"),
            token_type: self.token_type,
            module,
            filename: text("filename"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RequestBuilder {
    method: Method,
    params: Params,
    token_type: Option<TokenType>,
}

impl RequestBuilder {
    fn new(method: Method, action: &str) -> Self {
        Self {
            method,
            params: Params::new().with("action", action),
            token_type: None,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn opt<V: Into<ParamValue>>(mut self, key: &str, value: Option<V>) -> Self {
        self.params = self.params.with_opt(key, value);
        self
    }

    /// Sets a boolean flag only when it is `true`.
    pub fn flag(self, key: &str, value: bool) -> Self {
        if value { self.param(key, true) } else { self }
    }

    /// Attaches a token value under `key` and records its type for error context.
    pub fn token(mut self, key: &str, token_type: TokenType, value: &str) -> Self {
        self.params.insert(key, value);
        self.token_type = Some(token_type);
        self
    }

    pub fn build(self) -> ApiResult<Request> {
        let mut request = Request::from_params(self.method, self.params)?;
        request.token_type = self.token_type;
        Ok(request)
    }
}

/// A query whose results page through `${shortname}continue`.
pub trait ListQuery {
    type Item: DeserializeOwned;

    /// Parameter prefix, e.g. `ac` for `list=allcategories`.
    fn shortname(&self) -> &str;

    /// Key under `query` holding the item sequence.
    fn result_key(&self) -> &str;

    fn to_request(&self) -> ApiResult<Request>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Limit {
    Max,
    Count(u32),
}

impl From<Limit> for ParamValue {
    fn from(value: Limit) -> Self {
        match value {
            Limit::Max => ParamValue::Text("max".to_string()),
            Limit::Count(count) => ParamValue::from(count),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

impl From<Direction> for ParamValue {
    fn from(value: Direction) -> Self {
        ParamValue::from(value.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeDirection {
    Newer,
    Older,
}

impl TimeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeDirection::Newer => "newer",
            TimeDirection::Older => "older",
        }
    }
}

impl From<TimeDirection> for ParamValue {
    fn from(value: TimeDirection) -> Self {
        ParamValue::from(value.as_str())
    }
}
