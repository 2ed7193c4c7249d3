//! Purpose: Define the public Rust API boundary for the wiki client.
//! Exports: `WikiClient`, transports, request shapes, paging, and error types.
//! Role: Stable surface for the CLI and library callers; `core` stays I/O-free underneath.
//! Invariants: Operation catalogs live in `actions`, `queries`, `meta`, and `search`.
//! Invariants: Every `Request` reachable from here has passed the exclusivity check.

pub mod actions;
mod client;
pub mod meta;
mod pager;
pub mod queries;
mod remote;
mod request;
mod scripted;
pub mod search;
mod transport;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::api_error::{ApiError, ClassifyContext, RawApiError, classify};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::exclusive::ExclusiveGroup;
pub use crate::core::page::{AuxSections, Aggregate, Continuation, ListPage};
pub use crate::core::params::{FilePart, ParamValue, Params, TokenType};
pub use client::WikiClient;
pub use pager::{
    CancelToken, DEFAULT_MAX_PAGES, DrainOptions, DrainOutcome, Interruption, MergeMode, Paged,
    Pager,
};
pub use remote::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpTransport};
pub use request::{ApiResult, Direction, Limit, ListQuery, Method, Request, RequestBuilder, TimeDirection};
pub use scripted::ScriptedTransport;
pub use transport::{Format, Reply, Transport};
