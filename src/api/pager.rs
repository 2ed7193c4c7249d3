//! Purpose: Drive list queries through the service's continuation protocol.
//! Exports: `Pager`, `MergeMode`, `Paged`, `DrainOptions`, `DrainOutcome`, `Interruption`, `CancelToken`.
//! Role: Stateful engine around `Transport`; decoding and merging live in `core::page`.
//! Invariants: Exactly one transport call per page; the next request is built only from the previous response.
//! Invariants: Page N+1 = original request overlaid with page N's continuation fields, nothing else.
//! Invariants: Cancellation and limits are checked before each dispatch, never mid-call.
//! Invariants: Any error is terminal; a drain that errors returns no partial result.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, ListQuery, Request};
use super::transport::{Format, Reply, Transport};
use crate::core::api_error::classify;
use crate::core::error::Error;
use crate::core::page::{Aggregate, Continuation, ListPage, continue_key, decode_page, fingerprint};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Upper bound on pages a default drain will fetch.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeMode {
    /// Return the first page and its continuation; the caller decides whether to go on.
    SinglePage,
    /// Follow continuations until the service stops issuing them.
    Drain,
}

/// Shared interruption flag checked between round-trips.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing flag, e.g. one registered with a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct DrainOptions {
    pub max_pages: Option<usize>,
    pub max_items: Option<usize>,
    pub cancel: Option<CancelToken>,
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            max_pages: Some(DEFAULT_MAX_PAGES),
            max_items: None,
            cancel: None,
        }
    }
}

impl DrainOptions {
    /// No page or item cap; only cancellation can stop a misbehaving server.
    pub fn unbounded() -> Self {
        Self {
            max_pages: None,
            max_items: None,
            cancel: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn interruption<T>(&self, partial: &Aggregate<T>) -> Option<Interruption> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(Interruption::Cancelled);
        }
        if self.max_pages.is_some_and(|max| partial.pages >= max) {
            return Some(Interruption::PageLimit);
        }
        if self.max_items.is_some_and(|max| partial.items.len() >= max) {
            return Some(Interruption::ItemLimit);
        }
        None
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interruption {
    Cancelled,
    PageLimit,
    ItemLimit,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DrainOutcome<T> {
    Complete(Aggregate<T>),
    Interrupted {
        partial: Aggregate<T>,
        reason: Interruption,
        /// Where to pick up again; `None` when stopped before the first page.
        resume: Option<Continuation>,
    },
}

impl<T> DrainOutcome<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, DrainOutcome::Complete(_))
    }

    pub fn interruption(&self) -> Option<Interruption> {
        match self {
            DrainOutcome::Complete(_) => None,
            DrainOutcome::Interrupted { reason, .. } => Some(*reason),
        }
    }

    pub fn aggregate(&self) -> &Aggregate<T> {
        match self {
            DrainOutcome::Complete(aggregate) => aggregate,
            DrainOutcome::Interrupted { partial, .. } => partial,
        }
    }

    pub fn into_aggregate(self) -> Aggregate<T> {
        match self {
            DrainOutcome::Complete(aggregate) => aggregate,
            DrainOutcome::Interrupted { partial, .. } => partial,
        }
    }
}

/// Result of the mode-switched pagination entry point.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paged<T> {
    Page(ListPage<T>),
    Drained(DrainOutcome<T>),
}

enum Cursor {
    Start,
    Next(Continuation),
    Done,
}

/// Pull-based page source for one logical list query.
pub struct Pager<'t, T: Transport + ?Sized, I> {
    transport: &'t T,
    base: Request,
    shortname: String,
    result_key: String,
    origin: String,
    cursor: Cursor,
    fetched: usize,
    _item: PhantomData<fn() -> I>,
}

impl<'t, T, I> Pager<'t, T, I>
where
    T: Transport + ?Sized,
    I: DeserializeOwned,
{
    pub fn new<Q>(transport: &'t T, query: &Q) -> ApiResult<Self>
    where
        Q: ListQuery<Item = I> + ?Sized,
    {
        let base = query.to_request()?;
        let origin = fingerprint(base.params());
        Ok(Self {
            transport,
            base,
            shortname: query.shortname().to_string(),
            result_key: query.result_key().to_string(),
            origin,
            cursor: Cursor::Start,
            fetched: 0,
            _item: PhantomData,
        })
    }

    /// Continues from a handle issued for this same query.
    pub fn resume_from(mut self, continuation: Continuation) -> ApiResult<Self> {
        if continuation.origin() != self.origin {
            return Err(Error::invalid_request(
                "continuation was issued for a different request",
            )
            .with_hint("continuation tokens are only valid with the exact request that produced them"));
        }
        let expected = continue_key(&self.shortname);
        if continuation.key() != expected {
            return Err(Error::invalid_request(format!(
                "continuation key {} does not match {expected}",
                continuation.key()
            )));
        }
        self.cursor = Cursor::Next(continuation);
        Ok(self)
    }

    /// Continuation the next call would send, if any.
    pub fn pending(&self) -> Option<&Continuation> {
        match &self.cursor {
            Cursor::Next(continuation) => Some(continuation),
            Cursor::Start | Cursor::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.cursor, Cursor::Done)
    }

    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    pub fn request(&self) -> &Request {
        &self.base
    }

    pub fn next_page(&mut self) -> ApiResult<Option<ListPage<I>>> {
        let request = match &self.cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => self.base.clone(),
            Cursor::Next(continuation) => self.base.continued(continuation),
        };

        tracing::debug!(
            module = %self.shortname,
            page = self.fetched + 1,
            resumed = self.pending().is_some(),
            "dispatching list page"
        );

        match self.fetch(&request) {
            Ok(page) => {
                self.fetched += 1;
                self.cursor = match &page.continuation {
                    Some(continuation) => Cursor::Next(continuation.clone()),
                    None => Cursor::Done,
                };
                Ok(Some(page))
            }
            Err(err) => {
                self.cursor = Cursor::Done;
                Err(err)
            }
        }
    }

    /// Fetches pages until exhaustion, a limit, or cancellation.
    pub fn drain(mut self, options: &DrainOptions) -> ApiResult<DrainOutcome<I>> {
        let mut partial = Aggregate::default();
        loop {
            if self.is_done() {
                return Ok(DrainOutcome::Complete(partial));
            }
            if let Some(reason) = options.interruption(&partial) {
                tracing::warn!(
                    module = %self.shortname,
                    pages = partial.pages,
                    items = partial.items.len(),
                    ?reason,
                    "list drain interrupted"
                );
                return Ok(DrainOutcome::Interrupted {
                    partial,
                    reason,
                    resume: self.pending().cloned(),
                });
            }
            match self.next_page()? {
                Some(page) => {
                    partial.absorb(page);
                }
                None => return Ok(DrainOutcome::Complete(partial)),
            }
        }
    }

    pub fn run(mut self, mode: MergeMode, options: &DrainOptions) -> ApiResult<Paged<I>> {
        match mode {
            MergeMode::SinglePage => match self.next_page()? {
                Some(page) => Ok(Paged::Page(page)),
                None => Err(Error::invalid_request("list query is already exhausted")),
            },
            MergeMode::Drain => self.drain(options).map(Paged::Drained),
        }
    }

    fn fetch(&self, request: &Request) -> ApiResult<ListPage<I>> {
        match self.transport.execute(request, Format::JsonV2)? {
            Reply::Success(payload) => {
                decode_page(payload, &self.shortname, &self.result_key, &self.origin)
            }
            Reply::Failure(raw) => {
                let err = classify(&raw, &self.base.classify_context());
                tracing::debug!(code = %raw.code, module = %self.shortname, "list page failed");
                Err(Error::api(err))
            }
        }
    }
}

impl<T, I> Iterator for Pager<'_, T, I>
where
    T: Transport + ?Sized,
    I: DeserializeOwned,
{
    type Item = ApiResult<ListPage<I>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page().transpose()
    }
}
