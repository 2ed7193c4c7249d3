//! Purpose: Caller-facing client: one function per operation plus the paging entry points.
//! Exports: `WikiClient`.
//! Role: Glue between typed shapes, a `Transport`, the classifier, and the `Pager`.
//! Invariants: Every API failure reaching the caller has been classified with request context.
//! Invariants: Nothing is retried; `BadToken` and friends are surfaced as-is.
#![allow(clippy::result_large_err)]

use super::actions::{
    Action, Block, BlockResult, Delete, DeleteResult, Edit, EditResult, Login, LoginSuccess, Move,
    MoveResult, Parse, ParseResult, Protect, ProtectResult, Purge, PurgeEntry, Upload,
    UploadResult, decode_result,
};
use super::meta::{
    FileRepo, FileRepoInfoRequest, SiteInfo, SiteInfoRequest, Tokens, TokensRequest, UserInfo,
    decode_query_section, userinfo_request,
};
use super::pager::{DrainOptions, DrainOutcome, MergeMode, Paged, Pager};
use super::request::{ApiResult, ListQuery, Request};
use super::search::{OpenSearch, OpenSearchResult};
use super::transport::{Format, Reply, Transport};
use crate::core::api_error::{LOGIN_FAILED_CODE, RawApiError, classify};
use crate::core::error::{Error, ErrorKind};
use crate::core::page::{Continuation, ListPage};
use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct WikiClient<T> {
    transport: T,
}

impl<T: Transport> WikiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Dispatches one request and returns the success payload.
    pub fn call(&self, request: &Request) -> ApiResult<Value> {
        match self.transport.execute(request, Format::JsonV2)? {
            Reply::Success(payload) => Ok(payload),
            Reply::Failure(raw) => {
                tracing::debug!(action = request.action(), code = %raw.code, "api call failed");
                Err(Error::api(classify(&raw, &request.classify_context())))
            }
        }
    }

    /// Runs a single-result action and decodes the object under its action key.
    pub fn perform<A: Action>(&self, action: &A) -> ApiResult<A::Output> {
        let request = action.to_request()?;
        let payload = self.call(&request)?;
        decode_result(payload, action.action_key())
    }

    pub fn edit(&self, edit: &Edit) -> ApiResult<EditResult> {
        self.perform(edit)
    }

    pub fn move_page(&self, request: &Move) -> ApiResult<MoveResult> {
        self.perform(request)
    }

    pub fn delete(&self, delete: &Delete) -> ApiResult<DeleteResult> {
        self.perform(delete)
    }

    pub fn protect(&self, protect: &Protect) -> ApiResult<ProtectResult> {
        self.perform(protect)
    }

    pub fn block(&self, block: &Block) -> ApiResult<BlockResult> {
        self.perform(block)
    }

    pub fn upload(&self, upload: &Upload) -> ApiResult<UploadResult> {
        self.perform(upload)
    }

    pub fn parse(&self, parse: &Parse) -> ApiResult<ParseResult> {
        self.perform(parse)
    }

    pub fn purge(&self, purge: &Purge) -> ApiResult<Vec<PurgeEntry>> {
        self.perform(purge)
    }

    /// A non-`Success` login result becomes `ApiError::LoginFailed`.
    pub fn login(&self, login: &Login) -> ApiResult<LoginSuccess> {
        let request = login.to_request()?;
        let payload = self.call(&request)?;
        let outcome: <Login as Action>::Output = decode_result(payload, login.action_key())?;
        outcome.into_success().map_err(|reason| {
            let raw = RawApiError::new(LOGIN_FAILED_CODE, reason);
            Error::api(classify(&raw, &request.classify_context()))
        })
    }

    pub fn tokens(&self, request: &TokensRequest) -> ApiResult<Tokens> {
        let payload = self.call(&request.to_request()?)?;
        decode_query_section(&payload, "tokens")
    }

    pub fn site_info(&self, request: &SiteInfoRequest) -> ApiResult<SiteInfo> {
        let payload = self.call(&request.to_request()?)?;
        let query = payload.get("query").cloned().ok_or_else(|| {
            Error::new(ErrorKind::Decode).with_message("siteinfo response is missing query")
        })?;
        serde_json::from_value(query).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message("unexpected siteinfo shape")
                .with_source(err)
        })
    }

    pub fn user_info(&self) -> ApiResult<UserInfo> {
        let payload = self.call(&userinfo_request()?)?;
        decode_query_section(&payload, "userinfo")
    }

    pub fn file_repos(&self, request: &FileRepoInfoRequest) -> ApiResult<Vec<FileRepo>> {
        let payload = self.call(&request.to_request()?)?;
        decode_query_section(&payload, "repos")
    }

    pub fn search(&self, search: &OpenSearch) -> ApiResult<OpenSearchResult> {
        let payload = self.call(&search.to_request()?)?;
        OpenSearchResult::from_payload(payload)
    }

    /// Pull-based pager over `query`; nothing is dispatched until the first `next_page`.
    pub fn pages<Q>(&self, query: &Q) -> ApiResult<Pager<'_, T, Q::Item>>
    where
        Q: ListQuery + ?Sized,
    {
        Pager::new(&self.transport, query)
    }

    /// Exactly one round-trip, optionally resuming from a handle this query issued.
    pub fn list_page<Q>(
        &self,
        query: &Q,
        resume: Option<&Continuation>,
    ) -> ApiResult<ListPage<Q::Item>>
    where
        Q: ListQuery + ?Sized,
    {
        let mut pager = self.pages(query)?;
        if let Some(continuation) = resume {
            pager = pager.resume_from(continuation.clone())?;
        }
        pager
            .next_page()?
            .ok_or_else(|| Error::new(ErrorKind::Internal).with_message("pager yielded no page"))
    }

    pub fn drain<Q>(&self, query: &Q, options: &DrainOptions) -> ApiResult<DrainOutcome<Q::Item>>
    where
        Q: ListQuery + ?Sized,
    {
        self.pages(query)?.drain(options)
    }

    /// The single higher-order pagination entry point.
    pub fn paginate<Q>(
        &self,
        query: &Q,
        mode: MergeMode,
        options: &DrainOptions,
        resume: Option<&Continuation>,
    ) -> ApiResult<Paged<Q::Item>>
    where
        Q: ListQuery + ?Sized,
    {
        let mut pager = self.pages(query)?;
        if let Some(continuation) = resume {
            pager = pager.resume_from(continuation.clone())?;
        }
        pager.run(mode, options)
    }
}
