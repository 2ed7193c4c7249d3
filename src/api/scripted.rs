//! Purpose: Deterministic in-memory transport for tests and offline callers.
//! Exports: `ScriptedTransport`.
//! Role: Replays queued payloads in order and records every request it receives.
//! Invariants: One queued entry is consumed per `execute`; an empty queue is a transport fault.
//! Invariants: Recorded requests are exact copies of what the client dispatched.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, Request};
use super::transport::{Format, Reply, Transport};
use crate::core::api_error::RawApiError;
use crate::core::error::{Error, ErrorKind};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

type DispatchHook = Box<dyn Fn(usize) + Send + Sync>;

enum Scripted {
    Payload(Value),
    Failure(RawApiError),
    Fault(ErrorKind, String),
}

#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(Request, Format)>>,
    hook: Option<DispatchHook>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw payload; an `error` key makes it an API failure.
    pub fn push_payload(self, payload: Value) -> Self {
        self.push(Scripted::Payload(payload))
    }

    pub fn push_error(self, code: &str, info: &str) -> Self {
        self.push(Scripted::Failure(RawApiError::new(code, info)))
    }

    pub fn push_fault(self, kind: ErrorKind, message: &str) -> Self {
        self.push(Scripted::Fault(kind, message.to_string()))
    }

    /// Runs `hook` with the 1-based call number after each dispatch.
    pub fn on_dispatch(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<Request> {
        lock(&self.calls)
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub fn formats(&self) -> Vec<Format> {
        lock(&self.calls).iter().map(|(_, format)| *format).collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.queue).len()
    }

    fn push(self, entry: Scripted) -> Self {
        lock(&self.queue).push_back(entry);
        self
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &Request, format: Format) -> ApiResult<Reply> {
        let call = {
            let mut calls = lock(&self.calls);
            calls.push((request.clone(), format));
            calls.len()
        };
        let entry = lock(&self.queue).pop_front();
        if let Some(hook) = &self.hook {
            hook(call);
        }
        match entry {
            Some(Scripted::Payload(payload)) => Reply::from_payload(payload),
            Some(Scripted::Failure(raw)) => Ok(Reply::Failure(raw)),
            Some(Scripted::Fault(kind, message)) => Err(Error::new(kind).with_message(message)),
            None => Err(Error::new(ErrorKind::Transport)
                .with_message(format!("no scripted reply for call {call}"))),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}
