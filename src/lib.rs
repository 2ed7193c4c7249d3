//! Purpose: Library crate behind the `wikiquery` CLI and integration tests.
//! Exports: `core` (parameters, exclusivity, pages, error classification) and `api` (client surface).
//! Role: Typed access to a wiki's query/action API over a pluggable transport.
//! Invariants: `core` performs no I/O; all network access goes through `api::Transport`.
//! Invariants: The crate holds no process-wide state.
pub mod api;
pub mod core;
