//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the SSE event stream, the message submission endpoint and the
//! per-connection session registry tying them together.

pub mod handlers;
pub mod sessions;
