//! Domain logic exposed over the MCP protocol
//!
//! Provides the text analyzer and the tool host wrapping it.

pub mod analyzer;
pub mod tools;
