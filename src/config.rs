use std::net::{Ipv4Addr, SocketAddr};

use clap::{Parser, ValueEnum};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;

/// Transport carrying MCP messages between client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Serve over the process standard streams
    Stdio,
    /// Serve over HTTP with a GET event-stream endpoint and a POST message endpoint
    Sse,
}

/// MCP server exposing the `info-extractor` text analysis tool
#[derive(Debug, Clone, Parser)]
#[command(name = "mcp-info-extractor-server")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on for SSE
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Transport type
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidSocket);
        }

        Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn parse_defaults() {
        let config =
            Config::try_parse_from(["mcp-info-extractor-server"]).expect("config should parse");

        assert_eq!(config.port, 8000);
        assert_eq!(config.transport, Transport::Stdio);
    }

    #[test]
    fn parse_sse_with_port() {
        let config = Config::try_parse_from([
            "mcp-info-extractor-server",
            "--transport",
            "sse",
            "--port",
            "9123",
        ])
        .expect("config should parse");

        assert_eq!(config.transport, Transport::Sse);
        assert_eq!(
            config.bind_socket().expect("valid socket"),
            "127.0.0.1:9123".parse::<SocketAddr>().expect("socket literal")
        );
    }

    #[test]
    fn unknown_transport_fails() {
        let err = Config::try_parse_from(["mcp-info-extractor-server", "--transport", "websocket"])
            .expect_err("expected invalid transport");
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn invalid_port_fails() {
        let result = Config::try_parse_from(["mcp-info-extractor-server", "--port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_port_has_no_bind_socket() {
        let config = Config::try_parse_from(["mcp-info-extractor-server", "--port", "0"])
            .expect("config should parse");

        assert!(matches!(config.bind_socket(), Err(ConfigError::InvalidSocket)));
    }
}
