//! Standard input/output transport
//!
//! Reads newline-delimited JSON-RPC messages and writes one response per line,
//! in request order, until the input stream closes.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{info, warn};

use crate::domain::tools::ToolHost;
use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_payload;

pub async fn run_stdio(host: &dyn ToolHost) -> io::Result<()> {
    info!("serving over stdio");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    serve(host, reader, writer).await?;
    info!("stdin closed, shutting down");
    Ok(())
}

pub async fn serve<R, W>(host: &dyn ToolHost, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(payload) => handle_json_rpc_payload(host, payload).await,
            Err(err) => {
                warn!(error = %err, "discarding unparseable stdio message");
                Some(json_rpc_error(None, PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = response {
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::tools::InfoExtractor;

    async fn exchange(input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve(&InfoExtractor::new(), input.as_bytes(), &mut output)
            .await
            .expect("stdio exchange");

        String::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn answers_requests_in_order() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","clientInfo":{"name":"cli","version":"0.1"},"capabilities":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"info-extractor","arguments":{"text":"!!!"}}}"#,
            "\n",
        );

        let responses = exchange(input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["tools"][0]["name"], "info-extractor");
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(
            responses[2]["result"]["content"][0]["text"],
            "--- Analysis Complete ---\nCharacter Count: 3\nWord Count: 0\nSentence Count: 3\nEstimated Reading Time: 0.0 minutes"
        );
    }

    #[tokio::test]
    async fn keeps_serving_after_errors() {
        let input = concat!(
            "not json\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"unknown-tool","arguments":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );

        let responses = exchange(input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["result"]["isError"], true);
        assert_eq!(responses[2], json!({ "jsonrpc": "2.0", "id": 2, "result": {} }));
    }

    #[tokio::test]
    async fn empty_input_ends_cleanly() {
        assert!(exchange("").await.is_empty());
    }
}
