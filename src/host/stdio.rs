//! Stdin/stdout JSON bridge for model replies.
//!
//! Reads newline-delimited JSON `ReplyEnvelope` messages from stdin,
//! runs each through a [`ReplyHandler`], and writes one `ResponseEnvelope`
//! per input line as newline-delimited JSON to stdout.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use crate::dispatch::DirectivePublisher;
use crate::host::handler::ReplyHandler;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

/// Counters reported when the bridge stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Non-blank lines handled.
    pub handled: usize,
    /// Responses with `ok: false`.
    pub failed: usize,
}

/// Run the bridge over the process stdin/stdout until stdin closes.
pub async fn run_stdio_bridge<P: DirectivePublisher>(
    handler: &ReplyHandler<P>,
) -> crate::Result<BridgeStats> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    run_bridge(handler, reader, writer).await
}

/// Run the bridge over any line reader and writer until EOF.
pub async fn run_bridge<P, R, W>(
    handler: &ReplyHandler<P>,
    mut reader: R,
    mut writer: W,
) -> crate::Result<BridgeStats>
where
    P: DirectivePublisher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = BridgeStats::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| crate::SolError::Channel(format!("failed to read from stdin: {e}")))?;

        // EOF
        if bytes_read == 0 {
            tracing::info!(
                handled = stats.handled,
                failed = stats.failed,
                "input closed (EOF); shutting down bridge"
            );
            break;
        }

        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let response = handler.handle_bytes(trimmed);
        stats.handled += 1;
        if !response.ok {
            stats.failed += 1;
        }

        let json = serde_json::to_string(&response).map_err(|e| {
            crate::SolError::Serialize(format!("failed to serialize response envelope: {e}"))
        })?;
        write_line(&mut writer, &json).await?;
    }

    Ok(stats)
}

/// Write a single JSON line and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> crate::Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| crate::SolError::Channel(format!("failed to write to stdout: {e}")))?;
    writer.write_all(b"\n").await.map_err(|e| {
        crate::SolError::Channel(format!("failed to write newline to stdout: {e}"))
    })?;
    writer
        .flush()
        .await
        .map_err(|e| crate::SolError::Channel(format!("failed to flush stdout: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolConfig;
    use crate::dispatch::NoopPublisher;
    use crate::host::contract::ResponseEnvelope;

    #[tokio::test]
    async fn one_response_per_non_blank_line() {
        let handler = ReplyHandler::from_config(&SolConfig::default(), NoopPublisher);
        let input = concat!(
            r#"{"v":1,"request_id":"a","reply":"Hello!"}"#,
            "\n\n",
            r#"{"v":1,"request_id":"b","reply":"```action:control,device:led,state:OFF```"}"#,
            "\n",
            "garbage\n",
        );
        let mut output = Vec::new();

        let stats = run_bridge(&handler, input.as_bytes(), &mut output)
            .await
            .expect("bridge run");
        assert_eq!(
            stats,
            BridgeStats {
                handled: 3,
                failed: 1
            }
        );

        let text = String::from_utf8(output).expect("utf-8 output");
        let responses: Vec<ResponseEnvelope> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("response line is JSON"))
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].request_id, "a");
        assert_eq!(responses[1].payload["kind"], "control");
        assert!(!responses[2].ok);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_stop_the_bridge() {
        let handler = ReplyHandler::from_config(&SolConfig::default(), NoopPublisher);
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(br#"{"v":1,"request_id":"b","reply":"hi"}"#);
        input.push(b'\n');
        let mut output = Vec::new();

        let stats = run_bridge(&handler, input.as_slice(), &mut output)
            .await
            .expect("bridge run");
        assert_eq!(
            stats,
            BridgeStats {
                handled: 2,
                failed: 1
            }
        );

        let text = String::from_utf8(output).expect("utf-8 output");
        let responses: Vec<ResponseEnvelope> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("response line is JSON"))
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].request_id, crate::host::contract::PARSE_ERROR_ID);
        assert!(!responses[0].ok);
        assert_eq!(responses[1].request_id, "b");
        assert!(responses[1].ok);
    }
}
