// Log-stream consumption for the supervised daemon
//
// Reader tasks pump each complete stdout/stderr line into a channel; one
// parser task forwards the lines to the tracing subscriber and scans
// stdout for the daemon's advertised public address. Parsing is
// line-local: a line without a match simply produces no notification.

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

/// Which pipe a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// One line of daemon output. Ephemeral: consumed once by the parser
/// task, then discarded.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub stream: LogStream,
    pub text: String,
}

/// First whitespace-delimited `addr=<value>` token on a line.
static ADDR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"addr=(\S+)").expect("addr pattern is valid")
});

/// Extracts the advertised public address from a structured log line, if
/// the line carries one. First match wins.
pub fn extract_addr(line: &str) -> Option<&str> {
    ADDR_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Attaches reader tasks to the daemon's piped output and a parser task
/// consuming them. Address values found on stdout are published through
/// `addr_tx` (latest-value semantics, any number of subscribers). All
/// tasks end when the pipes reach EOF.
pub(crate) fn spawn_pumps<O, E>(stdout: O, stderr: E, addr_tx: watch::Sender<Option<String>>)
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let (line_tx, line_rx) = mpsc::channel::<LogLine>(256);

    tokio::spawn(pump_lines(stdout, LogStream::Stdout, line_tx.clone()));
    tokio::spawn(pump_lines(stderr, LogStream::Stderr, line_tx));
    tokio::spawn(parse_lines(line_rx, addr_tx));
}

/// Forwards each complete line of one pipe into the shared channel, in
/// the order the daemon emitted it.
async fn pump_lines<R>(reader: R, stream: LogStream, line_tx: mpsc::Sender<LogLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(text)) = lines.next_line().await {
        if line_tx.send(LogLine { stream, text }).await.is_err() {
            break;
        }
    }
}

/// Single consumer of both pipes: re-emits every non-blank line through
/// tracing (stderr at error level, stdout at debug) and publishes
/// `addr=` values found on stdout.
async fn parse_lines(
    mut line_rx: mpsc::Receiver<LogLine>,
    addr_tx: watch::Sender<Option<String>>,
) {
    while let Some(line) = line_rx.recv().await {
        if line.text.trim().is_empty() {
            continue;
        }

        match line.stream {
            LogStream::Stderr => error!(target: "ngrok", "{}", line.text),
            LogStream::Stdout => {
                debug!(target: "ngrok", "{}", line.text);
                if let Some(addr) = extract_addr(&line.text) {
                    addr_tx.send_replace(Some(addr.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;

    use super::*;

    #[test]
    fn extract_addr_finds_the_token() {
        let line = "t=2021-01-01T12:00:00+0100 lvl=info msg=\"starting web service\" \
                    obj=web addr=http://localhost:30000";
        assert_eq!(extract_addr(line), Some("http://localhost:30000"));
    }

    #[test]
    fn extract_addr_takes_the_first_match() {
        assert_eq!(extract_addr("addr=first addr=second"), Some("first"));
    }

    #[test]
    fn extract_addr_ignores_lines_without_the_token() {
        assert_eq!(extract_addr("lvl=info msg=\"client session established\""), None);
        assert_eq!(extract_addr(""), None);
    }

    #[tokio::test]
    async fn stdout_addr_lines_reach_the_watch_channel() {
        let (mut stdout_wr, stdout_rd) = tokio::io::duplex(1024);
        let (stderr_wr, stderr_rd) = tokio::io::duplex(64);
        let (addr_tx, mut addr_rx) = watch::channel(None);

        spawn_pumps(stdout_rd, stderr_rd, addr_tx);

        stdout_wr
            .write_all(b"lvl=info msg=start\nlvl=info obj=web addr=http://localhost:30000\n")
            .await
            .unwrap();
        drop(stdout_wr);
        drop(stderr_wr);

        tokio::time::timeout(Duration::from_secs(2), addr_rx.changed())
            .await
            .expect("address published before EOF")
            .unwrap();
        assert_eq!(
            addr_rx.borrow().as_deref(),
            Some("http://localhost:30000")
        );
    }

    #[tokio::test]
    async fn lines_without_addr_publish_nothing() {
        let (mut stdout_wr, stdout_rd) = tokio::io::duplex(1024);
        let (stderr_wr, stderr_rd) = tokio::io::duplex(64);
        let (addr_tx, mut addr_rx) = watch::channel(None);

        spawn_pumps(stdout_rd, stderr_rd, addr_tx);

        stdout_wr
            .write_all(b"lvl=info msg=\"tunnel session started\"\n\n")
            .await
            .unwrap();
        drop(stdout_wr);
        drop(stderr_wr);

        let changed = tokio::time::timeout(Duration::from_millis(300), addr_rx.changed()).await;
        assert!(changed.is_err(), "no notification expected");
        assert!(addr_rx.borrow().is_none());
    }

    #[tokio::test]
    async fn stderr_lines_do_not_publish_addresses() {
        let (stdout_wr, stdout_rd) = tokio::io::duplex(64);
        let (mut stderr_wr, stderr_rd) = tokio::io::duplex(1024);
        let (addr_tx, mut addr_rx) = watch::channel(None);

        spawn_pumps(stdout_rd, stderr_rd, addr_tx);

        stderr_wr
            .write_all(b"panic: addr=http://localhost:9999\n")
            .await
            .unwrap();
        drop(stdout_wr);
        drop(stderr_wr);

        let changed = tokio::time::timeout(Duration::from_millis(300), addr_rx.changed()).await;
        assert!(changed.is_err(), "stderr is logged but never scanned");
    }
}
