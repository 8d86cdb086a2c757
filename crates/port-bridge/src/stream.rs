//! # Stream Ports
//!
//! Newline-delimited JSON over any byte stream (TCP socket, stdio pipe).
//! One reader task parses inbound lines; one writer task flushes outbound
//! lines in post order.
//!
//! Inbound lines are handled as raw bytes. A line that is not UTF-8, not
//! JSON, or longer than [`MAX_LINE_BYTES`] is dropped on its own; only EOF or
//! an I/O error ends the inbound stream.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::WireMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::TransportError;
use crate::port::{Port, PortSink};

/// Longest inbound line accepted, newline excluded.
pub const MAX_LINE_BYTES: usize = 1 << 20;

struct StreamSink {
    name: String,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl PortSink for StreamSink {
    fn post(&self, message: WireMessage) -> Result<(), TransportError> {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');

        let outbound = self.outbound.lock();
        let sender = outbound.as_ref().ok_or(TransportError::Disconnected)?;
        sender.send(line).map_err(|_| TransportError::Disconnected)
    }

    fn close(&self) {
        if self.outbound.lock().take().is_some() {
            debug!(port = %self.name, "Stream port closed");
        }
    }

    fn is_open(&self) -> bool {
        self.outbound
            .lock()
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }
}

/// Build a port over a reader/writer pair.
///
/// Must be called from within a tokio runtime. Lines that do not parse as a
/// wire message are logged and skipped. The inbound stream ends at EOF or on
/// a read error; closing the sink flushes pending lines and shuts the writer
/// down.
pub fn port_from_stream<R, W>(name: &str, reader: R, writer: W) -> Port
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(write_lines(name.to_string(), writer, outbound_rx));
    tokio::spawn(read_lines(name.to_string(), reader, inbound_tx));

    let sink = Arc::new(StreamSink {
        name: name.to_string(),
        outbound: Mutex::new(Some(outbound_tx)),
    });
    Port::new(name, sink, inbound_rx)
}

async fn write_lines<W>(name: String, mut writer: W, mut outbound: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = outbound.recv().await {
        let written = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            warn!(port = %name, error = %err, "Stream write failed, closing outbound half");
            return;
        }
    }

    if let Err(err) = writer.shutdown().await {
        debug!(port = %name, error = %err, "Stream shutdown failed");
    }
    debug!(port = %name, "Stream writer finished");
}

enum Frame {
    Line,
    Oversized(usize),
    Eof,
}

/// Read one newline-terminated frame into `buf`, discarding the bytes of a
/// frame that grows past [`MAX_LINE_BYTES`].
async fn next_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut discarded = 0usize;
    loop {
        let (used, terminated) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(match (discarded, buf.is_empty()) {
                    (0, true) => Frame::Eof,
                    (0, false) => Frame::Line,
                    (len, _) => Frame::Oversized(len),
                });
            }
            let newline = available.iter().position(|byte| *byte == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            if discarded == 0 && buf.len() + chunk.len() <= MAX_LINE_BYTES {
                buf.extend_from_slice(chunk);
            } else {
                discarded += buf.len() + chunk.len();
                buf.clear();
            }
            (chunk.len() + usize::from(newline.is_some()), newline.is_some())
        };
        reader.consume(used);

        if terminated {
            return Ok(if discarded == 0 {
                Frame::Line
            } else {
                Frame::Oversized(discarded)
            });
        }
    }
}

async fn read_lines<R>(name: String, reader: R, inbound: mpsc::UnboundedSender<WireMessage>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        match next_frame(&mut reader, &mut line).await {
            Ok(Frame::Line) => {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                match WireMessage::from_json_bytes(&line) {
                    Ok(message) => {
                        if inbound.send(message).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(port = %name, error = %err, "Skipping malformed line");
                    }
                }
            }
            Ok(Frame::Oversized(len)) => {
                warn!(port = %name, len, limit = MAX_LINE_BYTES, "Skipping oversized line");
            }
            Ok(Frame::Eof) => break,
            Err(err) => {
                warn!(port = %name, error = %err, "Stream read failed");
                break;
            }
        }
    }
    debug!(port = %name, "Stream reader finished");
}
