//! Pumps subprocess pipes into record buffers

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::record::{AgentRecord, OutputStream};

const READ_CHUNK: usize = 8 * 1024;

/// Read `reader` to EOF, appending every chunk to `stream` of `record`
pub(crate) async fn pump<R>(mut reader: R, record: Arc<AgentRecord>, stream: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    let mut decoder = Utf8Decoder::default();

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                if !text.is_empty() {
                    record.append(stream, &text);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(
                    agent_id = %record.id(),
                    stream = stream.as_str(),
                    error = %e,
                    "Failed reading agent output"
                );
                break;
            }
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        record.append(stream, &tail);
    }
    tracing::trace!(agent_id = %record.id(), stream = stream.as_str(), "Output stream closed");
}

/// Incremental UTF-8 decoder
///
/// Pipe reads can split a multi-byte character; the incomplete tail is held
/// back until the next read. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    out.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is still pending at EOF
    fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}
