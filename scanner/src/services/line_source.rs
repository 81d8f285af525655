//! Line-oriented payload source
//!
//! Decoders such as `zbarcam --raw` print one payload per line. Lines are
//! read as bytes so a payload that is not valid UTF-8 is converted lossily
//! instead of failing the whole stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use shared::component_warn;
use shared::ComponentId;
use crate::error::ScannerResult;

pub struct LineSource<R> {
    reader: BufReader<R>,
    /// Bytes of the current line; kept across calls so a cancelled read
    /// resumes where it stopped
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buffer: Vec::new(),
        }
    }

    /// Next payload without its line ending, `None` at end of input
    ///
    /// Cancel safe: bytes read before a cancellation stay buffered.
    pub async fn next_payload(&mut self) -> ScannerResult<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
        if read == 0 && self.buffer.is_empty() {
            return Ok(None);
        }

        let line = std::mem::take(&mut self.buffer);
        Ok(Some(decode_line(&line)))
    }
}

/// Strip the line ending and replace invalid UTF-8 sequences
fn decode_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    match String::from_utf8_lossy(line) {
        std::borrow::Cow::Borrowed(text) => text.to_string(),
        std::borrow::Cow::Owned(text) => {
            component_warn!(ComponentId::Host, "⚠️ Input line is not valid UTF-8, decoded as {:?}", text);
            text
        }
    }
}
