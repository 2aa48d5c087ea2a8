//! Server-Sent Events framing
//!
//! Records are separated by a blank line (`\n\n` or `\r\n\r\n`). Bytes are
//! buffered until a full record is available, so a read may split a record
//! anywhere, including inside a multi-byte UTF-8 sequence.

mod event;

pub use event::SseEvent;

/// Buffered SSE record splitter
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every record completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_record_boundary(&self.buffer) {
            let record: Vec<u8> = self.buffer.drain(..end + delimiter_len).take(end).collect();
            if let Some(event) = parse_record(&String::from_utf8_lossy(&record)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing record that was not followed by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let record = std::mem::take(&mut self.buffer);
        parse_record(&String::from_utf8_lossy(&record))
    }
}

/// Position of the first blank-line delimiter and its length
fn find_record_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < buffer.len() {
        if buffer[i] == b'\n' {
            match buffer.get(i + 1) {
                Some(b'\n') => return Some((i, 2)),
                Some(b'\r') if buffer.get(i + 2) == Some(&b'\n') => return Some((i, 3)),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Parse one record; records without `data:` lines are dropped
fn parse_record(text: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut id = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event_type = Some(value.trim().to_string()),
            "data" => data_lines.push(value),
            "id" => id = Some(value.trim().to_string()),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data_lines.join("\n"),
        id,
    })
}

#[cfg(test)]
mod tests;
