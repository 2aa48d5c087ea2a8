//! Incremental decoder for a top-level JSON array whose elements arrive over time
//!
//! Bytes are buffered; each complete element is yielded as soon as its last
//! byte has been read. Whitespace, the opening `[`, separating commas and the
//! closing `]` are skipped.

use crate::error::{ParleyError, ParleyResult};
use serde_json::Value;

#[derive(Debug, Default)]
pub struct JsonArrayDecoder {
    buffer: Vec<u8>,
    opened: bool,
    closed: bool,
}

impl JsonArrayDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every element completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> ParleyResult<Vec<Value>> {
        self.buffer.extend_from_slice(bytes);
        let mut values = Vec::new();

        loop {
            self.skip_separators()?;
            if self.closed || self.buffer.is_empty() {
                break;
            }

            let next = {
                let mut iter =
                    serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
                match iter.next() {
                    Some(Ok(value)) => Some((value, iter.byte_offset())),
                    Some(Err(e)) if e.is_eof() => None,
                    Some(Err(e)) => {
                        return Err(ParleyError::json(format!("malformed array element: {}", e)));
                    }
                    None => None,
                }
            };

            match next {
                Some((value, consumed)) => {
                    self.buffer.drain(..consumed);
                    values.push(value);
                }
                None => break,
            }
        }

        Ok(values)
    }

    /// True once the closing `]` was seen
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fail if the body ended in the middle of an element
    pub fn finish(&self) -> ParleyResult<()> {
        let trailing = self.buffer.iter().any(|b| !b.is_ascii_whitespace());
        if trailing {
            return Err(ParleyError::json("stream ended inside an array element"));
        }
        Ok(())
    }

    fn skip_separators(&mut self) -> ParleyResult<()> {
        let mut skip = 0;
        for &byte in &self.buffer {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => {}
                b'[' if !self.opened => self.opened = true,
                b']' if self.opened => {
                    self.closed = true;
                    skip += 1;
                    break;
                }
                _ if !self.opened => {
                    return Err(ParleyError::json(format!(
                        "expected a JSON array, found byte {:?}",
                        byte as char
                    )));
                }
                _ => break,
            }
            skip += 1;
        }
        self.buffer.drain(..skip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_elements_split_across_reads() {
        let mut decoder = JsonArrayDecoder::new();

        assert!(decoder.feed(b"[{\"a\":").unwrap().is_empty());
        let values = decoder.feed(b" 1}\n,\r\n{\"b\"").unwrap();
        assert_eq!(values, vec![json!({"a": 1})]);

        let values = decoder.feed(b": \"x\"}\n]").unwrap();
        assert_eq!(values, vec![json!({"b": "x"})]);
        assert!(decoder.is_closed());
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_many_elements_in_one_read() {
        let mut decoder = JsonArrayDecoder::new();
        let values = decoder.feed(b"[{\"n\":1},{\"n\":2},{\"n\":3}]").unwrap();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_rejects_non_array_body() {
        let mut decoder = JsonArrayDecoder::new();
        assert!(decoder.feed(b"{\"error\":{}}").is_err());
    }

    #[test]
    fn test_truncated_body_fails_on_finish() {
        let mut decoder = JsonArrayDecoder::new();
        decoder.feed(b"[{\"a\":").unwrap();
        assert!(decoder.finish().is_err());
    }
}
