use super::*;

#[test]
fn test_typed_record() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"event: message_start\ndata: {\"a\":1}\n\n");

    assert_eq!(events, vec![SseEvent::with_type("message_start", "{\"a\":1}")]);
    assert_eq!(decoder.finish(), None);
}

#[test]
fn test_record_split_across_reads() {
    let mut decoder = SseDecoder::new();

    assert!(decoder.feed(b"event: content_block_delta\nda").is_empty());
    assert!(decoder.feed(b"ta: {\"x\":").is_empty());
    let events = decoder.feed(b"true}\n\ndata: next");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type.as_deref(), Some("content_block_delta"));
    assert_eq!(events[0].data, "{\"x\":true}");
    assert_eq!(decoder.finish(), Some(SseEvent::new("next")));
}

#[test]
fn test_utf8_sequence_split_across_reads() {
    let text = "data: héllo 🍌\n\n".as_bytes();
    // split inside the four-byte banana
    let split = text.len() - 4;

    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(&text[..split]).is_empty());
    let events = decoder.feed(&text[split..]);
    assert_eq!(events[0].data, "héllo 🍌");
}

#[test]
fn test_crlf_delimiters() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"event: ping\r\ndata: {}\r\n\r\ndata: [DONE]\r\n\r\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type.as_deref(), Some("ping"));
    assert_eq!(events[0].data, "{}");
    assert!(events[1].is_done());
}

#[test]
fn test_multi_line_data_and_comments() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b": keep-alive\ndata: line1\ndata: line2\n\n");

    assert_eq!(events, vec![SseEvent::new("line1\nline2")]);
}

#[test]
fn test_record_without_data_is_dropped() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"event: ping\n\n").is_empty());
}
