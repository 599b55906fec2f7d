//! Line buffer tests

use rust_live_probe::config::LINE_SIZE;
use rust_live_probe::protocol::LineBuffer;

#[test]
fn test_line_buffer_push() {
    let mut buf = LineBuffer::new();

    for b in b"13," {
        assert!(buf.push(*b));
    }

    assert_eq!(buf.as_str(), "13,");
    assert_eq!(buf.len(), 3);
}

#[test]
fn test_line_buffer_clear() {
    let mut buf = LineBuffer::new();
    buf.set("22,temp,");
    buf.clear();

    assert!(buf.is_empty());
    assert_eq!(buf.as_str(), "");
}

#[test]
fn test_line_buffer_overflow() {
    let mut buf = LineBuffer::new();

    for _ in 0..LINE_SIZE {
        assert!(buf.push(b'x'));
    }
    assert!(buf.is_full());
    assert!(!buf.push(b'y'));
    assert_eq!(buf.len(), LINE_SIZE);
}

#[test]
fn test_line_buffer_set_truncates() {
    let long = "9".repeat(LINE_SIZE + 10);
    let mut buf = LineBuffer::new();
    buf.set(&long);

    assert_eq!(buf.len(), LINE_SIZE);
    assert_eq!(buf.as_bytes(), &long.as_bytes()[..LINE_SIZE]);
}

#[test]
fn test_line_buffer_cut_inside_char() {
    // 127 ASCII bytes then a two-byte char: only its first byte fits
    let mut line = "a".repeat(LINE_SIZE - 1);
    line.push('é');

    let mut buf = LineBuffer::new();
    buf.set(&line);

    assert_eq!(buf.as_str(), &line[..LINE_SIZE - 1]);
}

#[test]
fn test_line_buffer_blank() {
    let mut buf = LineBuffer::new();
    assert!(buf.is_blank());

    buf.set(" \r\n");
    assert!(buf.is_blank());

    buf.set("1,");
    assert!(!buf.is_blank());
}
