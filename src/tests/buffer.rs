use crate::responses::{http_body, parse_status_code, CaptureBuffer, JoinStatus};

#[test]
fn test_push_until_full() {
    let mut buffer: CaptureBuffer<4> = CaptureBuffer::new();
    assert!(buffer.is_empty());
    assert_eq!(4, buffer.capacity());

    for byte in b"abcd" {
        assert!(buffer.push(*byte));
    }

    assert!(!buffer.push(b'e'));
    assert_eq!(b"abcd", buffer.as_slice());
    assert_eq!(4, buffer.len());
}

#[test]
fn test_truncate() {
    let mut buffer: CaptureBuffer<8> = CaptureBuffer::default();
    for byte in b"hello" {
        buffer.push(*byte);
    }

    buffer.truncate(10);
    assert_eq!(b"hello", buffer.as_slice());

    buffer.truncate(2);
    assert_eq!(b"he", buffer.as_slice());
}

#[test]
fn test_consume() {
    let mut buffer: CaptureBuffer<16> = CaptureBuffer::new();
    for byte in b"first second" {
        buffer.push(*byte);
    }

    buffer.consume(6);
    assert_eq!(b"second", buffer.as_slice());

    buffer.consume(100);
    assert!(buffer.is_empty());
}

#[test]
fn test_clear() {
    let mut buffer: CaptureBuffer<16> = CaptureBuffer::new();
    buffer.push(b'x');

    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(b"", buffer.as_slice());
}

#[test]
fn test_join_status_from_ascii() {
    assert_eq!(Some(JoinStatus::Idle), JoinStatus::from_ascii(b'0'));
    assert_eq!(Some(JoinStatus::Connecting), JoinStatus::from_ascii(b'1'));
    assert_eq!(Some(JoinStatus::WrongPassword), JoinStatus::from_ascii(b'2'));
    assert_eq!(Some(JoinStatus::NoAccessPoint), JoinStatus::from_ascii(b'3'));
    assert_eq!(Some(JoinStatus::ConnectFailed), JoinStatus::from_ascii(b'4'));
    assert_eq!(Some(JoinStatus::GotIp), JoinStatus::from_ascii(b'5'));

    assert_eq!(None, JoinStatus::from_ascii(b'6'));
    assert_eq!(None, JoinStatus::from_ascii(b'9'));
    assert_eq!(None, JoinStatus::from_ascii(b'\r'));
}

#[test]
fn test_join_status_terminal() {
    assert!(!JoinStatus::Idle.is_terminal());
    assert!(!JoinStatus::Connecting.is_terminal());
    assert!(JoinStatus::WrongPassword.is_terminal());
    assert!(JoinStatus::NoAccessPoint.is_terminal());
    assert!(JoinStatus::ConnectFailed.is_terminal());
    assert!(JoinStatus::GotIp.is_terminal());
}

#[test]
fn test_join_status_code() {
    for digit in b'0'..=b'5' {
        let status = JoinStatus::from_ascii(digit).unwrap();
        assert_eq!(digit - b'0', status.code());
    }
}

#[test]
fn test_parse_status_code_full_status_line() {
    assert_eq!(Some(200), parse_status_code(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"));
    assert_eq!(Some(404), parse_status_code(b"HTTP/1.0 404 Not Found\r\n\r\n"));
}

#[test]
fn test_parse_status_code_bare() {
    assert_eq!(Some(200), parse_status_code(b"200 OK\r\n\r\nbody"));
    assert_eq!(Some(301), parse_status_code(b"301"));
}

#[test]
fn test_parse_status_code_invalid() {
    assert_eq!(None, parse_status_code(b""));
    assert_eq!(None, parse_status_code(b"garbage\r\n\r\nbody"));
    assert_eq!(None, parse_status_code(b"HTTP/1.1 0 Zero\r\n"));
}

#[test]
fn test_parse_status_code_first_line_only() {
    assert_eq!(None, parse_status_code(b"HTTP/1.1 OK\r\n\r\n404"));
}

#[test]
fn test_http_body() {
    assert_eq!(b"body", http_body(b"200 OK\r\n\r\nbody"));
    assert_eq!(b"", http_body(b"200 OK\r\n\r\n"));
    assert_eq!(b"", http_body(b"200 OK\r\nContent-Length: 4"));
}
