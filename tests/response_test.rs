// レスポンスのCGI出力の統合テスト
use serde_json::json;

use cgi_http::{Body, Response, StatusCode};

fn emit(response: Response) -> String {
    let mut out = Vec::new();
    response.emit_to(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_headers_override() {
    let response = Response::default()
        .with_header("foo", "will be override")
        .with_header("foo", "bar")
        .with_header("foo2", "baz");

    assert_eq!(emit(response), "Status: 200 OK\r\nfoo: bar\r\nfoo2: baz\r\n\r\n");
}

#[test]
fn test_send_headers() {
    let response = Response::default().with_header("Location", "foo");
    assert_eq!(emit(response), "Status: 200 OK\r\nLocation: foo\r\n\r\n");
}

#[test]
fn test_send_content() {
    let response = Response::default().with_body("foo");
    assert_eq!(emit(response), "Status: 200 OK\r\n\r\nfoo");
}

#[test]
fn test_send_json() {
    let mut response = Response::default();
    response.set_json(&["foo"]).unwrap();

    assert_eq!(
        emit(response),
        "Status: 200 OK\r\nContent-Type: application/json\r\n\r\n[\"foo\"]"
    );
}

#[test]
fn test_redirect_output() {
    let response = Response::redirect("https://example.com/login", None);
    assert_eq!(
        emit(response),
        "Status: 302 Found\r\nLocation: https://example.com/login\r\n\r\n"
    );
}

#[test]
fn test_set_code_and_content() {
    let mut response = Response::default();
    response
        .set_code(StatusCode::NOT_FOUND)
        .set_content_type("text/plain")
        .set_content("missing");

    let (status, headers, body) = response.into_parts();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers.get("Content-Type").map(String::as_str), Some("text/plain"));
    assert_eq!(body, Body::Bytes(b"missing".to_vec()));
}

#[test]
fn test_json_replaces_previous_body() {
    let mut response = Response::default().with_body("old");
    response.set_json(&json!({"id": 1, "tags": ["a"]})).unwrap();

    assert_eq!(
        response.body().to_bytes().unwrap(),
        br#"{"id":1,"tags":["a"]}"#.to_vec()
    );
}

#[test]
fn test_attachment_output() {
    let mut response = Response::default().with_body("id,name\n1,bob\n");
    response.attachment("users.csv", "text/csv").unwrap();

    assert_eq!(
        emit(response),
        "Status: 200 OK\r\n\
         Content-Disposition: attachment; filename=\"users.csv\"\r\n\
         Content-Length: 14\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         id,name\n1,bob\n"
    );
}

#[test]
fn test_attachment_strips_newlines_from_filename() {
    let mut response = Response::default().with_body("x");
    response.attachment("evil\r\nSet-Cookie: a=b.txt", "text/plain").unwrap();

    let output = emit(response);
    assert!(output.starts_with("Status: 200 OK\r\n"));
    assert!(output.contains("filename=\"evilSet-Cookie: a=b.txt\"\r\n"));
    assert!(!output.contains("\r\nSet-Cookie"));
}
