//! CGIモジュールのテスト

use std::io::Cursor;

use serde_json::json;
use temp_env::with_vars;

use super::core::handle;
use super::request::{parse_cookies, read_request_body};
use super::response::{error_response, write_response_to};
use crate::common::{get_max_body_size, Method, StatusCode, Value};
use crate::error::Error;
use crate::pool::ServerPool;
use crate::request::Request;
use crate::response::Response;

fn emit(response: Response) -> String {
    let mut out = Vec::new();
    write_response_to(response, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_get_max_body_size_default() {
    // 環境変数が設定されていない場合はデフォルトの5MBを返す
    with_vars([("CGI_HTTP_MAX_BODY_SIZE", None::<&str>)], || {
        assert_eq!(get_max_body_size(), 5 * 1024 * 1024);
    });
}

#[test]
fn test_get_max_body_size_custom() {
    with_vars([("CGI_HTTP_MAX_BODY_SIZE", Some("1048576"))], || {
        assert_eq!(get_max_body_size(), 1048576);
    });
}

#[test]
fn test_get_max_body_size_invalid_env() {
    // 無効な環境変数値の場合はデフォルトにフォールバック
    with_vars([("CGI_HTTP_MAX_BODY_SIZE", Some("invalid"))], || {
        assert_eq!(get_max_body_size(), 5 * 1024 * 1024);
    });
}

#[test]
fn test_read_request_body() {
    with_vars([("CGI_HTTP_MAX_BODY_SIZE", None::<&str>)], || {
        let server: ServerPool = [("CONTENT_LENGTH", "5")].into_iter().collect();
        let mut input = Cursor::new(b"hello world".to_vec());

        let body = read_request_body(&server, &mut input).unwrap();
        assert_eq!(body, Some(b"hello".to_vec()));
    });
}

#[test]
fn test_read_request_body_without_length() {
    let server = ServerPool::default();
    let mut input = Cursor::new(b"ignored".to_vec());

    assert_eq!(read_request_body(&server, &mut input).unwrap(), None);
}

#[test]
fn test_read_request_body_too_large() {
    with_vars([("CGI_HTTP_MAX_BODY_SIZE", Some("4"))], || {
        let server: ServerPool = [("CONTENT_LENGTH", "5")].into_iter().collect();
        let mut input = Cursor::new(b"hello".to_vec());

        let err = read_request_body(&server, &mut input).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge(_)));
        assert_eq!(err.status_code(), 413);
    });
}

#[test]
fn test_read_request_body_short_input() {
    with_vars([("CGI_HTTP_MAX_BODY_SIZE", None::<&str>)], || {
        let server: ServerPool = [("CONTENT_LENGTH", "10")].into_iter().collect();
        let mut input = Cursor::new(b"short".to_vec());

        let err = read_request_body(&server, &mut input).unwrap_err();
        assert!(matches!(err, Error::InvalidRequestBody(_)));
    });
}

#[test]
fn test_parse_cookies() {
    let cookies = parse_cookies("sid=abc123; theme=dark%20mode; broken; =x");

    assert_eq!(cookies.get("sid"), Some(&Value::from("abc123")));
    assert_eq!(cookies.get("theme"), Some(&Value::from("dark mode")));
    assert_eq!(cookies.len(), 2);
}

#[test]
fn test_from_cgi_query_and_cookies() {
    let request = Request::from_cgi(
        [
            ("REQUEST_METHOD", "GET"),
            ("REQUEST_URI", "/index.php/items?tag[]=a&tag[]=b"),
            ("QUERY_STRING", "tag[]=a&tag[]=b"),
            ("SCRIPT_NAME", "/index.php"),
            ("SCRIPT_FILENAME", "/var/www/index.php"),
            ("HTTP_COOKIE", "sid=abc"),
            ("HTTP_HOST", "example.com"),
        ],
        None,
    )
    .unwrap();

    assert_eq!(
        request.query.get("tag"),
        Ok(Some(&Value::List(vec![Value::from("a"), Value::from("b")])))
    );
    assert_eq!(request.cookies.get("sid"), Ok(Some(&Value::from("abc"))));
    assert_eq!(request.base_url(), "/index.php");
    assert_eq!(request.path_info(), "/items");
    assert_eq!(request.host().unwrap(), "example.com");
}

#[test]
fn test_from_cgi_json_post_body() {
    let request = Request::from_cgi(
        [
            ("REQUEST_METHOD", "POST"),
            ("CONTENT_TYPE", "application/json; charset=utf-8"),
        ],
        Some(br#"{"name":"bob","tags":["x","y"]}"#.to_vec()),
    )
    .unwrap();

    assert_eq!(request.body.get("name"), Ok(Some(&Value::from("bob"))));
    assert_eq!(request.body.get("tags"), Ok(Some(&Value::from(vec!["x", "y"]))));
}

#[test]
fn test_from_cgi_invalid_json_body() {
    let err = Request::from_cgi(
        [("REQUEST_METHOD", "POST"), ("CONTENT_TYPE", "application/json")],
        Some(b"{not json".to_vec()),
    )
    .unwrap_err();

    assert!(matches!(err, Error::InvalidRequestBody(_)));
}

#[test]
fn test_from_cgi_json_ignored_for_put() {
    let request = Request::from_cgi(
        [("REQUEST_METHOD", "PUT"), ("CONTENT_TYPE", "application/json")],
        Some(br#"{"a":1}"#.to_vec()),
    )
    .unwrap();

    assert!(request.body.is_empty());
    assert_eq!(request.content(), br#"{"a":1}"#);
}

#[test]
fn test_from_cgi_form_body_for_patch() {
    let request = Request::from_cgi(
        [
            ("REQUEST_METHOD", "PATCH"),
            ("CONTENT_TYPE", "application/x-www-form-urlencoded"),
        ],
        Some(b"name=John+Doe&age=30".to_vec()),
    )
    .unwrap();

    assert_eq!(request.body.get("name"), Ok(Some(&Value::from("John Doe"))));
    assert_eq!(request.body.get("age"), Ok(Some(&Value::from("30"))));
    assert!(request.is_method(&[Method::PATCH]));
}

#[test]
fn test_write_response_format() {
    let response = Response::new(StatusCode::CREATED)
        .with_header("Content-Type", "text/plain")
        .with_header("X-Request-Id", "abc")
        .with_body("created");

    assert_eq!(
        emit(response),
        "Status: 201 Created\r\nContent-Type: text/plain\r\nX-Request-Id: abc\r\n\r\ncreated"
    );
}

#[test]
fn test_write_response_json_forces_content_type() {
    let mut response = Response::default().with_header("Content-Type", "text/plain");
    response.set_json(&json!({"a": 1})).unwrap();

    assert_eq!(
        emit(response),
        "Status: 200 OK\r\nContent-Type: application/json\r\n\r\n{\"a\":1}"
    );
}

#[test]
fn test_write_response_json_replaces_content_type_in_any_case() {
    let mut response = Response::default()
        .with_header("content-type", "text/plain")
        .with_header("X-Request-Id", "abc")
        .with_header("CONTENT-TYPE", "text/html");
    response.set_json(&json!({"a": 1})).unwrap();

    assert_eq!(
        emit(response),
        "Status: 200 OK\r\nX-Request-Id: abc\r\nContent-Type: application/json\r\n\r\n{\"a\":1}"
    );
}

#[test]
fn test_write_response_rejects_header_injection() {
    let response = Response::default()
        .with_header("X-Evil", "value\r\nSet-Cookie: session=stolen")
        .with_body("secret");

    let output = emit(response);
    assert!(output.starts_with("Status: 400 Bad Request\r\n"));
    assert!(!output.contains("Set-Cookie"));
    assert!(!output.contains("secret"));
    assert!(output.ends_with("\r\n\r\nBad Request: Invalid header"));
}

#[test]
fn test_write_response_rejects_invalid_header_name() {
    let response = Response::default().with_header("Bad Header", "v");
    assert!(emit(response).starts_with("Status: 400 Bad Request\r\n"));
}

#[test]
fn test_write_response_skips_status_header() {
    let response = Response::default().with_header("Status", "500 Oops");
    assert_eq!(emit(response), "Status: 200 OK\r\n\r\n");
}

#[test]
fn test_attachment_content_length_matches_body() {
    let mut response = Response::default().with_body("col1,col2\n");
    response.attachment("data.csv", "text/csv").unwrap();

    let output = emit(response);
    assert!(output.contains("Content-Disposition: attachment; filename=\"data.csv\"\r\n"));
    assert!(output.contains("Content-Length: 10\r\n"));
    assert!(output.ends_with("\r\n\r\ncol1,col2\n"));
}

#[test]
fn test_error_response() {
    let response = error_response(&Error::PayloadTooLarge("too big".to_string()));
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let response = error_response(&Error::InternalServerError("db password leaked".to_string()));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!emit(response).contains("password"));
}

#[test]
fn test_handle_maps_errors() {
    let request = Request::create(Method::GET, "/");

    let response = handle(&request, |_| Err(Error::InvalidHost("bad_".to_string())));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = handle(&request, |req| Ok(Response::text(req.path_info(), None)));
    assert_eq!(response.status(), StatusCode::OK);
}
