//! CGIレスポンスの出力機能

use std::io::{self, Write};

use indexmap::IndexMap;
use log::error;

use super::redaction::redact_value_for_log;
use super::validation::{is_valid_header_name, is_valid_header_value};
use crate::common::{content_type, StatusCode};
use crate::error::Error;
use crate::response::Response;

/// レスポンスを任意のライターへ書き出す
///
/// 不正なヘッダーが含まれる場合は、安全な400レスポンスに置き換えて出力する。
pub fn write_response_to<W: Write>(response: Response, out: &mut W) -> Result<(), Error> {
    let (mut status, mut headers, body) = response.into_parts();

    // 構造化ボディはヘッダー出力前にContent-Typeを確定させる
    if body.is_json() {
        headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
        headers.insert("Content-Type".to_string(), content_type::JSON.to_string());
    }
    let mut body = body.to_bytes()?;

    let invalid = headers
        .iter()
        .find(|(name, value)| !is_valid_header_name(name) || !is_valid_header_value(value));
    if let Some((name, value)) = invalid {
        error!(
            "Invalid header detected - name: '{}', value: '{}'",
            name.escape_debug(),
            redact_value_for_log(name, value).escape_debug()
        );
        status = StatusCode::BAD_REQUEST;
        headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "text/plain; charset=utf-8".to_string());
        body = b"Bad Request: Invalid header".to_vec();
    }

    // ステータス行（CRLF）
    let reason = status.canonical_reason().unwrap_or("Unknown");
    out.write_all(format!("Status: {} {}\r\n", status.as_u16(), reason).as_bytes())
        .map_err(|e| Error::InternalServerError(format!("Failed to write status line: {}", e)))?;

    for (name, value) in &headers {
        // ステータスは上の行で出力済み
        if name.eq_ignore_ascii_case("Status") {
            continue;
        }
        out.write_all(format!("{}: {}\r\n", name, value).as_bytes())
            .map_err(|e| Error::InternalServerError(format!("Failed to write header: {}", e)))?;
    }

    // ヘッダーとボディの区切り（CRLF）
    out.write_all(b"\r\n").map_err(|e| {
        Error::InternalServerError(format!("Failed to write header/body separator: {}", e))
    })?;

    if !body.is_empty() {
        out.write_all(&body).map_err(|e| {
            Error::InternalServerError(format!("Failed to write response body: {}", e))
        })?;
    }

    Ok(())
}

/// レスポンスを標準出力に書き出す
pub fn write_response(response: Response) -> Result<(), Error> {
    let mut out = io::stdout().lock();
    let res = write_response_to(response, &mut out);
    out.flush().map_err(|e| Error::InternalServerError(format!("Failed to flush stdout: {}", e)))?;
    res
}

/// エラーを平文のレスポンスに変換する
pub fn error_response(err: &Error) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if status.is_server_error() {
        "Internal Server Error".to_string()
    } else {
        err.to_string()
    };
    Response::text(message, Some(status))
}
