//! CGI環境からのリクエスト構築

use std::env;
use std::io::{self, Read};

use indexmap::IndexMap;
use log::{debug, warn};

use super::redaction::describe_server;
use crate::common::{content_type, get_max_body_size, parse_query_string, percent_decode, Method, Value};
use crate::error::Error;
use crate::pool::ServerPool;
use crate::request::{Request, RequestParts};

/// 環境変数からサーバー変数テーブルを作成する
pub fn server_from_env() -> ServerPool {
    env::vars().collect()
}

/// リクエストボディを読み込む
///
/// `CONTENT_LENGTH` が正の値の場合のみ、その長さを読み込む。
/// 上限（`CGI_HTTP_MAX_BODY_SIZE`）を超える場合は `PayloadTooLarge`。
pub fn read_request_body<R: Read>(server: &ServerPool, input: &mut R) -> Result<Option<Vec<u8>>, Error> {
    let content_length = match server
        .get_str("CONTENT_LENGTH")
        .and_then(|s| s.trim().parse::<usize>().ok())
    {
        Some(len) if len > 0 => len,
        _ => return Ok(None),
    };

    let max_body_size = get_max_body_size();
    if content_length > max_body_size {
        return Err(Error::PayloadTooLarge(format!(
            "Request body size {} bytes exceeds maximum allowed size {} bytes",
            content_length, max_body_size
        )));
    }

    let mut buffer = vec![0u8; content_length];
    input
        .read_exact(&mut buffer)
        .map_err(|e| Error::InvalidRequestBody(format!("Failed to read request body: {}", e)))?;
    Ok(Some(buffer))
}

/// `Cookie` ヘッダーを解析する（値はURLデコードする）
pub fn parse_cookies(header: &str) -> IndexMap<String, Value> {
    let mut cookies = IndexMap::new();
    for cookie_pair in header.split(';') {
        if let Some((name, value)) = cookie_pair.trim().split_once('=') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies.insert(name.to_string(), Value::String(percent_decode(value.trim())));
        }
    }
    cookies
}

/// JSONボディをボディパラメータへ変換する
fn parse_json_body(content: &[u8]) -> Result<IndexMap<String, Value>, Error> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(IndexMap::new());
    }
    let json: serde_json::Value = serde_json::from_slice(content)
        .map_err(|e| Error::InvalidRequestBody(format!("Invalid JSON body: {}", e)))?;

    match Value::from(json) {
        Value::Map(map) => Ok(map),
        Value::List(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| (idx.to_string(), item))
            .collect()),
        Value::Null => Ok(IndexMap::new()),
        other => Err(Error::InvalidRequestBody(format!(
            "JSON body must be an object or an array, {} given",
            other.type_name()
        ))),
    }
}

impl Request {
    /// サーバー変数とボディからリクエストを構築する
    ///
    /// クエリは `QUERY_STRING`、Cookieは `HTTP_COOKIE` から取り出す。
    /// POSTのJSONボディと、POST/PUT/DELETE/PATCHのフォームボディはボディパラメータになる。
    pub fn from_cgi<I, K, V>(vars: I, content: Option<Vec<u8>>) -> Result<Request, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let server: ServerPool = vars.into_iter().collect();
        debug!(
            "CGI request: {}",
            describe_server(&server, &["REQUEST_METHOD", "REQUEST_URI", "SCRIPT_NAME", "QUERY_STRING", "REMOTE_ADDR"])
        );

        let query = parse_query_string(server.get_str("QUERY_STRING").unwrap_or(""));
        let cookies = server.get_str("HTTP_COOKIE").map(parse_cookies).unwrap_or_default();

        let mut request = Request::from_parts(RequestParts {
            query,
            cookies,
            server,
            content,
            ..Default::default()
        });

        let media_type = request.content_type();
        let body = match media_type.as_deref() {
            Some(content_type::JSON) if request.is_method(&[Method::POST]) => {
                Some(parse_json_body(request.content())?)
            }
            Some(content_type::FORM)
                if request.is_method(&[Method::POST, Method::PUT, Method::DELETE, Method::PATCH]) =>
            {
                Some(parse_query_string(&String::from_utf8_lossy(request.content())))
            }
            _ => None,
        };
        if let Some(body) = body {
            request.body.replace(body).map_err(|e| {
                warn!("Rejected request body: {}", e);
                e
            })?;
        }

        Ok(request)
    }

    /// 環境変数と標準入力からリクエストを構築する
    pub fn from_env() -> Result<Request, Error> {
        let server = server_from_env();
        let content = read_request_body(&server, &mut io::stdin().lock())?;
        Request::from_cgi(server, content)
    }
}
