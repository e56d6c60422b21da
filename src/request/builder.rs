//! URLからリクエストを合成するビルダー

use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;

use super::target::path_offset;
use super::{Request, RequestParts};
use crate::common::utils::{build_query_string, parse_query_string};
use crate::common::{content_type, Method, Value};
use crate::pool::ServerPool;
use crate::trust::TrustPolicy;

const DEFAULT_SERVER: [(&str, &str); 10] = [
    ("SERVER_NAME", "localhost"),
    ("SERVER_PORT", "80"),
    ("HTTP_HOST", "localhost"),
    ("HTTP_USER_AGENT", "cgi-http"),
    ("HTTP_ACCEPT", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("HTTP_ACCEPT_LANGUAGE", "en-US;q=0.7,en;q=0.3"),
    ("REMOTE_ADDR", "127.0.0.1"),
    ("SCRIPT_NAME", ""),
    ("SCRIPT_FILENAME", ""),
    ("SERVER_PROTOCOL", "HTTP/1.1"),
];

/// `Request::create` の詳細設定用ビルダー
///
/// パラメータは POST/PUT/DELETE/PATCH ならボディへ、それ以外はクエリへ入る。
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    parameters: IndexMap<String, Value>,
    cookies: IndexMap<String, Value>,
    files: IndexMap<String, Value>,
    server: IndexMap<String, String>,
    content: Option<Vec<u8>>,
    trust: Option<Arc<TrustPolicy>>,
}

/// URLの構成要素
#[derive(Debug, Default)]
struct UrlParts {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    query: Option<String>,
}

fn split_url(raw: &str) -> UrlParts {
    let target = raw.split('#').next().unwrap_or("");
    let mut parts = UrlParts::default();

    // パスとクエリは与えられたバイト列のまま使う
    let target = match Url::parse(target) {
        Ok(url) if url.has_host() => {
            parts.scheme = Some(url.scheme().to_string());
            parts.host = url.host_str().map(str::to_string);
            parts.port = url.port();
            path_offset(target).map_or("", |idx| &target[idx..])
        }
        _ => target,
    };

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };
    parts.path = Some(path.to_string()).filter(|p| !p.is_empty());
    parts.query = query;
    parts
}

impl RequestBuilder {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            parameters: IndexMap::new(),
            cookies: IndexMap::new(),
            files: IndexMap::new(),
            server: IndexMap::new(),
            content: None,
            trust: None,
        }
    }

    /// パラメータを追加する
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: IndexMap<String, Value>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn with_cookie(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    pub fn with_file(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.files.insert(key.into(), value.into());
        self
    }

    /// サーバー変数の既定値を上書きする
    pub fn with_server(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server.insert(key.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_trust_policy(mut self, policy: Arc<TrustPolicy>) -> Self {
        self.trust = Some(policy);
        self
    }

    /// リクエストを構築する
    pub fn build(self) -> Request {
        let mut server: IndexMap<String, String> = DEFAULT_SERVER
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        server.extend(self.server);

        server.insert("PATH_INFO".to_string(), String::new());
        server.insert("REQUEST_METHOD".to_string(), self.method.as_str().to_string());

        let parts = split_url(&self.url);

        if let Some(host) = &parts.host {
            server.insert("SERVER_NAME".to_string(), host.clone());
            server.insert("HTTP_HOST".to_string(), host.clone());
        }

        if let Some(scheme) = &parts.scheme {
            if scheme == "https" {
                server.insert("HTTPS".to_string(), "on".to_string());
                server.insert("SERVER_PORT".to_string(), "443".to_string());
            } else {
                server.shift_remove("HTTPS");
                server.insert("SERVER_PORT".to_string(), "80".to_string());
            }
        }

        if let Some(port) = parts.port {
            server.insert("SERVER_PORT".to_string(), port.to_string());
            let host = server.entry("HTTP_HOST".to_string()).or_default();
            host.push_str(&format!(":{}", port));
        }

        let (query_params, body_params) = match self.method {
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH => {
                if self.method != Method::PATCH && !server.contains_key("CONTENT_TYPE") {
                    server.insert("CONTENT_TYPE".to_string(), content_type::FORM.to_string());
                }
                (IndexMap::new(), self.parameters)
            }
            _ => (self.parameters, IndexMap::new()),
        };

        let (query, query_string) = match &parts.query {
            Some(raw) => {
                let mut merged = parse_query_string(raw);
                if query_params.is_empty() {
                    (merged, raw.clone())
                } else {
                    merged.extend(query_params);
                    let built = build_query_string(&merged);
                    (merged, built)
                }
            }
            None if !query_params.is_empty() => {
                let built = build_query_string(&query_params);
                (query_params, built)
            }
            None => (IndexMap::new(), String::new()),
        };

        let path = parts.path.unwrap_or_else(|| "/".to_string());
        let request_uri = if query_string.is_empty() {
            path
        } else {
            format!("{}?{}", path, query_string)
        };
        server.insert("REQUEST_URI".to_string(), request_uri);
        server.insert("QUERY_STRING".to_string(), query_string);

        let request = Request::from_parts(RequestParts {
            query,
            body: body_params,
            attributes: IndexMap::new(),
            cookies: self.cookies,
            files: self.files,
            server: server.into_iter().collect::<ServerPool>(),
            content: self.content,
        });

        match self.trust {
            Some(policy) => request.with_trust_policy(policy),
            None => request,
        }
    }
}
