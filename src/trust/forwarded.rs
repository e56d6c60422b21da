//! プロキシ転送ヘッダー（`Forwarded` / `X-Forwarded-*`）の解析

use serde::Serialize;

use crate::common::headers::names;
use crate::common::HeaderBag;

/// 転送ヘッダーから得られる情報
///
/// ヘッダーが存在しない、または空のフィールドは `None`（リストは空）になる。
/// 標準の `Forwarded` ヘッダーが同じ情報を持つ場合はそちらを優先する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForwardedInfo {
    /// クライアントIP（オリジンに近い順）
    pub forwarded_for: Vec<String>,
    pub proto: Option<String>,
    /// ホスト（`host:port` 形式のままの場合がある）
    pub host: Option<String>,
    pub port: Option<u16>,
    pub prefix: Option<String>,
}

impl ForwardedInfo {
    /// ヘッダー集合から構築する
    pub fn from_headers(headers: &HeaderBag) -> Self {
        let mut info = match headers.get_non_empty(names::FORWARDED) {
            Some(value) => parse_forwarded(value),
            None => ForwardedInfo::default(),
        };

        if info.forwarded_for.is_empty() {
            if let Some(value) = headers.get_non_empty(names::X_FORWARDED_FOR) {
                info.forwarded_for = value
                    .split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(normalize_node)
                    .collect();
            }
        }
        if info.proto.is_none() {
            info.proto = first_element(headers, names::X_FORWARDED_PROTO).map(|p| p.to_ascii_lowercase());
        }
        if info.host.is_none() {
            info.host = first_element(headers, names::X_FORWARDED_HOST);
        }
        if info.port.is_none() {
            info.port = first_element(headers, names::X_FORWARDED_PORT).and_then(|p| p.parse::<u16>().ok());
        }
        if info.prefix.is_none() {
            info.prefix = first_element(headers, names::X_FORWARDED_PREFIX);
        }

        info
    }

    /// いずれかの情報を持っているかどうか
    pub fn is_empty(&self) -> bool {
        self.forwarded_for.is_empty()
            && self.proto.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.prefix.is_none()
    }
}

/// カンマ区切りヘッダーの先頭要素（空は無視）
fn first_element(headers: &HeaderBag, name: &str) -> Option<String> {
    headers
        .get_non_empty(name)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// RFC 7239 の `Forwarded` ヘッダーを解析する
///
/// `for` は全要素から順に集め、`proto` / `host` は最初に現れたものを採用する。
fn parse_forwarded(value: &str) -> ForwardedInfo {
    let mut info = ForwardedInfo::default();

    for element in split_unquoted(value, ',') {
        for pair in split_unquoted(element, ';') {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("").trim().to_ascii_lowercase();
            let raw = match parts.next() {
                Some(v) => unquote(v.trim()),
                None => continue,
            };
            if raw.is_empty() {
                continue;
            }
            match key.as_str() {
                "for" => info.forwarded_for.push(normalize_node(&raw)),
                "proto" if info.proto.is_none() => info.proto = Some(raw.to_ascii_lowercase()),
                "host" if info.host.is_none() => info.host = Some(raw),
                _ => {}
            }
        }
    }

    info
}

/// 引用符の外側にある区切り文字で分割する
fn split_unquoted(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                parts.push(value[start..idx].trim());
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    } else {
        value.to_string()
    }
}

/// ノード表記からポートと角括弧を取り除く
///
/// `"[2001:db8::1]:4711"` -> `2001:db8::1`、`192.0.2.1:8080` -> `192.0.2.1`。
/// 括弧のないIPv6アドレスはそのまま返す。
fn normalize_node(node: &str) -> String {
    let node = node.trim();
    if let Some(rest) = node.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[..end].to_string();
        }
        return rest.to_string();
    }
    match node.matches(':').count() {
        1 => node.split(':').next().unwrap_or(node).to_string(),
        _ => node.to_string(),
    }
}
